//! Counterpart resolution: given a synchronous signature, find the declared
//! asynchronous counterparts it could be rewritten to call.
//!
//! Resolution is pure lookup over the symbol model plus the matching rules
//! in `matching`; results are memoized per (signature, origin, options) in a
//! concurrency-safe cache so parallel reference analysis never recomputes a
//! signature. An empty result is a valid, non-error outcome.

mod cache;
mod matching;

use std::sync::Arc;

use compact_str::CompactString;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::config::Config;
use crate::constants::{DEFAULT_ASYNC_SUFFIX, DEFAULT_CANCELLATION_TYPES};
use crate::model::{ReturnShape, SigId, Symbols, TypeId, Visibility};

use cache::CounterpartCache;

/// Options steering a counterpart search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterpartOptions {
    /// Admit candidates with the same name but a different overload
    /// signature, in addition to suffixed names.
    pub allow_same_name: bool,
    /// Admit one extra trailing cancellation-token parameter.
    pub accepts_cancellation: bool,
    /// Require parameter types to be exactly equal, disabling recursive
    /// delegate upgrades.
    pub equal_parameters: bool,
    /// Search base types (or all interfaces for interface declarers).
    pub search_inherited: bool,
}

impl Default for CounterpartOptions {
    fn default() -> Self {
        CounterpartOptions {
            allow_same_name: false,
            accepts_cancellation: true,
            equal_parameters: false,
            search_inherited: true,
        }
    }
}

impl CounterpartOptions {
    fn fingerprint(self) -> u8 {
        u8::from(self.allow_same_name)
            | u8::from(self.accepts_cancellation) << 1
            | u8::from(self.equal_parameters) << 2
            | u8::from(self.search_inherited) << 3
    }
}

/// A cached sync→async signature pairing.
#[derive(Debug, Clone)]
pub struct CounterpartCandidate {
    /// The candidate's signature handle. For synthetic candidates this is
    /// the original function's handle.
    pub sig: SigId,
    /// Candidate name, as the rewriter should spell the callee.
    pub name: CompactString,
    /// Candidate parameter count (used for cancellation forwarding).
    pub param_count: usize,
    /// Candidate return shape.
    pub returns: ReturnShape,
    /// True for a prospective counterpart of a function that is itself being
    /// converted in this run and has no declared asynchronous form yet.
    pub synthetic: bool,
}

/// The candidate container: most signatures resolve to zero or one.
pub type CandidateList = SmallVec<[CounterpartCandidate; 2]>;

/// Memoizing counterpart resolver.
pub struct CounterpartResolver {
    suffix: CompactString,
    cancellation_types: FxHashSet<CompactString>,
    cache: CounterpartCache,
}

impl CounterpartResolver {
    /// Builds a resolver from configuration (suffix and cancellation-token
    /// names; search options are per-call).
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let c = &config.asyncify;
        let suffix = c
            .async_suffix
            .as_deref()
            .map_or(CompactString::from(DEFAULT_ASYNC_SUFFIX), CompactString::from);
        let cancellation_types = match &c.cancellation_types {
            Some(list) => list.iter().map(|s| CompactString::from(s.as_str())).collect(),
            None => DEFAULT_CANCELLATION_TYPES
                .iter()
                .copied()
                .map(CompactString::from)
                .collect(),
        };
        CounterpartResolver {
            suffix,
            cancellation_types,
            cache: CounterpartCache::default(),
        }
    }

    /// Finds the asynchronous counterparts of `sig`, as visible from
    /// `invoked_from`. Cached per (signature, origin, options).
    pub fn find_counterparts(
        &self,
        symbols: &dyn Symbols,
        sig: SigId,
        invoked_from: TypeId,
        options: CounterpartOptions,
    ) -> Arc<CandidateList> {
        let key = (sig, invoked_from, options.fingerprint());
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }
        let computed = Arc::new(self.compute(symbols, sig, invoked_from, options));
        self.cache.insert(key, computed)
    }

    fn compute(
        &self,
        symbols: &dyn Symbols,
        sig: SigId,
        invoked_from: TypeId,
        options: CounterpartOptions,
    ) -> CandidateList {
        let origin = symbols.signature(sig);
        let mut out = CandidateList::new();

        for ty in self.searched_types(symbols, origin.declaring_type, options) {
            for &member in symbols.members(ty) {
                if member == sig {
                    continue;
                }
                let cand = symbols.signature(member);
                if !self.name_matches(origin, cand, options) {
                    continue;
                }
                if cand.visibility == Visibility::Private && cand.declaring_type != invoked_from {
                    continue;
                }
                if !matching::signatures_match(origin, cand, options, &self.cancellation_types) {
                    continue;
                }
                if Self::hidden_by_yielded(symbols, &out, member, cand) {
                    continue;
                }
                out.push(CounterpartCandidate {
                    sig: member,
                    name: cand.name.clone(),
                    param_count: cand.params.len(),
                    returns: cand.returns.clone(),
                    synthetic: false,
                });
            }
        }
        out
    }

    /// Declaring type first, then the inherited surface: all transitive
    /// interfaces when the declarer is an interface, the transitive base
    /// chain otherwise. Worklist with a visited set; hierarchies may be
    /// diamond-shaped.
    fn searched_types(
        &self,
        symbols: &dyn Symbols,
        declaring: TypeId,
        options: CounterpartOptions,
    ) -> Vec<TypeId> {
        let mut searched = vec![declaring];
        if !options.search_inherited {
            return searched;
        }
        let from_interfaces = symbols.is_interface(declaring);
        let mut visited: FxHashSet<TypeId> = searched.iter().copied().collect();
        let mut pending = vec![declaring];
        while let Some(ty) = pending.pop() {
            let supers = if from_interfaces {
                symbols.interfaces(ty)
            } else {
                symbols.bases(ty)
            };
            for &s in supers {
                if visited.insert(s) {
                    searched.push(s);
                    pending.push(s);
                }
            }
        }
        searched
    }

    fn name_matches(
        &self,
        origin: &crate::model::FunctionSignature,
        cand: &crate::model::FunctionSignature,
        options: CounterpartOptions,
    ) -> bool {
        if cand.name.len() == origin.name.len() + self.suffix.len()
            && cand.name.starts_with(origin.name.as_str())
            && cand.name.ends_with(self.suffix.as_str())
        {
            return true;
        }
        // Same-name overloads only qualify with a genuinely different
        // parameter list; the identical declaration was skipped earlier.
        options.allow_same_name && cand.name == origin.name && cand.params != origin.params
    }

    /// A candidate hidden or overridden by one yielded earlier is dropped.
    /// Derived-most types are searched first, so the earlier candidate wins.
    fn hidden_by_yielded(
        symbols: &dyn Symbols,
        yielded: &CandidateList,
        member: SigId,
        cand: &crate::model::FunctionSignature,
    ) -> bool {
        yielded.iter().any(|existing| {
            let hidden = existing.name == cand.name
                && symbols.signature(existing.sig).params == cand.params;
            let overridden = symbols.related(member).contains(&existing.sig);
            hidden || overridden
        })
    }
}
