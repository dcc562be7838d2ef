//! Resolved, lookup-friendly view of a [`Config`], built once per run.

use compact_str::CompactString;
use regex::Regex;
use rustc_hash::FxHashSet;

use super::Config;
use crate::constants::{
    DEFAULT_ASYNC_SUFFIX, DEFAULT_AWAITER_MEMBERS, DEFAULT_BLOCKING_MEMBERS,
    DEFAULT_CANCELLATION_TYPES, DEFAULT_CONFIGURE_MEMBERS,
};
use crate::counterpart::CounterpartOptions;
use crate::diagnostics::AnalysisError;

/// What a recognized awaitable-adapter member does to a deferred result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdapterKind {
    /// Reconfigures the deferred result; awaiting remains possible.
    Configure,
    /// Adapts the deferred result for awaiting.
    Awaiter,
    /// Blocks on the deferred result; rewriting replaces it with an await.
    Blocking,
}

pub(crate) struct CompiledConfig {
    pub(crate) suffix: CompactString,
    pub(crate) cancellation_types: FxHashSet<CompactString>,
    pub(crate) propagate_cancellation: bool,
    pub(crate) options: CounterpartOptions,
    configure_members: FxHashSet<CompactString>,
    awaiter_members: FxHashSet<CompactString>,
    blocking_members: FxHashSet<CompactString>,
    seed_patterns: Vec<Regex>,
    ignore_patterns: Vec<Regex>,
    keep_unknown_patterns: Vec<Regex>,
    preserve_return_type_patterns: Vec<Regex>,
    force_convert_patterns: Vec<Regex>,
    pub(crate) ignore_attributes: FxHashSet<CompactString>,
}

fn names(
    configured: Option<&Vec<String>>,
    defaults: &[&str],
) -> FxHashSet<CompactString> {
    match configured {
        Some(list) => list.iter().map(|s| CompactString::from(s.as_str())).collect(),
        None => defaults.iter().copied().map(CompactString::from).collect(),
    }
}

fn patterns(configured: Option<&Vec<String>>) -> Result<Vec<Regex>, AnalysisError> {
    configured
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| AnalysisError::InvalidPattern {
                pattern: p.clone(),
                error: e.to_string(),
            })
        })
        .collect()
}

impl CompiledConfig {
    pub(crate) fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        let c = &config.asyncify;
        Ok(CompiledConfig {
            suffix: c
                .async_suffix
                .as_deref()
                .map_or(CompactString::from(DEFAULT_ASYNC_SUFFIX), CompactString::from),
            cancellation_types: names(c.cancellation_types.as_ref(), DEFAULT_CANCELLATION_TYPES),
            propagate_cancellation: c.propagate_cancellation.unwrap_or(true),
            options: CounterpartOptions {
                allow_same_name: c.allow_same_name.unwrap_or(false),
                accepts_cancellation: c.accepts_cancellation.unwrap_or(true),
                equal_parameters: c.equal_parameters.unwrap_or(false),
                search_inherited: c.search_inherited.unwrap_or(true),
            },
            configure_members: names(c.configure_members.as_ref(), DEFAULT_CONFIGURE_MEMBERS),
            awaiter_members: names(c.awaiter_members.as_ref(), DEFAULT_AWAITER_MEMBERS),
            blocking_members: names(c.blocking_members.as_ref(), DEFAULT_BLOCKING_MEMBERS),
            seed_patterns: patterns(c.seed.as_ref())?,
            ignore_patterns: patterns(c.ignore.as_ref())?,
            keep_unknown_patterns: patterns(c.keep_unknown.as_ref())?,
            preserve_return_type_patterns: patterns(c.preserve_return_type.as_ref())?,
            force_convert_patterns: patterns(c.force_convert.as_ref())?,
            ignore_attributes: names(c.ignore_attributes.as_ref(), &[]),
        })
    }

    pub(crate) fn adapter_kind(&self, member: &str) -> Option<AdapterKind> {
        if self.configure_members.contains(member) {
            Some(AdapterKind::Configure)
        } else if self.awaiter_members.contains(member) {
            Some(AdapterKind::Awaiter)
        } else if self.blocking_members.contains(member) {
            Some(AdapterKind::Blocking)
        } else {
            None
        }
    }

    pub(crate) fn seed_matches(&self, full_name: &str) -> bool {
        self.seed_patterns.iter().any(|p| p.is_match(full_name))
    }

    pub(crate) fn ignore_matches(&self, full_name: &str) -> bool {
        self.ignore_patterns.iter().any(|p| p.is_match(full_name))
    }

    pub(crate) fn keep_unknown_matches(&self, full_name: &str) -> bool {
        self.keep_unknown_patterns.iter().any(|p| p.is_match(full_name))
    }

    pub(crate) fn preserve_return_type_matches(&self, full_name: &str) -> bool {
        self.preserve_return_type_patterns
            .iter()
            .any(|p| p.is_match(full_name))
    }

    pub(crate) fn force_convert_matches(&self, full_name: &str) -> bool {
        self.force_convert_patterns
            .iter()
            .any(|p| p.is_match(full_name))
    }
}
