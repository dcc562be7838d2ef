//! The frozen output of an analysis run.
//!
//! A [`ConversionPlan`] carries everything the downstream rewriter needs to
//! rewrite syntax without re-deriving any analysis: the per-function
//! decision and policy flags, and for every reference the bound counterpart
//! (or deferred candidate set) plus the await/tail/return flags and the
//! untouched source-location handle.

use serde::Serialize;

use crate::graph::{Decision, FunctionArena, PolicyFlags};
use crate::model::{full_name, SourceLoc, Symbols};
use crate::references::{IgnoreReason, UsageKind};

/// Final mapping from every analyzed function to its decision and rewrite
/// data. Serializable for transport to an out-of-process rewriter.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionPlan {
    /// One entry per analyzed function, in declaration order.
    pub functions: Vec<PlannedFunction>,
}

/// Decision and rewrite data for one function.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedFunction {
    /// Qualified `Type.function` name.
    pub name: String,
    /// Final conversion verdict.
    pub decision: Decision,
    /// Rewrite-shaping flags (meaningful for converted functions).
    pub policy: PolicyFlags,
    /// Length of the guard-and-throw prefix run.
    pub preconditions: usize,
    /// Classified usage sites inside the body.
    pub references: Vec<PlannedReference>,
}

/// Rewrite data for one usage site.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedReference {
    /// Qualified name of the referenced function.
    pub target: String,
    /// Usage classification.
    pub usage: UsageKind,
    /// Opaque location handle, passed through untouched.
    pub loc: SourceLoc,
    /// Eagerly bound counterpart name, or `None` when binding is deferred
    /// to transformation time.
    pub bound_counterpart: Option<String>,
    /// Candidate counterpart names for deferred binding.
    pub candidates: Vec<String>,
    /// Whether the rewritten call must be awaited in place.
    pub await_needed: bool,
    /// Whether the call passes a continuation callback argument.
    pub continuation_argument: bool,
    /// Whether the usage sits in the unconditionally-last statement.
    pub last_statement: bool,
    /// Whether the produced value is returned.
    pub used_as_return_value: bool,
    /// Whether a cancellation token must be forwarded.
    pub forward_cancellation: bool,
    /// Exclusion reason, when the site must be left alone.
    pub ignored: Option<IgnoreReason>,
}

impl ConversionPlan {
    /// Entry for a qualified function name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&PlannedFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Pretty-printed JSON for transport or inspection.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub(crate) fn freeze(arena: &FunctionArena, symbols: &dyn Symbols) -> ConversionPlan {
    let functions = arena
        .ids()
        .map(|id| {
            let node = arena.node(id);
            PlannedFunction {
                name: full_name(symbols, node.sig),
                decision: node.decision(),
                policy: node.policy.clone(),
                preconditions: node.preconditions,
                references: node
                    .references
                    .iter()
                    .map(|r| PlannedReference {
                        target: full_name(symbols, r.target),
                        usage: r.usage,
                        loc: r.loc,
                        bound_counterpart: r.bound.as_ref().map(ToString::to_string),
                        candidates: r.candidates.iter().map(|c| c.name.to_string()).collect(),
                        await_needed: r.await_needed,
                        continuation_argument: r.continuation_argument,
                        last_statement: r.last_statement,
                        used_as_return_value: r.used_as_return_value,
                        forward_cancellation: r.forward_cancellation,
                        ignored: r.ignore,
                    })
                    .collect(),
            }
        })
        .collect();
    ConversionPlan { functions }
}
