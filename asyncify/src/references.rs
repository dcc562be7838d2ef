//! Reference analysis: classify every usage of a function inside another
//! function's body and compute the per-reference properties the rewriter
//! needs.
//!
//! Each function body is analyzed independently (the engine fans bodies out
//! across worker threads); the result is an immutable [`ReferenceDelta`]
//! merged back into the arena by the engine, so no two phases ever write the
//! same fields.

mod walker;

use compact_str::CompactString;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::config::compiled::CompiledConfig;
use crate::counterpart::{CandidateList, CounterpartResolver};
use crate::diagnostics::{AnalysisError, Diagnostic};
use crate::graph::FunctionNode;
use crate::model::{SigId, SourceLoc, Symbols};

/// How a function is used at a reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UsageKind {
    /// The function is invoked directly.
    DirectInvocation,
    /// The function is passed as a callback argument to another call.
    DelegateArgument,
    /// The function is assigned to a variable or member.
    VariableAssignment,
    /// The function is subscribed to an event.
    EventSubscription,
    /// The function is mentioned in a doc comment.
    DocMention,
}

/// Why a reference was excluded from rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IgnoreReason {
    /// Rewriting an assigned function reference would change a
    /// statically-declared delegate type.
    VariableAssignment,
    /// Event handler signatures are fixed by the event declaration.
    EventSubscription,
    /// Doc mentions are updated textually, never rewritten.
    DocMention,
    /// The receiving parameter's declared type cannot produce a deferred
    /// result.
    DelegateNotAsyncCapable,
    /// The deferred result flows into a member outside the recognized
    /// adapter sets; awaiting in place would change evaluation order.
    UnrecognizedAdapter,
    /// A bare function reference in a context that consumes the function
    /// itself as a value.
    BareReference,
}

/// One classified usage site.
#[derive(Debug, Clone)]
pub struct Reference {
    /// The referenced function.
    pub target: SigId,
    /// Usage classification.
    pub usage: UsageKind,
    /// Opaque location of the usage, passed through to the rewriter.
    pub loc: SourceLoc,
    /// Index of the enclosing top-level statement in the function body.
    pub stmt_index: usize,
    /// Resolved counterpart candidates (possibly one synthetic prospective
    /// candidate for an in-analysis-set target).
    pub candidates: CandidateList,
    /// Eagerly bound counterpart name; `None` defers binding to
    /// transformation time.
    pub bound: Option<CompactString>,
    /// Whether the rewritten call site must be awaited in place.
    pub await_needed: bool,
    /// Whether the call passes a continuation callback argument.
    pub continuation_argument: bool,
    /// Whether the usage's statement is the unconditionally-last statement
    /// of the body.
    pub last_statement: bool,
    /// Whether the produced value is returned from the enclosing function.
    pub used_as_return_value: bool,
    /// Whether the rewritten call must forward a cancellation token.
    pub forward_cancellation: bool,
    /// Exclusion marker; always set for usage kinds other than
    /// direct-invocation and delegate-argument.
    pub ignore: Option<IgnoreReason>,
}

impl Reference {
    pub(crate) fn new(target: SigId, loc: SourceLoc, stmt_index: usize) -> Self {
        Reference {
            target,
            usage: UsageKind::DirectInvocation,
            loc,
            stmt_index,
            candidates: CandidateList::new(),
            bound: None,
            await_needed: false,
            continuation_argument: false,
            last_statement: false,
            used_as_return_value: false,
            forward_cancellation: false,
            ignore: None,
        }
    }
}

/// Immutable result of analyzing one function body.
#[derive(Default)]
pub(crate) struct ReferenceDelta {
    pub(crate) references: Vec<Reference>,
    /// Set when a matched candidate takes a cancellation token the original
    /// does not; propagated into the enclosing function.
    pub(crate) cancellation_required: bool,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

/// Analyzes every usage site in `node`'s body (and its doc mentions).
pub(crate) fn analyze_function(
    symbols: &dyn Symbols,
    resolver: &CounterpartResolver,
    cfg: &CompiledConfig,
    in_set: &FxHashSet<SigId>,
    node: &FunctionNode,
) -> Result<ReferenceDelta, AnalysisError> {
    walker::ReferenceWalker::run(symbols, resolver, cfg, in_set, node)
}
