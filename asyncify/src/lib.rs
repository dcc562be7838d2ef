//! asyncify — a conversion decision engine for synchronous code bodies.
//!
//! Given a read-only symbol model and the bodies of the functions declared in
//! it, the engine decides which functions must be converted to an
//! asynchronous calling convention, how each conversion should be shaped, and
//! which call sites must be rewritten to invoke an asynchronous counterpart.
//!
//! The engine runs in strict phases:
//! 1. reference analysis — every usage of a function inside another
//!    function's body is classified and annotated (parallelizable),
//! 2. call graph construction — invoke/invoked-by edges are aggregated,
//! 3. conversion propagation — a worklist fixed point assigns a final
//!    decision to every function,
//! 4. policy resolution — per-function rewrite flags are derived.
//!
//! The output is a [`plan::ConversionPlan`]: everything a downstream rewriter
//! needs to rewrite syntax without re-deriving any analysis. The engine
//! itself performs no I/O and never parses source text; the symbol model and
//! the statement shapes it classifies are supplied by the host.

pub mod config;
pub mod counterpart;
pub mod diagnostics;
pub mod engine;
pub mod graph;
pub mod model;
pub mod plan;
pub mod policy;
pub mod references;

mod constants;
mod propagate;

pub use config::Config;
pub use diagnostics::{AnalysisError, Diagnostic, DiagnosticKind};
pub use engine::{AnalysisOutcome, AnalysisSummary, Asyncify};
pub use graph::{Decision, FuncId, PolicyFlags};
pub use plan::ConversionPlan;

/// Global cancellation flag, checked between analysis phases.
///
/// The host (typically a ctrl-c handler or an IDE request broker) sets this;
/// a cancelled run fails with [`AnalysisError::Cancelled`]. Never checked
/// mid-phase: individual phases are bounded and cheap.
pub static CANCELLED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
