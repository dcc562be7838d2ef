//! Diagnostics and the one unrecoverable error.
//!
//! Unsupported usages and ambiguous counterparts are ordinary, expected
//! irregularities: they are recorded against the reference that produced
//! them and the pass continues. Only an unrecognized syntactic context
//! aborts the run — a partial plan derived from a classifier that provably
//! missed a context is unsafe to rewrite against.

use colored::Colorize;
use serde::Serialize;

use crate::model::SourceLoc;

/// Category of a recoverable diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// A usage the classifier cannot safely rewrite; the reference was
    /// ignored and analysis continued.
    UnsupportedUsage,
    /// Multiple counterpart candidates; binding deferred to transformation
    /// time, where exact argument matching disambiguates.
    AmbiguousCounterpart,
}

/// A location-keyed log entry surfaced alongside the plan.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Category.
    pub kind: DiagnosticKind,
    /// `Type.function` containing the reference.
    pub function: String,
    /// `Type.function` being referenced.
    pub target: String,
    /// Location of the reference.
    pub loc: SourceLoc,
    /// Human-readable detail.
    pub message: String,
}

impl Diagnostic {
    /// Renders the diagnostic for terminal output.
    #[must_use]
    pub fn render(&self) -> String {
        let label = match self.kind {
            DiagnosticKind::UnsupportedUsage => "unsupported usage".yellow().bold(),
            DiagnosticKind::AmbiguousCounterpart => "ambiguous counterpart".yellow().bold(),
        };
        format!(
            "{label}: {} -> {} ({}): {}",
            self.function.cyan(),
            self.target.cyan(),
            format!("loc {}", self.loc.0).dimmed(),
            self.message
        )
    }
}

/// Unrecoverable analysis failure.
#[derive(Debug)]
pub enum AnalysisError {
    /// The reference classifier ascended into a syntactic context it has no
    /// arm for. The context table is provably incomplete, so any partial
    /// plan is unsafe.
    UnrecognizedContext {
        /// Function whose body triggered the ascent.
        function: String,
        /// Host description of the unrecognized construct.
        context: String,
        /// Location of the construct.
        loc: SourceLoc,
    },
    /// A configured pattern failed to compile.
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Compiler message.
        error: String,
    },
    /// The run was cancelled between phases.
    Cancelled,
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedContext {
                function,
                context,
                loc,
            } => write!(
                f,
                "unrecognized syntactic context `{context}` in {function} (loc {})",
                loc.0
            ),
            Self::InvalidPattern { pattern, error } => {
                write!(f, "invalid pattern `{pattern}`: {error}")
            }
            Self::Cancelled => write!(f, "analysis cancelled"),
        }
    }
}

impl std::error::Error for AnalysisError {}
