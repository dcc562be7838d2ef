//! Guard-and-throw precondition detection.

use crate::model::{FunctionBody, Stmt};

/// Decides whether a statement is a precondition guard.
///
/// Projects with a guard library can install their own classifier on the
/// engine; the default recognizes the bare conditional-throw shape.
pub trait PreconditionClassifier: Send + Sync {
    /// Whether `stmt` is a guard that validates input and throws
    /// synchronously.
    fn is_precondition(&self, stmt: &Stmt) -> bool;
}

/// Default classifier: a single conditional whose taken branch is exactly
/// one throw, directly or as the sole statement of a block, with no else
/// branch.
pub struct GuardThrowClassifier;

impl PreconditionClassifier for GuardThrowClassifier {
    fn is_precondition(&self, stmt: &Stmt) -> bool {
        let Stmt::If {
            then_branch,
            else_branch,
            ..
        } = stmt
        else {
            return false;
        };
        if !else_branch.is_empty() {
            return false;
        }
        match then_branch.as_slice() {
            [Stmt::Throw(_)] => true,
            [Stmt::Block(inner)] => matches!(inner.as_slice(), [Stmt::Throw(_)]),
            _ => false,
        }
    }
}

/// Length of the unbroken precondition prefix run. Scanning stops at the
/// first non-qualifying statement; expression bodies have no guards.
pub(crate) fn count_prefix(body: &FunctionBody, classifier: &dyn PreconditionClassifier) -> usize {
    let FunctionBody::Block(stmts) = body else {
        return 0;
    };
    stmts
        .iter()
        .take_while(|s| classifier.is_precondition(s))
        .count()
}
