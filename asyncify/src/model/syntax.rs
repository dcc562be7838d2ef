use compact_str::CompactString;
use serde::Serialize;

use super::signature::{SigId, TypeRef};

/// Opaque source-location handle.
///
/// Minted by the host, passed through the plan untouched so the rewriter can
/// find the syntax node again. The engine only ever copies and compares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLoc(pub u64);

/// A declared function handed to the engine: its signature handle, its body
/// shape (if any), nested functions, and doc-comment mentions of other
/// functions.
pub struct FunctionDecl {
    /// Signature handle in the symbol model.
    pub sig: SigId,
    /// Body shape; `None` for signature-only declarations.
    pub body: Option<FunctionBody>,
    /// Nested / local / anonymous functions declared inside the body.
    pub children: Vec<FunctionDecl>,
    /// Functions mentioned in the doc comment, with their locations.
    pub doc_mentions: Vec<(SigId, SourceLoc)>,
}

impl FunctionDecl {
    /// A declaration with a block body.
    #[must_use]
    pub fn new(sig: SigId, stmts: Vec<Stmt>) -> Self {
        FunctionDecl {
            sig,
            body: Some(FunctionBody::Block(stmts)),
            children: Vec::new(),
            doc_mentions: Vec::new(),
        }
    }

    /// An expression-bodied declaration.
    #[must_use]
    pub fn expression(sig: SigId, expr: Expr) -> Self {
        FunctionDecl {
            sig,
            body: Some(FunctionBody::Expression(expr)),
            children: Vec::new(),
            doc_mentions: Vec::new(),
        }
    }

    /// A signature-only declaration (interface member, external stub).
    #[must_use]
    pub fn signature_only(sig: SigId) -> Self {
        FunctionDecl {
            sig,
            body: None,
            children: Vec::new(),
            doc_mentions: Vec::new(),
        }
    }

    /// Adds a nested function.
    #[must_use]
    pub fn with_child(mut self, child: FunctionDecl) -> Self {
        self.children.push(child);
        self
    }

    /// Adds a doc-comment mention.
    #[must_use]
    pub fn with_doc_mention(mut self, target: SigId, loc: SourceLoc) -> Self {
        self.doc_mentions.push((target, loc));
        self
    }
}

/// Body of a declared function.
pub enum FunctionBody {
    /// An ordinary statement block.
    Block(Vec<Stmt>),
    /// An expression-bodied function; the expression is both the only and
    /// the last "statement" and its value is returned.
    Expression(Expr),
}

/// Statement shapes the reference analyzer distinguishes.
pub enum Stmt {
    /// Expression statement.
    Expr(Expr),
    /// Return, with an optional value.
    Return(Option<Expr>),
    /// Conditional with optional else branch.
    If {
        /// Condition expression.
        cond: Expr,
        /// Statements of the taken branch.
        then_branch: Vec<Stmt>,
        /// Statements of the else branch, empty when absent.
        else_branch: Vec<Stmt>,
    },
    /// Throw statement.
    Throw(Expr),
    /// Structural "yield"-style producer statement.
    Yield(Option<Expr>),
    /// Local declaration with an optional initializer.
    Local {
        /// Declared name.
        name: CompactString,
        /// Initializer, when present.
        value: Option<Expr>,
    },
    /// Nested block.
    Block(Vec<Stmt>),
}

/// Target of an assignment expression.
pub enum AssignTarget {
    /// A local variable.
    Local(CompactString),
    /// A member of the enclosing type.
    Member(CompactString),
    /// An event; subscriptions are never rewritable.
    Event(CompactString),
}

/// Expression shapes the reference analyzer distinguishes.
///
/// Anything the host cannot express with the recognized shapes must be
/// wrapped in [`Expr::Unrecognized`]; a function reference beneath one aborts
/// the run rather than producing an unsafe plan.
pub enum Expr {
    /// Invocation. The callee is an expression: a [`Expr::FuncRef`] for a
    /// direct call, or a member chain off another expression.
    Call {
        /// Callee expression.
        callee: Box<Expr>,
        /// Positional arguments.
        args: Vec<Expr>,
        /// Location of the invocation.
        loc: SourceLoc,
    },
    /// A reference to a declared function — the usage sites this engine
    /// exists to classify.
    FuncRef {
        /// The referenced function.
        target: SigId,
        /// Location of the reference.
        loc: SourceLoc,
    },
    /// Ternary conditional.
    Ternary {
        /// Condition.
        cond: Box<Expr>,
        /// Value of the taken branch.
        then_value: Box<Expr>,
        /// Value of the other branch.
        else_value: Box<Expr>,
    },
    /// Cast to a named type.
    Cast {
        /// Expression being cast.
        value: Box<Expr>,
        /// Target type.
        to: TypeRef,
    },
    /// Assignment (including event subscription, by target kind).
    Assign {
        /// Assignment target.
        target: AssignTarget,
        /// Assigned value.
        value: Box<Expr>,
    },
    /// Member access off a base expression.
    Member {
        /// Base expression.
        base: Box<Expr>,
        /// Accessed member name.
        name: CompactString,
    },
    /// A plain name (local, parameter, field). Inert for classification.
    Name(CompactString),
    /// A literal. Inert for classification.
    Literal(CompactString),
    /// A syntactic context the classifier has no arm for.
    Unrecognized {
        /// Host description of the construct, used in the fatal error.
        description: CompactString,
        /// Location of the construct.
        loc: SourceLoc,
        /// Sub-expressions, still walked for usage sites.
        children: Vec<Expr>,
    },
}

impl Expr {
    /// Direct invocation of a declared function.
    #[must_use]
    pub fn call(target: SigId, args: Vec<Expr>, loc: SourceLoc) -> Self {
        Expr::Call {
            callee: Box::new(Expr::FuncRef { target, loc }),
            args,
            loc,
        }
    }

    /// Bare reference to a declared function.
    #[must_use]
    pub fn func_ref(target: SigId, loc: SourceLoc) -> Self {
        Expr::FuncRef { target, loc }
    }

    /// Member access off this expression.
    #[must_use]
    pub fn member(self, name: &str) -> Self {
        Expr::Member {
            base: Box::new(self),
            name: CompactString::from(name),
        }
    }

    /// Invocation of this expression (used for adapter-member calls).
    #[must_use]
    pub fn invoked(self, loc: SourceLoc) -> Self {
        Expr::Call {
            callee: Box::new(self),
            args: Vec::new(),
            loc,
        }
    }

    /// String literal convenience.
    #[must_use]
    pub fn literal(text: &str) -> Self {
        Expr::Literal(CompactString::from(text))
    }

    /// Name convenience.
    #[must_use]
    pub fn name(text: &str) -> Self {
        Expr::Name(CompactString::from(text))
    }
}
