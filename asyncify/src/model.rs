//! The data model the engine analyzes.
//!
//! - `signature`: function signatures and the structural type references
//!   they are built from.
//! - `symbols`: the read-only symbol oracle ([`Symbols`]) plus an arena
//!   implementation ([`SymbolTable`]) hosts and tests populate.
//! - `syntax`: the statement/expression shapes the reference analyzer
//!   classifies, and the host-supplied function declarations.

mod signature;
mod symbols;
mod syntax;

pub use signature::{
    FunctionSignature, ParamMode, Parameter, ReturnShape, SigId, TypeId, TypeParam, TypeRef,
    Variance, Visibility,
};
pub use symbols::{full_name, SymbolTable, Symbols};
pub use syntax::{AssignTarget, Expr, FunctionBody, FunctionDecl, SourceLoc, Stmt};
