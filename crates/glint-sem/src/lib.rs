//! glint-sem - semantic analyzer and type checker.
//!
//! Turns a parsed [`glint_par`] AST into a resolved, type-checked program:
//! name resolution (C2/C4), generic instantiation (C7 via [`infer`]),
//! constant folding ([`const_eval`]), and the statement/expression checker
//! proper ([`analysis`]). Diagnostics are reported through a
//! [`glint_util::Handler`] as the analysis proceeds; a local failure
//! poisons its result with [`types::Type::Error`] rather than aborting.

pub mod analysis;
pub mod builtins;
pub mod const_eval;
#[cfg(test)]
mod edge_cases;
pub mod hir;
pub mod infer;
pub mod keys;
pub mod scope;
pub mod types;

pub use analysis::SemanticAnalyzer;
pub use hir::{Declaration, Expr, Pattern, Stmt};
pub use scope::SymbolTable;
pub use types::{Type, TypeContext};
