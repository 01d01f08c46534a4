//! Stable diagnostic message keys (§6 "Outbound: Diagnostics"). These are
//! plain identifiers, distinct from `glint_util::diagnostic::DiagnosticCode`
//! (which numbers *infrastructural* categories); formatting is deliberately
//! left to an external catalog, so every helper here just joins a key to its
//! arguments with the same `key argument` shape the scenarios in the spec
//! use (e.g. `missing_expr_for "v"`).

pub const ID_NOT_EXIST: &str = "id_not_exist";
pub const DUPLICATE_IDENT: &str = "duplicate_ident";
pub const SHADOW_NOT_ALLOWED: &str = "shadow_not_allowed";
pub const CYCLIC_ALIAS: &str = "cyclic_alias";
pub const CYCLIC_FIELD: &str = "cyclic_field";
pub const INVALID_TYPE: &str = "invalid_type";
pub const INCOMPATIBLE_TYPE: &str = "incompatible_type";
pub const NOT_CALLABLE: &str = "not_callable";
pub const NOT_INDEXABLE: &str = "not_indexable";
pub const NOT_A_STRUCT: &str = "not_a_struct";
pub const UNKNOWN_FIELD: &str = "unknown_field";
pub const MISSING_FIELD: &str = "missing_field";
pub const VISIBILITY_VIOLATION: &str = "visibility_violation";
pub const ARGUMENT_OVERFLOW: &str = "argument_overflow";
pub const MISSING_EXPR_FOR: &str = "missing_expr_for";
pub const CONST_OVERFLOW: &str = "const_overflow";
pub const NOT_CONSTANT: &str = "not_constant";
pub const NOT_LVALUE: &str = "not_lvalue";
pub const NOT_MUTABLE: &str = "not_mutable";
pub const AMBIGUOUS_GENERIC: &str = "ambiguous_generic";
pub const UNSAFE_REQUIRED: &str = "unsafe_required";
pub const BREAK_OUTSIDE_LOOP: &str = "break_outside_loop";
pub const CONTINUE_OUTSIDE_LOOP: &str = "continue_outside_loop";
pub const FALLTHROUGH_IN_DEFAULT: &str = "fallthrough_in_default";
pub const INVALID_EXPR: &str = "invalid_expr";
pub const VOID_RETURNS_VALUE: &str = "void_returns_value";
pub const MISSING_RETURN: &str = "missing_return";
pub const IMPORTER_ERROR: &str = "importer_error";

/// Non-fatal warning keys (§2b: used-flag tracking underpins these).
pub const UNUSED_VARIABLE: &str = "unused_variable";
pub const UNUSED_FUNCTION: &str = "unused_function";

/// Joins a key to one argument the way the spec's end-to-end scenarios do,
/// e.g. `missing_expr_for("v")` -> `missing_expr_for "v"`.
pub fn with_arg(key: &str, arg: impl std::fmt::Display) -> String {
    format!("{key} \"{arg}\"")
}
