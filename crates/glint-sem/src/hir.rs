//! Resolved declarations, the analyzer's internal `Value`, and the typed
//! IR model produced by the Expression Evaluator (component C6) and
//! consumed, in spirit, by a backend code emitter (out of scope here).

use crate::types::*;
use glint_util::{DefId, Span, Symbol};
use std::cell::{Cell, RefCell};

/// A tagged declaration, one entry per name bound in a symbol table.
/// `used` is flipped by the Symbol Table's resolver the moment any lookup
/// resolves to this declaration (§2b), not by a separate dead-code pass.
#[derive(Debug)]
pub enum Declaration {
    Variable(VariableDecl),
    Function(FunctionDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    TraitInterface(TraitDecl),
    TypeAlias(TypeAliasDecl),
    Package(PackageDecl),
}

impl Declaration {
    pub fn def_id(&self) -> DefId {
        match self {
            Declaration::Variable(v) => v.def_id,
            Declaration::Function(f) => f.def_id,
            Declaration::Struct(s) => s.def_id,
            Declaration::Enum(e) => e.def_id,
            Declaration::TraitInterface(t) => t.def_id,
            Declaration::TypeAlias(t) => t.def_id,
            Declaration::Package(p) => p.def_id,
        }
    }

    pub fn name(&self) -> Symbol {
        match self {
            Declaration::Variable(v) => v.name,
            Declaration::Function(f) => f.name,
            Declaration::Struct(s) => s.name,
            Declaration::Enum(e) => e.name,
            Declaration::TraitInterface(t) => t.name,
            Declaration::TypeAlias(t) => t.name,
            Declaration::Package(p) => p.ident,
        }
    }

    pub fn mark_used(&self) {
        self.used().set(true);
    }

    pub fn is_used(&self) -> bool {
        self.used().get()
    }

    fn used(&self) -> &Cell<bool> {
        match self {
            Declaration::Variable(v) => &v.used,
            Declaration::Function(f) => &f.used,
            Declaration::Struct(s) => &s.used,
            Declaration::Enum(e) => &e.used,
            Declaration::TraitInterface(t) => &t.used,
            Declaration::TypeAlias(t) => &t.used,
            Declaration::Package(p) => &p.used,
        }
    }

    /// Type-only declarations (struct/enum/alias/trait) are evaluated as a
    /// type expression, not a value, by the Identifier row of §4.6.
    pub fn is_type_only(&self) -> bool {
        matches!(
            self,
            Declaration::Struct(_)
                | Declaration::Enum(_)
                | Declaration::TraitInterface(_)
                | Declaration::TypeAlias(_)
        )
    }
}

#[derive(Debug)]
pub struct VariableDecl {
    pub def_id: DefId,
    pub name: Symbol,
    pub span: Span,
    pub declared_ty: Option<Type>,
    pub is_const: bool,
    pub is_mutable: bool,
    pub public: bool,
    pub used: Cell<bool>,
}

#[derive(Debug)]
pub struct FunctionDecl {
    pub def_id: DefId,
    pub name: Symbol,
    pub span: Span,
    pub public: bool,
    pub is_unsafe: bool,
    pub generics: Vec<ParamId>,
    pub params: Vec<Param>,
    pub ret_type: Type,
    pub used: Cell<bool>,
    /// Generic instances already materialized, memoized by the tuple of
    /// concrete type arguments (§9's lazy function-instance cache).
    pub instances: RefCell<Vec<FunctionInstance>>,
}

/// A concrete specialization of a generic function for one tuple of type
/// arguments (or the function itself, for a non-generic function).
#[derive(Debug, Clone)]
pub struct FunctionInstance {
    pub def_id: DefId,
    pub type_args: Vec<Type>,
    pub param_types: Vec<Type>,
    pub ret_type: Type,
    pub body: Body,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub pat: Pattern,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Body {
    pub params: Vec<Pattern>,
    pub value: Expr,
}

#[derive(Debug)]
pub struct StructDecl {
    pub def_id: DefId,
    pub name: Symbol,
    pub span: Span,
    pub public: bool,
    pub generics: Vec<ParamId>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<DefId>,
    pub used: Cell<bool>,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Symbol,
    pub public: bool,
    pub interior_mutable: bool,
    pub ty: Type,
}

#[derive(Debug)]
pub struct EnumDecl {
    pub def_id: DefId,
    pub name: Symbol,
    pub span: Span,
    pub public: bool,
    pub underlying: Type,
    pub items: Vec<(Symbol, Option<i64>)>,
    pub used: Cell<bool>,
}

#[derive(Debug)]
pub struct TraitDecl {
    pub def_id: DefId,
    pub name: Symbol,
    pub span: Span,
    pub public: bool,
    pub methods: Vec<FnSig>,
    pub used: Cell<bool>,
}

#[derive(Debug, Clone)]
pub struct FnSig {
    pub name: Symbol,
    pub params: Vec<Type>,
    pub ret_type: Type,
}

#[derive(Debug)]
pub struct TypeAliasDecl {
    pub def_id: DefId,
    pub name: Symbol,
    pub span: Span,
    pub public: bool,
    pub target: Type,
    pub used: Cell<bool>,
}

#[derive(Debug)]
pub struct PackageDecl {
    pub def_id: DefId,
    pub path: String,
    pub link_path: String,
    pub ident: Symbol,
    pub foreign_header: bool,
    pub stdlib: bool,
    pub used: Cell<bool>,
}

/// The analyzer's internal result of evaluating one expression.
#[derive(Debug, Clone)]
pub struct Value {
    pub ty: Type,
    pub is_constant: bool,
    pub constant: Option<ConstValue>,
    pub is_lvalue: bool,
    pub is_mutable: bool,
    pub is_type_only: bool,
    pub model: Expr,
}

impl Value {
    pub fn poisoned() -> Self {
        Value {
            ty: Type::Error,
            is_constant: false,
            constant: None,
            is_lvalue: false,
            is_mutable: false,
            is_type_only: false,
            model: Expr::Error,
        }
    }

    pub fn is_poisoned(&self) -> bool {
        self.ty.is_error()
    }
}

/// Folded constant payload (component C5).
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(Symbol),
    Unit,
}

/// Typed IR model for an expression, produced by the Expression Evaluator
/// and consumed (conceptually) by a backend code emitter.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal { value: ConstValue, ty: Type },
    Var { def_id: DefId, ty: Type },
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr>, ty: Type },
    Unary { op: UnOp, expr: Box<Expr>, ty: Type },
    Call { func: Box<Expr>, args: Vec<Expr>, ty: Type },
    /// A resolved built-in callable invocation (§4.7.1).
    Builtin { name: Symbol, args: Vec<Expr>, ty: Type },
    Field { object: Box<Expr>, field: DefId, ty: Type },
    Index { object: Box<Expr>, index: Box<Expr>, ty: Type },
    Slice { object: Box<Expr>, start: Option<Box<Expr>>, end: Option<Box<Expr>>, ty: Type },
    CompositeStruct { def_id: DefId, fields: Vec<(DefId, Expr)>, ty: Type },
    CompositeSlice { elems: Vec<Expr>, ty: Type },
    Block { stmts: Vec<Stmt>, expr: Option<Box<Expr>>, ty: Type },
    If { cond: Box<Expr>, then_expr: Box<Expr>, else_expr: Option<Box<Expr>>, ty: Type },
    Match { scrutinee: Box<Expr>, arms: Vec<Arm>, is_type_match: bool, ty: Type },
    Assign { place: Box<Expr>, value: Box<Expr> },
    Return(Option<Box<Expr>>),
    Break(Option<Box<Expr>>, Option<LabelId>),
    Continue(Option<LabelId>),
    /// Poisoned placeholder, suppresses cascading diagnostics (§7).
    Error,
}

impl Expr {
    pub fn ty(&self) -> Type {
        match self {
            Expr::Literal { ty, .. }
            | Expr::Var { ty, .. }
            | Expr::Binary { ty, .. }
            | Expr::Unary { ty, .. }
            | Expr::Call { ty, .. }
            | Expr::Builtin { ty, .. }
            | Expr::Field { ty, .. }
            | Expr::Index { ty, .. }
            | Expr::Slice { ty, .. }
            | Expr::CompositeStruct { ty, .. }
            | Expr::CompositeSlice { ty, .. }
            | Expr::Block { ty, .. }
            | Expr::If { ty, .. }
            | Expr::Match { ty, .. } => ty.clone(),
            Expr::Assign { .. } | Expr::Return(_) | Expr::Break(_, _) | Expr::Continue(_) => {
                Type::VOID
            },
            Expr::Error => Type::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add, Sub, Mul, Div, Mod,
    BitAnd, BitOr, BitXor, Shl, Shr,
    Eq, Ne, Lt, Gt, Le, Ge,
    And, Or,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Deref,
    Ref(bool),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let { pat: Pattern, ty: Type, init: Option<Expr> },
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Wildcard,
    Binding { name: Symbol, ty: Type, mutability: bool },
    Path { def_id: DefId },
    Struct { def_id: DefId, fields: Vec<FieldPattern> },
    Tuple { pats: Vec<Pattern> },
    Ref { pat: Box<Pattern>, mutability: bool },
    Or(Vec<Pattern>),
}

#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub field: DefId,
    pub pat: Pattern,
}

#[derive(Debug, Clone)]
pub struct Arm {
    pub pat: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_poisoned_reports_error_type() {
        let v = Value::poisoned();
        assert!(v.is_poisoned());
        assert!(matches!(v.model, Expr::Error));
    }

    #[test]
    fn declaration_mark_used_flips_cell() {
        let decl = Declaration::Variable(VariableDecl {
            def_id: DefId(1),
            name: Symbol::intern("x"),
            span: Span::DUMMY,
            declared_ty: None,
            is_const: false,
            is_mutable: false,
            public: false,
            used: Cell::new(false),
        });
        assert!(!decl.is_used());
        decl.mark_used();
        assert!(decl.is_used());
    }

    #[test]
    fn struct_and_enum_declarations_are_type_only() {
        let s = Declaration::Struct(StructDecl {
            def_id: DefId(1),
            name: Symbol::intern("S"),
            span: Span::DUMMY,
            public: false,
            generics: vec![],
            fields: vec![],
            methods: vec![],
            used: Cell::new(false),
        });
        assert!(s.is_type_only());
    }

    #[test]
    fn expr_ty_reports_void_for_control_flow() {
        assert_eq!(Expr::Return(None).ty(), Type::VOID);
        assert_eq!(Expr::Continue(None).ty(), Type::VOID);
    }
}
