//! The Type Model (component C1).
//!
//! A resolved `Type` is one of the tagged variants below. `IdentRef` is the
//! only variant allowed to exist before name resolution runs; the invariant
//! enforced by the rest of the analyzer is that no `IdentRef` is reachable
//! from a type-checked node once a package finishes analysis.

use glint_util::{DefId, Idx, IndexVec, Symbol};
use std::collections::HashMap;

/// Primitive type tags, closed set per the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prim {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    UIntPtr,
    F32,
    F64,
    Bool,
    Str,
    Any,
    Void,
}

impl Prim {
    pub fn is_float(self) -> bool {
        matches!(self, Prim::F32 | Prim::F64)
    }

    pub fn is_signed_int(self) -> bool {
        matches!(self, Prim::I8 | Prim::I16 | Prim::I32 | Prim::I64)
    }

    pub fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            Prim::U8 | Prim::U16 | Prim::U32 | Prim::U64 | Prim::UIntPtr
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_float() || self.is_signed_int() || self.is_unsigned_int()
    }

    /// Bit width used by `widest_numeric` and bitization; uintptr is
    /// treated as 64-bit for width comparisons.
    pub fn width(self) -> u32 {
        match self {
            Prim::I8 | Prim::U8 => 8,
            Prim::I16 | Prim::U16 => 16,
            Prim::I32 | Prim::U32 | Prim::F32 => 32,
            Prim::I64 | Prim::U64 | Prim::F64 | Prim::UIntPtr => 64,
            Prim::Bool | Prim::Str | Prim::Any | Prim::Void => 0,
        }
    }

    /// True if `value` fits within this primitive's range. Only meaningful
    /// for integer primitives.
    pub fn fits_i64(self, value: i64) -> bool {
        match self {
            Prim::I8 => i8::try_from(value).is_ok(),
            Prim::I16 => i16::try_from(value).is_ok(),
            Prim::I32 => i32::try_from(value).is_ok(),
            Prim::I64 => true,
            Prim::U8 => u8::try_from(value).is_ok(),
            Prim::U16 => u16::try_from(value).is_ok(),
            Prim::U32 => u32::try_from(value).is_ok(),
            Prim::U64 | Prim::UIntPtr => value >= 0,
            _ => false,
        }
    }
}

/// Generic parameter identity, shared by functions, structs, and enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub DefId);

/// Type inference variable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InferId(pub u32);

impl Idx for InferId {
    fn from_usize(idx: usize) -> Self {
        InferId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSig {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
    pub generics: Vec<ParamId>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// One of the closed primitive tags.
    Primitive(Prim),
    /// Unresolved textual name; must not survive past name resolution.
    IdentRef(Symbol),
    /// `ref T`.
    Reference(Box<Type>),
    /// `[]T`.
    Slice(Box<Type>),
    /// `(T1, T2, ...)`.
    Tuple(Vec<Type>),
    /// `fn(A, B) -> C`, optionally generic.
    Function(FunctionSig),
    /// Handle to a struct declaration plus resolved generic arguments.
    StructRef { def_id: DefId, args: Vec<Type> },
    /// Handle to an enum declaration.
    EnumRef { def_id: DefId },
    /// A function/struct/enum's own generic parameter, prior to
    /// instantiation.
    Param(ParamId),
    /// Type inference variable; resolved away before a Value is finalized.
    Infer(InferId),
    /// Poisoned placeholder produced after a local error; compares
    /// incompatible with everything including itself, so it never causes
    /// a spurious `assignable` success.
    Error,
}

impl Type {
    pub const VOID: Type = Type::Primitive(Prim::Void);
    pub const BOOL: Type = Type::Primitive(Prim::Bool);
    pub const STR: Type = Type::Primitive(Prim::Str);
    pub const ANY: Type = Type::Primitive(Prim::Any);
    pub const I64: Type = Type::Primitive(Prim::I64);
    pub const U64: Type = Type::Primitive(Prim::U64);

    pub fn is_identifier_ref(&self) -> bool {
        matches!(self, Type::IdentRef(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference(_))
    }

    pub fn as_prim(&self) -> Option<Prim> {
        match self {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_prim().map(Prim::is_numeric).unwrap_or(false)
    }
}

/// Structural equality with name-identity for struct/enum/alias handles
/// (aliases are erased to their target handle before this is called, so
/// two `StructRef`s compare equal iff they name the same declaration and
/// the same resolved generic arguments).
pub fn equal(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Error, _) | (_, Type::Error) => false,
        _ => a == b,
    }
}

/// `assignable(dst, src, src_is_const)`: can a value of type `src` be
/// assigned/coerced into a destination of type `dst`?
pub fn assignable(dst: &Type, src: &Type, src_is_const: bool) -> bool {
    if dst.is_error() || src.is_error() {
        return false;
    }
    if equal(dst, src) {
        return true;
    }
    match (dst, src) {
        // Untyped numeric constants coerce into any numeric type whose
        // range they fit; width/range checking itself happens in the
        // constant evaluator (§4.5), this only gates primitive-kind
        // compatibility (no implicit float->int or int->float narrowing
        // outside the constant-folding path).
        (Type::Primitive(dp), Type::Primitive(sp)) if src_is_const => {
            dp.is_numeric() && sp.is_numeric() && dp.is_float() == sp.is_float()
        },
        // `any` accepts anything; conversely a value already typed `any`
        // is only usable where `any` is expected (no implicit narrowing
        // back out of `any`).
        (Type::Primitive(Prim::Any), _) => true,
        (Type::Reference(d), Type::Reference(s)) => equal(d, s),
        (Type::Slice(d), Type::Slice(s)) => equal(d, s),
        (Type::Tuple(ds), Type::Tuple(ss)) if ds.len() == ss.len() => ds
            .iter()
            .zip(ss.iter())
            .all(|(d, s)| assignable(d, s, false)),
        _ => false,
    }
}

/// `widest_numeric(T1, T2)`: result type of a binary numeric operation.
pub fn widest_numeric(t1: &Type, t2: &Type) -> Option<Type> {
    let (p1, p2) = (t1.as_prim()?, t2.as_prim()?);
    if !p1.is_numeric() || !p2.is_numeric() {
        return None;
    }
    if p1 == p2 {
        return Some(Type::Primitive(p1));
    }
    if p1.is_float() || p2.is_float() {
        let wider = if p1.is_float() && p2.is_float() {
            if p1.width() >= p2.width() { p1 } else { p2 }
        } else if p1.is_float() {
            p1
        } else {
            p2
        };
        return Some(Type::Primitive(wider));
    }
    if p1.is_signed_int() == p2.is_signed_int() {
        let wider = if p1.width() >= p2.width() { p1 } else { p2 };
        return Some(Type::Primitive(wider));
    }
    // Mixed signedness: signed side wins only if this call's caller has
    // already established the unsigned operand is a constant fitting the
    // signed range (checked by the caller in the constant evaluator);
    // here we simply pick the signed type when widths allow it.
    let (signed, unsigned) = if p1.is_signed_int() { (p1, p2) } else { (p2, p1) };
    if signed.width() > unsigned.width() {
        Some(Type::Primitive(signed))
    } else {
        None
    }
}

/// Type context: per-package bookkeeping for definitions, expressions and
/// unresolved inference variables. Owned by the `SemanticAnalyzer`.
#[derive(Default)]
pub struct TypeContext {
    pub def_types: HashMap<DefId, Type>,
    pub expr_types: HashMap<ExprId, Type>,
    pub substitutions: IndexVec<InferId, Option<Type>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

impl TypeContext {
    pub fn type_of_def(&self, def_id: DefId) -> Option<&Type> {
        self.def_types.get(&def_id)
    }

    pub fn set_def_type(&mut self, def_id: DefId, ty: Type) {
        self.def_types.insert(def_id, ty);
    }

    pub fn new_infer_var(&mut self) -> InferId {
        self.substitutions.push(None)
    }

    /// Path-compressing substitution: resolves a chain of inference
    /// variables down to either a concrete type or the last unbound
    /// variable in the chain.
    pub fn substitute(&self, ty: &Type) -> Type {
        match ty {
            Type::Infer(id) => match self.substitutions.get(*id) {
                Some(Some(t)) => self.substitute(t),
                _ => ty.clone(),
            },
            Type::Tuple(tys) => Type::Tuple(tys.iter().map(|t| self.substitute(t)).collect()),
            Type::Reference(t) => Type::Reference(Box::new(self.substitute(t))),
            Type::Slice(t) => Type::Slice(Box::new(self.substitute(t))),
            Type::Function(sig) => Type::Function(FunctionSig {
                params: sig.params.iter().map(|p| self.substitute(p)).collect(),
                ret: Box::new(self.substitute(&sig.ret)),
                generics: sig.generics.clone(),
                variadic: sig.variadic,
            }),
            _ => ty.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Prim ===

    #[test]
    fn prim_width_ordering() {
        assert!(Prim::I64.width() > Prim::I32.width());
        assert_eq!(Prim::UIntPtr.width(), 64);
    }

    #[test]
    fn prim_fits_i64() {
        assert!(Prim::U8.fits_i64(255));
        assert!(!Prim::U8.fits_i64(256));
        assert!(!Prim::U8.fits_i64(-1));
        assert!(Prim::I8.fits_i64(-128));
        assert!(!Prim::I8.fits_i64(128));
    }

    // === equal / assignable ===

    #[test]
    fn equal_rejects_error() {
        assert!(!equal(&Type::Error, &Type::Error));
    }

    #[test]
    fn equal_primitive() {
        assert!(equal(&Type::Primitive(Prim::I32), &Type::Primitive(Prim::I32)));
        assert!(!equal(&Type::Primitive(Prim::I32), &Type::Primitive(Prim::I64)));
    }

    #[test]
    fn assignable_const_numeric_widens() {
        assert!(assignable(
            &Type::Primitive(Prim::U32),
            &Type::Primitive(Prim::I64),
            true
        ));
    }

    #[test]
    fn assignable_rejects_non_const_cross_kind() {
        assert!(!assignable(
            &Type::Primitive(Prim::U32),
            &Type::Primitive(Prim::I64),
            false
        ));
    }

    #[test]
    fn assignable_any_accepts_anything() {
        assert!(assignable(&Type::ANY, &Type::Primitive(Prim::Bool), false));
    }

    #[test]
    fn assignable_references_are_invariant() {
        let r_i32 = Type::Reference(Box::new(Type::Primitive(Prim::I32)));
        let r_i64 = Type::Reference(Box::new(Type::Primitive(Prim::I64)));
        assert!(!assignable(&r_i32, &r_i64, false));
        assert!(assignable(&r_i32, &r_i32, false));
    }

    // === widest_numeric ===

    #[test]
    fn widest_numeric_float_wins() {
        let t = widest_numeric(&Type::Primitive(Prim::F32), &Type::Primitive(Prim::I64)).unwrap();
        assert_eq!(t, Type::Primitive(Prim::F32));
    }

    #[test]
    fn widest_numeric_same_signedness_picks_wider() {
        let t = widest_numeric(&Type::Primitive(Prim::I8), &Type::Primitive(Prim::I64)).unwrap();
        assert_eq!(t, Type::Primitive(Prim::I64));
    }

    #[test]
    fn widest_numeric_mixed_signedness_needs_room() {
        assert!(widest_numeric(&Type::Primitive(Prim::I8), &Type::Primitive(Prim::U64)).is_none());
        let t = widest_numeric(&Type::Primitive(Prim::I64), &Type::Primitive(Prim::U8)).unwrap();
        assert_eq!(t, Type::Primitive(Prim::I64));
    }

    // === TypeContext ===

    #[test]
    fn type_context_def_types_roundtrip() {
        let mut ctx = TypeContext::default();
        let id = DefId(1);
        ctx.set_def_type(id, Type::Primitive(Prim::Bool));
        assert_eq!(ctx.type_of_def(id), Some(&Type::Primitive(Prim::Bool)));
    }

    #[test]
    fn type_context_substitute_chains_infer_vars() {
        let mut ctx = TypeContext::default();
        let v0 = ctx.new_infer_var();
        let v1 = ctx.new_infer_var();
        ctx.substitutions[v0] = Some(Type::Infer(v1));
        ctx.substitutions[v1] = Some(Type::Primitive(Prim::I64));
        assert_eq!(ctx.substitute(&Type::Infer(v0)), Type::Primitive(Prim::I64));
    }

    #[test]
    fn type_context_substitute_leaves_unbound() {
        let mut ctx = TypeContext::default();
        let v0 = ctx.new_infer_var();
        assert_eq!(ctx.substitute(&Type::Infer(v0)), Type::Infer(v0));
    }
}
