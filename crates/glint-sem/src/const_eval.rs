//! The Constant Evaluator (component C5), grounded in the literal-folding
//! pass of a prior-art front-end's `parser/literals` module.

use crate::hir::{BinOp, ConstValue};
use crate::types::{Prim, Type};
use glint_par::ast;

/// Evaluates a literal node into a constant payload and its bitized type
/// (§4.5/§2b's rune-vs-byte and float-demotion rules).
pub fn eval_literal(lit: &ast::Literal) -> (ConstValue, Type) {
    match lit {
        ast::Literal::Int(n) => (ConstValue::Int(*n), bitize_int(*n)),
        ast::Literal::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                let n = *f as i64;
                (ConstValue::Int(n), bitize_int(n))
            } else {
                (ConstValue::Float(*f), Type::Primitive(Prim::F64))
            }
        },
        ast::Literal::String(s) => (ConstValue::Str(*s), Type::STR),
        ast::Literal::Char(c) => {
            let code = *c as u32;
            if code <= 255 {
                (ConstValue::Int(code as i64), Type::Primitive(Prim::U8))
            } else {
                (ConstValue::Int(code as i64), Type::Primitive(Prim::I32))
            }
        },
        ast::Literal::Bool(b) => (ConstValue::Bool(*b), Type::BOOL),
        ast::Literal::Unit => (ConstValue::Unit, Type::VOID),
    }
}

/// Minimum signed width fitting `n` (§4.5 "Bitization").
pub fn bitize_int(n: i64) -> Type {
    if i8::try_from(n).is_ok() {
        Type::Primitive(Prim::I8)
    } else if i16::try_from(n).is_ok() {
        Type::Primitive(Prim::I16)
    } else if i32::try_from(n).is_ok() {
        Type::Primitive(Prim::I32)
    } else {
        Type::Primitive(Prim::I64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstEvalError {
    Overflow,
    NotNumeric,
    NotBoolean,
    DivisionByZero,
}

/// Folds a binary operator over two constants when both sides are constant
/// (§4.5 "Constant folding applies to arithmetic, bitwise, comparison, and
/// logical operators"). Overflow is an error, never a silent wrap.
pub fn fold_binary(op: BinOp, lhs: &ConstValue, rhs: &ConstValue) -> Result<ConstValue, ConstEvalError> {
    use ConstValue::*;

    if op.is_logical() {
        return match (lhs, rhs) {
            (Bool(a), Bool(b)) => Ok(Bool(match op {
                BinOp::And => *a && *b,
                BinOp::Or => *a || *b,
                _ => unreachable!(),
            })),
            _ => Err(ConstEvalError::NotBoolean),
        };
    }

    if op.is_comparison() {
        return fold_comparison(op, lhs, rhs);
    }

    match (lhs, rhs) {
        (Int(a), Int(b)) => fold_int(op, *a, *b).map(Int),
        (Float(a), Float(b)) => Ok(Float(fold_float(op, *a, *b))),
        (Int(a), Float(b)) => Ok(Float(fold_float(op, *a as f64, *b))),
        (Float(a), Int(b)) => Ok(Float(fold_float(op, *a, *b as f64))),
        _ => Err(ConstEvalError::NotNumeric),
    }
}

fn fold_int(op: BinOp, a: i64, b: i64) -> Result<i64, ConstEvalError> {
    match op {
        BinOp::Add => a.checked_add(b).ok_or(ConstEvalError::Overflow),
        BinOp::Sub => a.checked_sub(b).ok_or(ConstEvalError::Overflow),
        BinOp::Mul => a.checked_mul(b).ok_or(ConstEvalError::Overflow),
        BinOp::Div => {
            if b == 0 {
                Err(ConstEvalError::DivisionByZero)
            } else {
                a.checked_div(b).ok_or(ConstEvalError::Overflow)
            }
        },
        BinOp::Mod => {
            if b == 0 {
                Err(ConstEvalError::DivisionByZero)
            } else {
                a.checked_rem(b).ok_or(ConstEvalError::Overflow)
            }
        },
        BinOp::BitAnd => Ok(a & b),
        BinOp::BitOr => Ok(a | b),
        BinOp::BitXor => Ok(a ^ b),
        BinOp::Shl => a.checked_shl(b as u32).ok_or(ConstEvalError::Overflow),
        BinOp::Shr => a.checked_shr(b as u32).ok_or(ConstEvalError::Overflow),
        _ => Err(ConstEvalError::NotNumeric),
    }
}

fn fold_float(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        _ => f64::NAN,
    }
}

fn fold_comparison(op: BinOp, lhs: &ConstValue, rhs: &ConstValue) -> Result<ConstValue, ConstEvalError> {
    use ConstValue::*;
    let ordering = match (lhs, rhs) {
        (Int(a), Int(b)) => a.partial_cmp(b),
        (Float(a), Float(b)) => a.partial_cmp(b),
        (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
        (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
        (Bool(a), Bool(b)) => a.partial_cmp(b),
        (Str(a), Str(b)) => a.as_str().partial_cmp(b.as_str()),
        _ => return Err(ConstEvalError::NotNumeric),
    };
    let Some(ordering) = ordering else {
        return Err(ConstEvalError::NotNumeric);
    };
    use std::cmp::Ordering::*;
    let result = match op {
        BinOp::Eq => ordering == Equal,
        BinOp::Ne => ordering != Equal,
        BinOp::Lt => ordering == Less,
        BinOp::Gt => ordering == Greater,
        BinOp::Le => ordering != Greater,
        BinOp::Ge => ordering != Less,
        _ => unreachable!(),
    };
    Ok(Bool(result))
}
