//! Generic instantiation support (component C7, step 3): Hindley-Milner
//! style unification over the structural `Type` shapes of §4.1, used to
//! infer a generic function's type parameters from call-site argument
//! types before a `FunctionInstance` is materialized.

use super::types::*;
use glint_util::{DefId, Idx};
use std::collections::{HashMap, VecDeque};

pub struct TypeInference {
    ctx: TypeContext,
    constraints: VecDeque<Constraint>,
    unify_cache: HashMap<(InferId, InferId), Result<Type, TypeError>>,
}

#[derive(Debug, Clone)]
pub enum TypeError {
    OccursCheck(InferId, Type),
    UnificationFailed(Type, Type),
    NoSolution(String),
}

impl TypeInference {
    pub fn new() -> Self {
        Self {
            ctx: TypeContext::default(),
            constraints: VecDeque::new(),
            unify_cache: HashMap::new(),
        }
    }

    pub fn new_infer_var(&mut self) -> Type {
        Type::Infer(self.ctx.new_infer_var())
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push_back(constraint);
    }

    /// Drains the constraint queue, unifying each pair, and hands back the
    /// resulting substitution table.
    pub fn solve(&mut self) -> Result<TypeContext, TypeError> {
        while let Some(constraint) = self.constraints.pop_front() {
            self.solve_constraint(constraint)?;
        }
        Ok(std::mem::take(&mut self.ctx))
    }

    fn solve_constraint(&mut self, constraint: Constraint) -> Result<(), TypeError> {
        match constraint {
            Constraint::Equal(t1, t2) => self.unify(&t1, &t2),
            Constraint::SubType(t1, t2) => self.unify(&t1, &t2),
            Constraint::Implements(_t, _trait_def) => {
                // Trait bound checking is outside this analyzer's scope
                // (no TraitInterface method-set checking is specified);
                // accepted unconditionally.
                Ok(())
            },
        }
    }

    pub fn unify(&mut self, t1: &Type, t2: &Type) -> Result<(), TypeError> {
        if let Type::Infer(id) = t1 {
            if self.occurs_check(*id, t2) {
                return Err(TypeError::OccursCheck(*id, t2.clone()));
            }
        }
        if let Type::Infer(id) = t2 {
            if self.occurs_check(*id, t1) {
                return Err(TypeError::OccursCheck(*id, t1.clone()));
            }
        }

        match (t1, t2) {
            (Type::Infer(i1), Type::Infer(i2)) => {
                if i1 == i2 {
                    return Ok(());
                }
                let key = (*i1, *i2);
                if let Some(result) = self.unify_cache.get(&key) {
                    return result.clone().map(|_| ());
                }
                self.ctx.substitutions[*i1] = Some(t2.clone());
                Ok(())
            },
            (Type::Infer(id), t) | (t, Type::Infer(id)) => {
                self.ctx.substitutions[*id] = Some(t.clone());
                Ok(())
            },
            (Type::Error, _) | (_, Type::Error) => Ok(()),
            (Type::Primitive(p1), Type::Primitive(p2)) => {
                if p1 == p2 {
                    Ok(())
                } else {
                    Err(TypeError::UnificationFailed(t1.clone(), t2.clone()))
                }
            },
            (Type::Function(s1), Type::Function(s2)) => {
                if s1.params.len() != s2.params.len() {
                    return Err(TypeError::UnificationFailed(t1.clone(), t2.clone()));
                }
                self.unify(&s1.ret, &s2.ret)?;
                for (a1, a2) in s1.params.iter().zip(s2.params.iter()) {
                    self.unify(a1, a2)?;
                }
                Ok(())
            },
            (Type::Tuple(ts1), Type::Tuple(ts2)) => {
                if ts1.len() != ts2.len() {
                    return Err(TypeError::UnificationFailed(t1.clone(), t2.clone()));
                }
                for (e1, e2) in ts1.iter().zip(ts2.iter()) {
                    self.unify(e1, e2)?;
                }
                Ok(())
            },
            (Type::Reference(a), Type::Reference(b)) => self.unify(a, b),
            (Type::Slice(a), Type::Slice(b)) => self.unify(a, b),
            (Type::StructRef { def_id: d1, args: a1 }, Type::StructRef { def_id: d2, args: a2 }) => {
                if d1 != d2 || a1.len() != a2.len() {
                    return Err(TypeError::UnificationFailed(t1.clone(), t2.clone()));
                }
                for (x, y) in a1.iter().zip(a2.iter()) {
                    self.unify(x, y)?;
                }
                Ok(())
            },
            (Type::EnumRef { def_id: d1 }, Type::EnumRef { def_id: d2 }) => {
                if d1 == d2 {
                    Ok(())
                } else {
                    Err(TypeError::UnificationFailed(t1.clone(), t2.clone()))
                }
            },
            (Type::Param(p1), Type::Param(p2)) => {
                if p1 == p2 {
                    Ok(())
                } else {
                    Err(TypeError::UnificationFailed(t1.clone(), t2.clone()))
                }
            },
            _ => Err(TypeError::UnificationFailed(t1.clone(), t2.clone())),
        }
    }

    /// Iterative (stack-based) occurs check to avoid recursion blowing the
    /// stack on deeply nested generic types.
    fn occurs_check(&self, var: InferId, t: &Type) -> bool {
        let mut stack = vec![t];

        while let Some(current) = stack.pop() {
            match current {
                Type::Infer(id) => {
                    if *id == var {
                        return true;
                    }
                    if let Some(Some(s)) = self.ctx.substitutions.get(*id) {
                        stack.push(s);
                    }
                },
                Type::Function(sig) => {
                    stack.extend(sig.params.iter());
                    stack.push(&sig.ret);
                },
                Type::Tuple(ts) => stack.extend(ts.iter()),
                Type::Reference(ty) => stack.push(ty),
                Type::Slice(ty) => stack.push(ty),
                Type::StructRef { args, .. } => stack.extend(args.iter()),
                _ => {},
            }
        }

        false
    }

    pub fn resolve(&self, t: &Type) -> Type {
        self.ctx.substitute(t)
    }

    pub fn get_substitution(&self, id: InferId) -> Option<Type> {
        self.ctx.substitutions.get(id).and_then(|t| t.clone())
    }
}

/// Constraint queued by the callable dispatcher's generic-inference pass.
#[derive(Debug, Clone)]
pub enum Constraint {
    Equal(Type, Type),
    SubType(Type, Type),
    Implements(Type, DefId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unify_concrete_primitives() {
        let mut inf = TypeInference::new();
        assert!(inf.unify(&Type::I64, &Type::I64).is_ok());
        assert!(inf.unify(&Type::I64, &Type::BOOL).is_err());
    }

    #[test]
    fn unify_binds_infer_var() {
        let mut inf = TypeInference::new();
        let v = inf.new_infer_var();
        inf.unify(&v, &Type::I64).unwrap();
        assert_eq!(inf.resolve(&v), Type::I64);
    }

    #[test]
    fn unify_detects_occurs_check() {
        let mut inf = TypeInference::new();
        let v = inf.new_infer_var();
        let InferId(raw) = match &v {
            Type::Infer(id) => *id,
            _ => unreachable!(),
        };
        let self_ref = Type::Slice(Box::new(Type::Infer(InferId(raw))));
        assert!(matches!(
            inf.unify(&v, &self_ref),
            Err(TypeError::OccursCheck(_, _))
        ));
    }

    #[test]
    fn solve_drains_constraint_queue() {
        let mut inf = TypeInference::new();
        let v = inf.new_infer_var();
        inf.add_constraint(Constraint::Equal(v.clone(), Type::I64));
        let ctx = inf.solve().unwrap();
        assert_eq!(ctx.substitute(&v), Type::I64);
    }

    #[test]
    fn unify_function_signatures() {
        let mut inf = TypeInference::new();
        let f1 = Type::Function(FunctionSig {
            params: vec![Type::I64],
            ret: Box::new(Type::BOOL),
            generics: vec![],
            variadic: false,
        });
        let f2 = f1.clone();
        assert!(inf.unify(&f1, &f2).is_ok());
    }
}
