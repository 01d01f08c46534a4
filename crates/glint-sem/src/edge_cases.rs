//! Cross-cutting edge cases for glint-sem that don't belong to one single
//! component module: labeled-loop resolution, const/static declaration
//! collection, and generic-instantiation unification failures.

#[cfg(test)]
mod tests {
    use crate::hir::LabelId;
    use crate::scope::{RibKind, SymbolTable};
    use crate::types::{FunctionSig, Prim, Type};
    use crate::infer::TypeInference;
    use crate::const_eval::{fold_binary, ConstEvalError};
    use crate::hir::BinOp;
    use crate::{Declaration, SemanticAnalyzer};
    use glint_par::ast;
    use glint_util::{DefIdGenerator, Handler, Span, Symbol};

    #[test]
    fn enclosing_loop_finds_innermost_unlabeled() {
        let mut table = SymbolTable::new();
        table.enter_scope(RibKind::Loop(None));
        table.enter_scope(RibKind::Block);
        assert!(table.enclosing_loop(None).is_some());
    }

    #[test]
    fn enclosing_loop_matches_requested_label() {
        let mut table = SymbolTable::new();
        let outer = LabelId(0);
        let inner = LabelId(1);
        let outer_rib = table.enter_scope(RibKind::Loop(Some(outer)));
        table.enter_scope(RibKind::Loop(Some(inner)));

        let found = table.enclosing_loop(Some(outer)).unwrap();
        assert_eq!(found, outer_rib);
    }

    #[test]
    fn enclosing_loop_none_outside_any_loop() {
        let mut table = SymbolTable::new();
        table.enter_scope(RibKind::Block);
        assert!(table.enclosing_loop(None).is_none());
    }

    fn const_item(name: &str) -> ast::ConstItem {
        ast::ConstItem {
            name: Symbol::intern(name),
            ty: ast::Type::Path(ast::Path { segments: vec![ast::PathSegment { ident: Symbol::intern("i32"), args: None }] }),
            value: ast::Expr::Literal(ast::Literal::Int(1)),
            visibility: ast::Visibility::Private,
            span: Span::DUMMY,
        }
    }

    fn static_item(name: &str, mutable: bool) -> ast::StaticItem {
        ast::StaticItem {
            name: Symbol::intern(name),
            ty: ast::Type::Path(ast::Path { segments: vec![ast::PathSegment { ident: Symbol::intern("i32"), args: None }] }),
            value: ast::Expr::Literal(ast::Literal::Int(1)),
            mutable,
            visibility: ast::Visibility::Private,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn const_item_collects_as_immutable_constant() {
        let def_ids = DefIdGenerator::new();
        let mut handler = Handler::new();
        let mut analyzer = SemanticAnalyzer::new(&def_ids, &mut handler);

        analyzer.collect_declarations(&[ast::Item::Const(const_item("LIMIT"))]);
        assert!(!analyzer.has_errors());

        let decl = analyzer.symbols.resolve(Symbol::intern("LIMIT")).unwrap();
        let Declaration::Variable(v) = decl else { panic!("expected a variable declaration") };
        assert!(v.is_const);
        assert!(!v.is_mutable);
        assert_eq!(v.declared_ty, Some(Type::Primitive(Prim::I32)));
    }

    #[test]
    fn static_mut_item_collects_as_mutable_non_constant() {
        let def_ids = DefIdGenerator::new();
        let mut handler = Handler::new();
        let mut analyzer = SemanticAnalyzer::new(&def_ids, &mut handler);

        analyzer.collect_declarations(&[ast::Item::Static(static_item("COUNTER", true))]);
        assert!(!analyzer.has_errors());

        let decl = analyzer.symbols.resolve(Symbol::intern("COUNTER")).unwrap();
        let Declaration::Variable(v) = decl else { panic!("expected a variable declaration") };
        assert!(!v.is_const);
        assert!(v.is_mutable);
    }

    #[test]
    fn duplicate_const_name_is_reported() {
        let def_ids = DefIdGenerator::new();
        let mut handler = Handler::new();
        let mut analyzer = SemanticAnalyzer::new(&def_ids, &mut handler);

        analyzer.collect_declarations(&[
            ast::Item::Const(const_item("LIMIT")),
            ast::Item::Const(const_item("LIMIT")),
        ]);
        assert!(analyzer.has_errors());
    }

    #[test]
    fn unify_tuples_of_different_length_fails() {
        let mut inf = TypeInference::new();
        let a = Type::Tuple(vec![Type::I64]);
        let b = Type::Tuple(vec![Type::I64, Type::BOOL]);
        assert!(inf.unify(&a, &b).is_err());
    }

    #[test]
    fn unify_function_signatures_with_mismatched_arity_fails() {
        let mut inf = TypeInference::new();
        let f1 = Type::Function(FunctionSig { params: vec![Type::I64], ret: Box::new(Type::VOID), generics: vec![], variadic: false });
        let f2 = Type::Function(FunctionSig { params: vec![Type::I64, Type::I64], ret: Box::new(Type::VOID), generics: vec![], variadic: false });
        assert!(inf.unify(&f1, &f2).is_err());
    }

    #[test]
    fn fold_shr_by_negative_amount_overflows() {
        use crate::hir::ConstValue;
        let result = fold_binary(BinOp::Shr, &ConstValue::Int(8), &ConstValue::Int(-1));
        assert_eq!(result, Err(ConstEvalError::Overflow));
    }
}
