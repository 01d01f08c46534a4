//! Integration tests exercising the lex -> parse -> analyze pipeline
//! through `Session`, the way a caller outside the crate would.

use glint_driver::{Config, EmitType, Session};

#[test]
fn test_compile_if_else_through_analysis() {
    let source_code = r#"
        fn main() {
            if true {
                let x = 1;
            }
        }
    "#;

    let mut config = Config::default();
    config.emit = EmitType::Hir;

    let mut session = Session::new(config);
    session.sources.add_file("logic.glint", source_code);

    let results = session.compile().expect("well-formed program analyzes cleanly");

    assert_eq!(results.declarations.len(), 1);
    let (_, decls) = &results.declarations[0];
    assert_eq!(decls.len(), 1, "one top-level `main` function");
}

#[test]
fn test_compile_multiple_functions() {
    let source_code = r#"
        fn add(a: i32, b: i32) -> i32 { a + b }
        fn main() {
            let sum = add(1, 2);
        }
    "#;

    let mut session = Session::new(Config::default());
    session.sources.add_file("math.glint", source_code);

    let results = session.compile().expect("two independent functions analyze cleanly");
    let (_, decls) = &results.declarations[0];
    assert_eq!(decls.len(), 2);
}

#[test]
fn test_ast_emission_preserves_item_count() {
    let mut config = Config::default();
    config.emit = EmitType::Ast;

    let mut session = Session::new(config);
    session
        .sources
        .add_file("items.glint", "fn a() {}\nfn b() {}\nstruct S { x: i32 }");

    let results = session.compile().expect("parses without error");
    let (_, ast) = &results.asts[0];
    assert_eq!(ast.len(), 3);
}
