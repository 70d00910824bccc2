use bumpalo::Bump;
use pretty_assertions::assert_eq;

use crate::analyzer::Analyzer;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::source::SourceFile;
use crate::types::TypeManager;

/// Parses and checks `text`, returning the synthesized type's display form.
fn synth_ok(text: &str) -> String {
    let arena = Bump::new();
    let source = SourceFile::from_text(text, "");
    let tokens = Lexer::new(&source).tokenize();
    let types = TypeManager::new(&arena);
    let expr = Parser::new(&source, tokens, &arena, types)
        .parse()
        .unwrap_or_else(|| panic!("parse failed for {text:?}"));
    let ty = Analyzer::new(&source, types)
        .check(expr)
        .unwrap_or_else(|| panic!("type checking failed for {text:?}"));
    assert!(!source.has_errors(), "unexpected errors for {text:?}");
    ty.to_string()
}

/// Parses and checks `text` expecting failure; returns the diagnostics.
fn synth_err(text: &str) -> String {
    let arena = Bump::new();
    let source = SourceFile::from_text(text, "");
    let tokens = Lexer::new(&source).tokenize();
    let types = TypeManager::new(&arena);
    let expr = Parser::new(&source, tokens, &arena, types)
        .parse()
        .unwrap_or_else(|| panic!("parse failed for {text:?}"));
    let ty = Analyzer::new(&source, types).check(expr);
    assert!(ty.is_none(), "expected type checking to fail for {text:?}");
    let mut out = Vec::new();
    source.emit(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn literals() {
    assert_eq!(synth_ok("1"), "int");
    assert_eq!(synth_ok("1.5"), "float");
    assert_eq!(synth_ok("true"), "bool");
    assert_eq!(synth_ok("()"), "unit");
}

#[test]
fn arithmetic_types() {
    assert_eq!(synth_ok("1 + 2 * 3"), "int");
    assert_eq!(synth_ok("1.5 / 0.5"), "float");
    assert_eq!(synth_ok("-3"), "int");
}

#[test]
fn no_mixed_arithmetic() {
    let out = synth_err("1 + 2.5");
    assert!(out.contains(
        "left expression (of int type) does not define operation + \
         with right expression (of float type)"
    ));
}

#[test]
fn comparisons_synthesize_bool() {
    for text in ["1 = 2", "1 != 2", "1 < 2", "1 > 2", "1 <= 2", "1.5 >= 0.5"] {
        assert_eq!(synth_ok(text), "bool", "for {text:?}");
    }
    assert_eq!(synth_ok("true != false"), "bool");
}

#[test]
fn bool_has_no_ordering() {
    let out = synth_err("true < false");
    assert!(out.contains("does not define operation <"));
    // <= derives from both < and =, so it fails too
    assert!(synth_err("true <= false").contains("does not define operation <="));
}

#[test]
fn logical_operators() {
    assert_eq!(synth_ok("true && false || true"), "bool");
    assert!(synth_err("1 && true").contains("does not define operation &&"));
}

#[test]
fn let_bindings() {
    assert_eq!(synth_ok("let x = 1 in x + x"), "int");
    assert_eq!(synth_ok("let (x : int) = 1 in x"), "int");
    assert_eq!(synth_ok("let x = 1 in let x = true in x"), "bool");
}

#[test]
fn annotated_let_mismatch() {
    let out = synth_err("let (x : bool) = 1 in x");
    assert!(out.contains("expected expression of type bool"));
}

#[test]
fn unbound_variable() {
    assert_eq!(
        synth_err("let y = x in y"),
        "1:8: error: unbound variable 'x'\n let y = x in y\n         ^\n"
    );
}

#[test]
fn if_expressions() {
    assert_eq!(synth_ok("if true then 1 else 2"), "int");
    let out = synth_err("if 1 then 2 else 3");
    assert!(out.contains("expected test expression of bool type"));
    let out = synth_err("if true then 1 else false");
    assert!(out.contains(
        "both branches must synthesize same type; true branch synthesizes int \
         and false branch synthesizes bool"
    ));
}

#[test]
fn annotated_lambda_synthesizes() {
    assert_eq!(synth_ok("fun (x : int) -> x + 1"), "int -> int");
    assert_eq!(
        synth_ok("fun (f : int -> int) -> fun (x : int) -> f (f x)"),
        "(int -> int) -> int -> int"
    );
}

#[test]
fn unannotated_lambda_cannot_synthesize() {
    let out = synth_err("fun x -> x");
    assert!(out.contains("type annotation is necessary to make function well-typed"));
}

#[test]
fn unannotated_lambda_analyzes_against_arrow() {
    assert_eq!(
        synth_ok("let (f : int -> int) = fun x -> x + 1 in f 3"),
        "int"
    );
    assert_eq!(
        synth_ok("let (f : int -> int -> int) = fun a -> fun b -> a + b in f 1 2"),
        "int"
    );
}

#[test]
fn trailing_annotation_types_the_lambda() {
    assert_eq!(synth_ok("fun x -> x + 1 : int -> int"), "int -> int");
}

#[test]
fn annotation_checks_the_expression() {
    assert_eq!(synth_ok("(1 : int)"), "int");
    let out = synth_err("(1 : bool)");
    assert!(out.contains("expression does not analyze against annotated type bool"));
}

#[test]
fn application() {
    assert_eq!(synth_ok("(fun (x : int) -> x) 5"), "int");
    let out = synth_err("1 2");
    assert!(out.contains(
        "expected expression of arrow type in function application; got type int"
    ));
    let out = synth_err("(fun (x : int) -> x) true");
    assert!(out.contains("expected expression of type int as function argument"));
}

#[test]
fn fix_requires_annotation_to_synthesize() {
    assert_eq!(
        synth_ok("fix (f : int -> int) -> fun n -> if n = 0 then 1 else n * f (n - 1)"),
        "int -> int"
    );
    let out = synth_err("fix f -> fun n -> f n");
    assert!(out.contains("type annotation is necessary to make fixpoint well-typed"));
}

#[test]
fn fix_analyzes_against_expectation() {
    assert_eq!(
        synth_ok("let (f : int -> int) = fix g -> fun n -> if n < 1 then 0 else g (n - 1) in f 5"),
        "int"
    );
}

#[test]
fn let_rec_with_annotated_binder() {
    assert_eq!(
        synth_ok(
            "let rec (f : int -> int) = fun n -> if n = 0 then 1 else n * f (n - 1) in f 5"
        ),
        "int"
    );
}

#[test]
fn tuples() {
    assert_eq!(synth_ok("(1, true)"), "(int * bool)");
    assert_eq!(synth_ok("let (p : int * bool) = (1, true) in p"), "(int * bool)");
    // analysis distributes into elements, so lambdas work inside tuples
    assert_eq!(
        synth_ok("let (p : int * (int -> int)) = (1, fun x -> x) in p"),
        "(int * int -> int)"
    );
    let out = synth_err("let (p : int * bool) = (1, 2) in p");
    assert!(out.contains("expected expression of type (int * bool)"));
}

#[test]
fn records() {
    assert_eq!(
        synth_ok("type point = { x : int, y : int }; { x = 1, y = 2 }"),
        "point"
    );
    let out = synth_err("type point = { x : int, y : int }; { x = 1, y = true }");
    assert!(out.contains("expected expression of type int"));
}
