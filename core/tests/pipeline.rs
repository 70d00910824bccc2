//! End-to-end runs of the whole pipeline: lex, parse, check, evaluate.

use bumpalo::Bump;
use indoc::indoc;
use pretty_assertions::assert_eq;

use lilt_core::analyzer::Analyzer;
use lilt_core::ast::Expr;
use lilt_core::evaluator::Evaluator;
use lilt_core::lexer::Lexer;
use lilt_core::parser::Parser;
use lilt_core::source::SourceFile;
use lilt_core::token::TokenKind;
use lilt_core::types::TypeManager;

/// Runs the full pipeline. Returns `(type, value)` renderings on success or
/// the emitted diagnostics on any failure.
fn run(text: &str) -> Result<(String, String), String> {
    let arena = Bump::new();
    let source = SourceFile::from_text(text, "");
    let tokens = Lexer::new(&source).tokenize();
    let types = TypeManager::new(&arena);
    let parsed = Parser::new(&source, tokens, &arena, types).parse();
    let result = parsed.and_then(|expr| {
        let ty = Analyzer::new(&source, types).check(expr)?;
        let value = Evaluator::new(&source, &arena).eval(expr)?;
        Some((ty.to_string(), value.to_string()))
    });
    match result {
        Some(ok) if !source.has_errors() => Ok(ok),
        _ => {
            let mut out = Vec::new();
            source.emit(&mut out).unwrap();
            Err(String::from_utf8(out).unwrap())
        }
    }
}

#[test]
fn simple_addition() {
    // check the token stream explicitly once, then the rest of the pipeline
    let source = SourceFile::from_text("1 + 2", "");
    let tokens = Lexer::new(&source).tokenize();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        [
            TokenKind::IntLit,
            TokenKind::Plus,
            TokenKind::IntLit,
            TokenKind::Eof
        ]
    );

    assert_eq!(run("1 + 2"), Ok(("int".to_owned(), "3".to_owned())));
}

#[test]
fn let_binding_evaluates() {
    assert_eq!(
        run("let x = 5 in x + 1"),
        Ok(("int".to_owned(), "6".to_owned()))
    );
}

#[test]
fn non_bool_condition_is_a_type_error() {
    let out = run("if 1 then 2 else 3").unwrap_err();
    assert_eq!(
        out,
        indoc! {"
            1:3: error: expected test expression of bool type
             if 1 then 2 else 3
                ^
        "}
    );
}

#[test]
fn unannotated_lambda_fails_checking_but_still_evaluates() {
    let text = "(fun x -> x) 7";
    let out = run(text).unwrap_err();
    assert!(out.contains("type annotation is necessary to make function well-typed"));

    // evaluation-only pipeline, checker skipped
    let arena = Bump::new();
    let source = SourceFile::from_text(text, "");
    let tokens = Lexer::new(&source).tokenize();
    let types = TypeManager::new(&arena);
    let expr = Parser::new(&source, tokens, &arena, types).parse().unwrap();
    let value = Evaluator::new(&source, &arena).eval(expr).unwrap();
    assert!(!source.has_errors());
    assert_eq!(value.to_string(), "7");
}

#[test]
fn annotated_lambda_synthesizes_and_applies() {
    let arena = Bump::new();
    let source = SourceFile::from_text("fun x -> x + 1 : int -> int", "");
    let tokens = Lexer::new(&source).tokenize();
    let types = TypeManager::new(&arena);
    let expr = Parser::new(&source, tokens, &arena, types).parse().unwrap();
    let ty = Analyzer::new(&source, types).check(expr).unwrap();
    assert_eq!(ty.to_string(), "int -> int");

    assert_eq!(
        run("(fun x -> x + 1 : int -> int) 4"),
        Ok(("int".to_owned(), "5".to_owned()))
    );
}

#[test]
fn nested_unterminated_comment_reports_once_at_the_outer_opening() {
    let out = run("(* (* *)").unwrap_err();
    assert_eq!(out.matches("unterminated comment").count(), 1);
    assert!(out.starts_with("1:0: error: unterminated comment"));
}

#[test]
fn factorial_end_to_end() {
    assert_eq!(
        run("let rec (fact : int -> int) = fun n -> if n = 0 then 1 else n * fact (n - 1) \
             in fact 10"),
        Ok(("int".to_owned(), "3628800".to_owned()))
    );
}

#[test]
fn higher_order_functions() {
    assert_eq!(
        run("let (twice : (int -> int) -> int -> int) = fun f -> fun x -> f (f x) \
             in twice (fun y -> y * 3) 2"),
        Ok(("int".to_owned(), "18".to_owned()))
    );
}

#[test]
fn records_check_and_evaluate() {
    assert_eq!(
        run("type point = { x : int, y : int }; { x = 2 + 3, y = 0 }"),
        Ok(("point".to_owned(), "{ x = 5, y = 0 }".to_owned()))
    );
}

#[test]
fn comments_are_invisible_to_the_pipeline() {
    assert_eq!(
        run("1 (* one (* nested *) *) + (* two *) 2"),
        Ok(("int".to_owned(), "3".to_owned()))
    );
}

#[test]
fn diagnostics_carry_the_file_path() {
    let source = SourceFile::from_text("$", "prog.lilt");
    let _ = Lexer::new(&source).tokenize();
    let mut out = Vec::new();
    source.emit(&mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        indoc! {"
            prog.lilt:1:0: error: stray '$' in program
             $
             ^
        "}
    );
}

/// Reparsing the printed form of a parse yields the same printed form, so
/// printing is a fixed point and parsing is deterministic on its output.
#[test]
fn display_round_trips_through_the_parser() {
    let programs = [
        "let x = 1 in x + x * 2",
        "fun (x : int) -> if x < 0 then -x else x",
        "let rec (f : int -> int) = fun n -> if n = 0 then 0 else f (n - 1) in f 3",
        "(1, (2, true))",
    ];
    for text in programs {
        let arena = Bump::new();
        let source = SourceFile::from_text(text, "");
        let tokens = Lexer::new(&source).tokenize();
        let types = TypeManager::new(&arena);
        let first = Parser::new(&source, tokens, &arena, types)
            .parse()
            .unwrap()
            .to_string();

        let arena2 = Bump::new();
        let source2 = SourceFile::from_text(&first, "");
        let tokens2 = Lexer::new(&source2).tokenize();
        let types2 = TypeManager::new(&arena2);
        let second = Parser::new(&source2, tokens2, &arena2, types2)
            .parse()
            .unwrap()
            .to_string();
        assert_eq!(first, second, "for {text:?}");
        assert!(!source2.has_errors(), "for {text:?}");
    }
}

/// `copy` produces a structurally identical tree.
#[test]
fn copy_preserves_structure() {
    let arena = Bump::new();
    let source = SourceFile::from_text("let x = 1 in fun (y : int) -> x + y", "");
    let tokens = Lexer::new(&source).tokenize();
    let types = TypeManager::new(&arena);
    let expr = Parser::new(&source, tokens, &arena, types).parse().unwrap();
    let copied: &Expr = expr.copy(&arena);
    assert_eq!(expr.to_string(), copied.to_string());
    assert!(!std::ptr::eq(expr, copied));
}
