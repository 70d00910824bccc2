//! Core of the lilt expression language: lexer, Pratt parser, bidirectional
//! type checker, and a tree-walking evaluator, all reporting into a shared
//! caret-rendering diagnostics sink.
//!
//! The stages share one [`bumpalo`] arena: tokens borrow the source file,
//! while the AST, types, and runtime values borrow the arena, so a whole
//! pipeline run is a handful of allocations torn down at once.
//!
//! ```
//! use bumpalo::Bump;
//! use lilt_core::analyzer::Analyzer;
//! use lilt_core::evaluator::Evaluator;
//! use lilt_core::lexer::Lexer;
//! use lilt_core::parser::Parser;
//! use lilt_core::source::SourceFile;
//! use lilt_core::types::TypeManager;
//!
//! let arena = Bump::new();
//! let source = SourceFile::from_text("let x = 20 in 2 * x + 2", "");
//! let tokens = Lexer::new(&source).tokenize();
//! let types = TypeManager::new(&arena);
//! let expr = Parser::new(&source, tokens, &arena, types).parse().unwrap();
//! let ty = Analyzer::new(&source, types).check(expr).unwrap();
//! let value = Evaluator::new(&source, &arena).eval(expr).unwrap();
//! assert_eq!(ty.to_string(), "int");
//! assert_eq!(value.to_string(), "42");
//! ```

pub mod analyzer;
pub mod ast;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod scope_stack;
pub mod source;
pub mod token;
pub mod types;
pub mod values;
