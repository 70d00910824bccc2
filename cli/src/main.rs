//! Command line driver for lilt.
//!
//! By default the whole pipeline runs: lex, parse, type check, evaluate,
//! printing the resulting value. Stage flags stop early and print that
//! stage's output instead; `--eval` skips the type checker and lets the
//! evaluator report type mismatches at runtime. Any diagnostic makes the
//! exit code 1.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bumpalo::Bump;
use clap::{ArgGroup, Parser as ArgParser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use lilt_core::analyzer::Analyzer;
use lilt_core::evaluator::Evaluator;
use lilt_core::lexer::Lexer;
use lilt_core::parser::Parser;
use lilt_core::source::SourceFile;
use lilt_core::types::TypeManager;

#[derive(ArgParser, Debug)]
#[command(name = "lilt", version, about = "Run programs in the lilt expression language")]
#[command(group(ArgGroup::new("stage").args(["lex", "parse", "type_check", "eval"])))]
struct Args {
    /// Program file to run; reads standard input when omitted.
    file: Option<PathBuf>,

    /// Stop after lexing and print the token stream.
    #[arg(long)]
    lex: bool,

    /// Stop after parsing and print the expression tree.
    #[arg(long)]
    parse: bool,

    /// Stop after type checking and print the program's type.
    #[arg(long = "type")]
    type_check: bool,

    /// Skip the type checker and evaluate directly.
    #[arg(long)]
    eval: bool,

    /// Interactive session: reads blocks terminated by a blank line and
    /// runs each through the full pipeline.
    #[arg(long, conflicts_with_all = ["file", "lex", "parse", "type_check", "eval"])]
    repl: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Lex,
    Parse,
    Type,
    Eval,
    Full,
}

impl Args {
    fn stage(&self) -> Stage {
        if self.lex {
            Stage::Lex
        } else if self.parse {
            Stage::Parse
        } else if self.type_check {
            Stage::Type
        } else if self.eval {
            Stage::Eval
        } else {
            Stage::Full
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("lilt: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    if args.repl {
        return repl();
    }
    let source = match &args.file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open {}", path.display()))?;
            SourceFile::from_reader(BufReader::new(file), path.display().to_string())?
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("cannot read standard input")?;
            SourceFile::from_text(&text, "")
        }
    };
    debug!(path = source.path(), stage = ?args.stage(), "running");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    Ok(run_source(&source, args.stage(), &mut out)?)
}

/// Runs one source through the requested pipeline prefix. Returns whether
/// the run was error free.
fn run_source(source: &SourceFile, stage: Stage, out: &mut impl Write) -> io::Result<bool> {
    let arena = Bump::new();
    let types = TypeManager::new(&arena);
    let tokens = Lexer::new(source).tokenize();
    if source.has_errors() {
        // fall through to emit
    } else if stage == Stage::Lex {
        for token in &tokens {
            writeln!(out, "{token}")?;
        }
    } else if let Some(expr) = Parser::new(source, tokens, &arena, types).parse() {
        if !source.has_errors() {
            match stage {
                Stage::Lex => unreachable!(),
                Stage::Parse => writeln!(out, "{expr}")?,
                Stage::Type => {
                    let checked = Analyzer::new(source, types).check(expr);
                    if let Some(ty) = checked
                        && !source.has_errors()
                    {
                        writeln!(out, "{ty}")?;
                    }
                }
                Stage::Eval => {
                    if let Some(value) = Evaluator::new(source, &arena).eval(expr) {
                        writeln!(out, "{value}")?;
                    }
                }
                Stage::Full => {
                    let checked = Analyzer::new(source, types).check(expr);
                    if checked.is_some() && !source.has_errors() {
                        if let Some(value) = Evaluator::new(source, &arena).eval(expr) {
                            writeln!(out, "{value}")?;
                        }
                    }
                }
            }
        }
    }
    source.emit(out)?;
    Ok(!source.has_errors())
}

/// Reads blank-line-separated blocks from standard input until EOF, running
/// each block as its own program.
fn repl() -> Result<bool> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut block = String::new();
    let mut all_ok = true;
    for line in stdin.lock().lines() {
        let line = line.context("cannot read standard input")?;
        if line.trim().is_empty() {
            all_ok &= run_block(&block, &mut out)?;
            out.flush()?;
            block.clear();
        } else {
            block.push_str(&line);
            block.push('\n');
        }
    }
    all_ok &= run_block(&block, &mut out)?;
    Ok(all_ok)
}

fn run_block(block: &str, out: &mut impl Write) -> Result<bool> {
    if block.trim().is_empty() {
        return Ok(true);
    }
    let source = SourceFile::from_text(block, "");
    Ok(run_source(&source, Stage::Full, out)?)
}
