//! Source buffer plus the diagnostics sink every pipeline stage reports into.
//!
//! Errors are accumulated during a run and rendered in one batch by
//! [`SourceFile::emit`], sorted by position with exact duplicates removed.
//! Each rendered diagnostic carries the offending source line and a caret
//! marker underneath the offending span.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

/// One recorded error. Positions are zero-based internally; `emit` renders
/// lines one-based and columns zero-based, matching editor conventions used
/// by the caret display.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Diagnostic {
    pub line: usize,
    pub col: usize,
    /// Width of the offending span. A length of zero still renders a single
    /// caret with no tilde tail.
    pub len: usize,
    pub message: String,
}

/// An in-memory source file: the split lines of the input plus the sink of
/// diagnostics reported against it. Stages hold `&SourceFile` and report
/// through interior mutability, so a shared reference is all a lexer, parser,
/// analyzer, and evaluator ever need.
#[derive(Debug)]
pub struct SourceFile {
    path: String,
    lines: Vec<String>,
    errors: RefCell<Vec<Diagnostic>>,
}

impl SourceFile {
    /// Builds a source file from an already-loaded string. An empty input
    /// still yields one (empty) line so every position, including the
    /// end-of-file position, lands on a real line.
    pub fn from_text(text: &str, path: impl Into<String>) -> Self {
        let mut lines: Vec<String> = text.lines().map(str::to_owned).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        SourceFile {
            path: path.into(),
            lines,
            errors: RefCell::new(Vec::new()),
        }
    }

    /// Reads a source file from any buffered reader.
    pub fn from_reader(reader: impl BufRead, path: impl Into<String>) -> io::Result<Self> {
        let mut lines = reader.lines().collect::<io::Result<Vec<_>>>()?;
        if lines.is_empty() {
            lines.push(String::new());
        }
        Ok(SourceFile {
            path: path.into(),
            lines,
            errors: RefCell::new(Vec::new()),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns one line of the input, without its terminator.
    ///
    /// # Panics
    ///
    /// Panics if `line` is out of range; positions handed to the sink must
    /// come from tokens of this file.
    pub fn line(&self, line: usize) -> &str {
        &self.lines[line]
    }

    /// Records an error at the given position.
    pub fn report_error(&self, line: usize, col: usize, len: usize, message: impl Into<String>) {
        assert!(line < self.lines.len(), "diagnostic line out of range");
        self.errors.borrow_mut().push(Diagnostic {
            line,
            col,
            len,
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.borrow().is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.borrow().len()
    }

    /// Renders every accumulated diagnostic, sorted by (line, col, len,
    /// message) with exact duplicates collapsed. Each diagnostic prints as
    ///
    /// ```text
    /// path:3:7: error: unbound variable 'x'
    ///  let y = x in y
    ///         ^
    /// ```
    ///
    /// with `len - 1` tildes following the caret for wider spans. The path
    /// prefix is omitted when the file has an empty path (e.g. REPL input).
    pub fn emit(&self, out: &mut impl Write) -> io::Result<()> {
        let mut errors = self.errors.borrow_mut();
        errors.sort();
        errors.dedup();
        for err in errors.iter() {
            if self.path.is_empty() {
                writeln!(out, "{}:{}: error: {}", err.line + 1, err.col, err.message)?;
            } else {
                writeln!(
                    out,
                    "{}:{}:{}: error: {}",
                    self.path,
                    err.line + 1,
                    err.col,
                    err.message
                )?;
            }
            writeln!(out, " {}", self.lines[err.line])?;
            let tildes = if err.len > 0 { err.len - 1 } else { 0 };
            writeln!(out, " {}^{}", " ".repeat(err.col), "~".repeat(tildes))?;
        }
        Ok(())
    }
}
