//! Hand-written lexer.
//!
//! Scans line by line, tracking nested `(* ... *)` comments across lines with
//! an explicit stack so an unterminated comment is reported at its opening
//! delimiter. The lexer is total: every input produces a token stream ending
//! in [`TokenKind::Eof`], with unrecognized characters turned into
//! [`TokenKind::Error`] tokens and reported to the sink.

use tracing::debug;

use crate::source::SourceFile;
use crate::token::{Loc, Token, TokenKind};

/// Two-character operators must come before their single-character prefixes
/// so longest-match wins.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("!=", TokenKind::NotEquals),
    ("<=", TokenKind::Leq),
    (">=", TokenKind::Geq),
    ("->", TokenKind::Arrow),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
    ("=", TokenKind::Equals),
    ("!", TokenKind::Not),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Mul),
    ("/", TokenKind::Div),
    ("%", TokenKind::Mod),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("|", TokenKind::Bar),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
    (":", TokenKind::Colon),
];

fn keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "let" => TokenKind::Let,
        "rec" => TokenKind::Rec,
        "in" => TokenKind::In,
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "else" => TokenKind::Else,
        "fun" => TokenKind::Fun,
        "fix" => TokenKind::Fix,
        "type" => TokenKind::Type,
        "match" => TokenKind::Match,
        "with" => TokenKind::With,
        _ => return None,
    };
    Some(kind)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '\'' || c.is_ascii_alphanumeric()
}

/// Byte length of a float literal at the start of `rest`, or `None` if the
/// text does not form a complete float. The fractional digits may be empty
/// (`1.` is a float) but a started exponent needs at least one digit or the
/// whole match is rejected and the caller falls back to an int literal.
fn float_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == 0 || i >= bytes.len() || bytes[i] != b'.' {
        return None;
    }
    i += 1;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j == exp_start {
            return None;
        }
        i = j;
    }
    Some(i)
}

pub struct Lexer<'s> {
    source: &'s SourceFile,
    line: usize,
    /// Column (in characters) within the current line.
    col: usize,
    /// Byte offset within the current line; kept alongside `col` so slicing
    /// stays cheap while columns stay caret-accurate.
    byte: usize,
    /// Locations of currently open `(*` delimiters.
    comment_stack: Vec<Loc>,
    lexed: bool,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s SourceFile) -> Self {
        Lexer {
            source,
            line: 0,
            col: 0,
            byte: 0,
            comment_stack: Vec::new(),
            lexed: false,
        }
    }

    /// Lexes the whole input. Single use per lexer.
    ///
    /// # Panics
    ///
    /// Panics if called twice on the same lexer.
    pub fn tokenize(&mut self) -> Vec<Token<'s>> {
        assert!(!self.lexed, "a lexer tokenizes its input exactly once");
        self.lexed = true;

        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            if self.at_end() {
                break;
            }
            tokens.push(self.next_token());
        }
        for loc in self.comment_stack.drain(..) {
            self.source
                .report_error(loc.line, loc.col_start, loc.len(), "unterminated comment");
        }

        let line = self.source.line_count() - 1;
        let col = self.source.line(line).chars().count();
        tokens.push(Token::new(Loc::new(line, col, col), TokenKind::Eof, ""));
        debug!(tokens = tokens.len(), "lexing finished");
        tokens
    }

    fn rest(&self) -> &'s str {
        &self.source.line(self.line)[self.byte..]
    }

    fn at_line_end(&self) -> bool {
        self.byte >= self.source.line(self.line).len()
    }

    fn at_end(&self) -> bool {
        self.line + 1 >= self.source.line_count() && self.at_line_end()
    }

    /// Consumes `n_bytes` from the current line, keeping the character
    /// column in sync.
    fn advance(&mut self, n_bytes: usize) {
        let consumed = &self.source.line(self.line)[self.byte..self.byte + n_bytes];
        self.byte += n_bytes;
        self.col += consumed.chars().count();
    }

    fn try_consume(&mut self, pat: &str) -> bool {
        if self.rest().starts_with(pat) {
            self.advance(pat.len());
            true
        } else {
            false
        }
    }

    /// Skips whitespace, newlines, and comments. Returns positioned at the
    /// next token start or at the end of input.
    fn skip_trivia(&mut self) {
        loop {
            if self.at_line_end() {
                if self.line + 1 >= self.source.line_count() {
                    return;
                }
                self.line += 1;
                self.col = 0;
                self.byte = 0;
                continue;
            }

            if !self.comment_stack.is_empty() {
                let start = Loc::new(self.line, self.col, self.col + 2);
                if self.try_consume("(*") {
                    self.comment_stack.push(start);
                } else if self.try_consume("*)") {
                    self.comment_stack.pop();
                } else {
                    let width = self
                        .rest()
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(1);
                    self.advance(width);
                }
                continue;
            }

            let rest = self.rest();
            let c = match rest.chars().next() {
                Some(c) => c,
                None => continue,
            };
            if c.is_whitespace() {
                self.advance(c.len_utf8());
                continue;
            }
            if rest.starts_with("(*") {
                let start = Loc::new(self.line, self.col, self.col + 2);
                self.advance(2);
                self.comment_stack.push(start);
                continue;
            }
            if rest.starts_with("*)") {
                self.source.report_error(
                    self.line,
                    self.col,
                    2,
                    "expected comment before '*)' token",
                );
                self.advance(2);
                continue;
            }
            return;
        }
    }

    /// Lexes one token. Caller guarantees the cursor sits on a non-trivia
    /// character.
    fn next_token(&mut self) -> Token<'s> {
        let line = self.line;
        let col = self.col;
        let rest = self.rest();
        let first = rest
            .chars()
            .next()
            .expect("next_token called at end of line");

        if is_ident_start(first) {
            let len = rest
                .find(|c: char| !is_ident_continue(c))
                .unwrap_or(rest.len());
            let text = &rest[..len];
            self.advance(len);
            let loc = Loc::new(line, col, self.col);
            return match keyword(text) {
                Some(kind) => Token::new(loc, kind, ""),
                None => Token::new(loc, TokenKind::Ident, text),
            };
        }

        if first.is_ascii_digit() {
            if let Some(len) = float_len(rest) {
                let text = &rest[..len];
                self.advance(len);
                return Token::new(Loc::new(line, col, self.col), TokenKind::FloatLit, text);
            }
            let len = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let text = &rest[..len];
            self.advance(len);
            return Token::new(Loc::new(line, col, self.col), TokenKind::IntLit, text);
        }

        for (pat, kind) in OPERATORS {
            if rest.starts_with(pat) {
                self.advance(pat.len());
                return Token::new(Loc::new(line, col, self.col), *kind, "");
            }
        }

        let len = first.len_utf8();
        let text = &rest[..len];
        self.advance(len);
        let loc = Loc::new(line, col, self.col);
        self.source
            .report_error(line, col, loc.len(), format!("stray '{first}' in program"));
        Token::new(loc, TokenKind::Error, text)
    }
}
