//! Tokens and source positions.

use std::fmt;

/// A half-open span on a single source line. Lines and columns are
/// zero-based; `col_end` is one past the last column of the lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub line: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl Loc {
    pub fn new(line: usize, col_start: usize, col_end: usize) -> Self {
        Loc {
            line,
            col_start,
            col_end,
        }
    }

    /// Character width of the span.
    pub fn len(&self) -> usize {
        self.col_end - self.col_start
    }

    pub fn is_empty(&self) -> bool {
        self.col_start == self.col_end
    }

    /// The same position with zero width. AST nodes anchor themselves with
    /// zero-width locations so diagnostics point at a position rather than
    /// underline a whole subtree.
    pub fn zero_width(&self) -> Self {
        Loc {
            line: self.line,
            col_start: self.col_start,
            col_end: self.col_start,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A lexeme no rule matched. The offending text is carried in the token
    /// so later stages can still display it.
    Error,
    Eof,

    Ident,
    IntLit,
    FloatLit,

    True,
    False,
    Let,
    Rec,
    In,
    If,
    Then,
    Else,
    Fun,
    Fix,
    Type,
    Match,
    With,

    Equals,
    NotEquals,
    Not,
    Lt,
    Gt,
    Leq,
    Geq,
    And,
    Or,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,

    LParen,
    RParen,
    LBrace,
    RBrace,
    Bar,
    Comma,
    Semicolon,
    Arrow,
    Colon,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spelling = match self {
            TokenKind::Error => "error",
            TokenKind::Eof => "eof",
            TokenKind::Ident => "ident",
            TokenKind::IntLit => "int_lit",
            TokenKind::FloatLit => "float_lit",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Let => "let",
            TokenKind::Rec => "rec",
            TokenKind::In => "in",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Else => "else",
            TokenKind::Fun => "fun",
            TokenKind::Fix => "fix",
            TokenKind::Type => "type",
            TokenKind::Match => "match",
            TokenKind::With => "with",
            TokenKind::Equals => "=",
            TokenKind::NotEquals => "!=",
            TokenKind::Not => "!",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Leq => "<=",
            TokenKind::Geq => ">=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Mul => "*",
            TokenKind::Div => "/",
            TokenKind::Mod => "%",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Bar => "|",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Arrow => "->",
            TokenKind::Colon => ":",
        };
        f.write_str(spelling)
    }
}

/// One token. `text` borrows from the source and is only populated for the
/// kinds that carry a payload (identifiers, literals, and error lexemes);
/// every other kind leaves it empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'s> {
    pub loc: Loc,
    pub kind: TokenKind,
    pub text: &'s str,
}

impl<'s> Token<'s> {
    pub fn new(loc: Loc, kind: TokenKind, text: &'s str) -> Self {
        Token { loc, kind, text }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}({})", self.kind, self.text)
        }
    }
}
