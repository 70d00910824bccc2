use bumpalo::Bump;
use hashbrown::{HashMap, HashSet};
use tracing::debug;

use super::BindingPower;
use crate::ast::{BinOp, Binder, Expr, ExprKind, UnaryOp};
use crate::source::SourceFile;
use crate::token::{Token, TokenKind};
use crate::types::{Type, TypeManager};

fn binop_of(kind: TokenKind) -> Option<BinOp> {
    let op = match kind {
        TokenKind::Mul => BinOp::Mul,
        TokenKind::Div => BinOp::Div,
        TokenKind::Mod => BinOp::Mod,
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Equals => BinOp::Eq,
        TokenKind::NotEquals => BinOp::Neq,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::Leq => BinOp::Leq,
        TokenKind::Geq => BinOp::Geq,
        TokenKind::And => BinOp::And,
        TokenKind::Or => BinOp::Or,
        _ => return None,
    };
    Some(op)
}

fn bin_bp(op: BinOp) -> BindingPower {
    // Comparisons are left associative like arithmetic; `&&` and `||` are
    // right associative, with `&&` binding tighter.
    let (left, right) = match op {
        BinOp::Mul | BinOp::Div | BinOp::Mod => (50, 51),
        BinOp::Add | BinOp::Sub => (40, 41),
        BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Gt | BinOp::Leq | BinOp::Geq => (30, 31),
        BinOp::And => (21, 20),
        BinOp::Or => (11, 10),
    };
    BindingPower { left, right }
}

pub struct Parser<'a, 's> {
    source: &'s SourceFile,
    tokens: Vec<Token<'s>>,
    pos: usize,
    arena: &'a Bump,
    types: &'a TypeManager<'a>,
    /// Named types in scope: the built-in base types plus every leading
    /// `type` declaration.
    type_table: HashMap<&'a str, &'a Type<'a>>,
    /// Cleared while speculating on a function argument so a failed attempt
    /// leaves no trace in the sink.
    report_errors: bool,
}

impl<'a, 's> Parser<'a, 's> {
    pub fn new(
        source: &'s SourceFile,
        tokens: Vec<Token<'s>>,
        arena: &'a Bump,
        types: &'a TypeManager<'a>,
    ) -> Self {
        assert!(
            tokens.last().is_some_and(|t| t.kind == TokenKind::Eof),
            "token stream must end with eof"
        );
        let mut type_table = HashMap::new();
        type_table.insert(types.intern_str("int"), types.int());
        type_table.insert(types.intern_str("float"), types.float());
        type_table.insert(types.intern_str("bool"), types.bool());
        type_table.insert(types.intern_str("unit"), types.unit());
        Parser {
            source,
            tokens,
            pos: 0,
            arena,
            types,
            type_table,
            report_errors: true,
        }
    }

    /// Parses the whole input: leading type declarations, one expression,
    /// then end of input. Trailing junk is reported but the expression is
    /// still returned so later stages can run over what did parse.
    pub fn parse(mut self) -> Option<&'a Expr<'a>> {
        while self.peek().kind == TokenKind::Type {
            self.parse_type_decl()?;
        }
        let expr = self.parse_expr(0, true)?;
        if self.peek().kind != TokenKind::Eof {
            let front = *self.peek();
            self.error_at_token(&front, format!("expected token 'eof'; got '{front}'"));
        }
        debug!(ast = %expr, "parsing finished");
        Some(expr)
    }

    fn peek(&self) -> &Token<'s> {
        &self.tokens[self.pos]
    }

    /// Consumes and returns the front token. The final eof token is never
    /// consumed, so peeking stays in bounds.
    fn pop(&mut self) -> Token<'s> {
        let front = self.tokens[self.pos];
        if front.kind != TokenKind::Eof {
            self.pos += 1;
        }
        front
    }

    fn error_at_token(&self, token: &Token<'_>, message: String) {
        if self.report_errors {
            self.source.report_error(
                token.loc.line,
                token.loc.col_start,
                token.loc.len(),
                message,
            );
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Option<Token<'s>> {
        let front = *self.peek();
        if front.kind == kind {
            Some(self.pop())
        } else {
            self.error_at_token(&front, format!("expected token '{kind}'; got '{front}'"));
            None
        }
    }

    /// Tries to parse an expression without committing: on failure the
    /// cursor is rolled back and nothing reaches the error sink. Used for
    /// function application, which has no operator token announcing it.
    fn speculate_expr(&mut self, min_bp: u8) -> Option<&'a Expr<'a>> {
        let saved_pos = self.pos;
        let saved_report = self.report_errors;
        self.report_errors = false;
        let result = self.parse_expr(min_bp, true);
        self.report_errors = saved_report;
        if result.is_none() {
            self.pos = saved_pos;
        }
        result
    }

    fn parse_expr(&mut self, min_bp: u8, allow_ann: bool) -> Option<&'a Expr<'a>> {
        let mut lhs = self.parse_atom()?;
        loop {
            let front = *self.peek();
            if let Some(op) = binop_of(front.kind) {
                let bp = bin_bp(op);
                if bp.left < min_bp {
                    break;
                }
                self.pop();
                let right = self.parse_expr(bp.right, true)?;
                lhs = Expr::alloc(
                    self.arena,
                    lhs.loc,
                    ExprKind::Binary { left: lhs, op, right },
                );
                continue;
            }
            let bp = BindingPower::fun_ap();
            if bp.left < min_bp {
                break;
            }
            let Some(arg) = self.speculate_expr(bp.right) else {
                break;
            };
            lhs = Expr::alloc(self.arena, lhs.loc, ExprKind::Apply { fun: lhs, arg });
        }
        // A trailing annotation belongs to the outermost expression at this
        // position, so it is only consumed at top binding power. Lambda
        // bodies opt out so `fun x -> x + 1 : int -> int` annotates the
        // lambda rather than its body.
        if min_bp == 0 && allow_ann && self.peek().kind == TokenKind::Colon {
            self.pop();
            let ty = self.parse_type_expr()?;
            lhs = lhs.with_ann(self.arena, ty);
        }
        Some(lhs)
    }

    fn parse_atom(&mut self) -> Option<&'a Expr<'a>> {
        let front = *self.peek();
        match front.kind {
            TokenKind::IntLit => {
                self.pop();
                match front.text.parse::<i64>() {
                    Ok(value) => Some(Expr::alloc(self.arena, front.loc, ExprKind::Int(value))),
                    Err(_) => {
                        self.error_at_token(
                            &front,
                            "int literal is too large for its type".to_owned(),
                        );
                        None
                    }
                }
            }
            TokenKind::FloatLit => {
                self.pop();
                match front.text.parse::<f64>() {
                    Ok(value) => Some(Expr::alloc(self.arena, front.loc, ExprKind::Float(value))),
                    Err(_) => {
                        self.error_at_token(&front, "invalid float literal".to_owned());
                        None
                    }
                }
            }
            TokenKind::True => {
                self.pop();
                Some(Expr::alloc(self.arena, front.loc, ExprKind::Bool(true)))
            }
            TokenKind::False => {
                self.pop();
                Some(Expr::alloc(self.arena, front.loc, ExprKind::Bool(false)))
            }
            TokenKind::Ident => {
                self.pop();
                let name = self.types.intern_str(front.text);
                Some(Expr::alloc(self.arena, front.loc, ExprKind::Var(name)))
            }
            TokenKind::LParen => self.parse_parenthesized(),
            TokenKind::LBrace => self.parse_record_literal(),
            TokenKind::Let => self.parse_let(),
            TokenKind::If => self.parse_if(),
            TokenKind::Fun => self.parse_lambda(TokenKind::Fun),
            TokenKind::Fix => self.parse_lambda(TokenKind::Fix),
            TokenKind::Minus => {
                self.pop();
                let right = self.parse_expr(0, true)?;
                Some(Expr::alloc(
                    self.arena,
                    front.loc,
                    ExprKind::Unary {
                        op: UnaryOp::Neg,
                        right,
                    },
                ))
            }
            TokenKind::Not => {
                self.pop();
                let right = self.parse_expr(0, true)?;
                Some(Expr::alloc(
                    self.arena,
                    front.loc,
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        right,
                    },
                ))
            }
            _ => {
                self.error_at_token(&front, format!("expected expression; got token '{front}'"));
                None
            }
        }
    }

    /// `()`, a parenthesized expression, or a tuple literal.
    fn parse_parenthesized(&mut self) -> Option<&'a Expr<'a>> {
        let lparen = self.pop();
        if self.peek().kind == TokenKind::RParen {
            self.pop();
            return Some(Expr::alloc(self.arena, lparen.loc, ExprKind::Unit));
        }
        let mut elems = vec![self.parse_expr(0, true)?];
        while self.peek().kind == TokenKind::Comma {
            self.pop();
            elems.push(self.parse_expr(0, true)?);
        }
        self.expect(TokenKind::RParen)?;
        if elems.len() == 1 {
            Some(elems[0])
        } else {
            Some(Expr::alloc(
                self.arena,
                lparen.loc,
                ExprKind::Tuple(self.arena.alloc_slice_copy(&elems)),
            ))
        }
    }

    /// `{ field = expr, ... }`. The record's type is not named at the use
    /// site; it is resolved by matching the literal's field-name set against
    /// the declared record types. No match, or more than one, is an error.
    fn parse_record_literal(&mut self) -> Option<&'a Expr<'a>> {
        let lbrace = *self.peek();
        let mut fields: Vec<(&'a str, &'a Expr<'a>)> = Vec::new();
        let mut seen = HashSet::new();
        loop {
            self.pop(); // the opening brace, then each comma
            let field_tok = self.expect(TokenKind::Ident)?;
            self.expect(TokenKind::Equals)?;
            let value = self.parse_expr(0, true)?;
            let field = self.types.intern_str(field_tok.text);
            if !seen.insert(field) {
                self.error_at_token(
                    &field_tok,
                    format!("duplicate record field '{}'", field_tok.text),
                );
                return None;
            }
            fields.push((field, value));
            if self.peek().kind != TokenKind::Comma {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;

        let mut resolved: Option<&'a Type<'a>> = None;
        let mut ambiguous = false;
        for &ty in self.type_table.values() {
            let Type::Record { fields: decl, .. } = ty else {
                continue;
            };
            if decl.len() != fields.len() {
                continue;
            }
            if fields
                .iter()
                .all(|(name, _)| decl.iter().any(|(decl_name, _)| decl_name == name))
            {
                ambiguous = resolved.is_some();
                resolved = Some(ty);
            }
        }
        let ty = match (resolved, ambiguous) {
            (Some(ty), false) => ty,
            _ => {
                self.error_at_token(
                    &lbrace,
                    "unable to match type to record literal from identifier set".to_owned(),
                );
                return None;
            }
        };
        Some(Expr::alloc(
            self.arena,
            lbrace.loc,
            ExprKind::Record {
                ty,
                fields: self.arena.alloc_slice_copy(&fields),
            },
        ))
    }

    /// `let [rec] binder = value in body`. A recursive binding desugars to
    /// `let x = fix x -> value in body`.
    fn parse_let(&mut self) -> Option<&'a Expr<'a>> {
        let let_tok = self.pop();
        let recursive = if self.peek().kind == TokenKind::Rec {
            self.pop();
            true
        } else {
            false
        };
        let binder = self.parse_var()?;
        self.expect(TokenKind::Equals)?;
        let value = self.parse_expr(0, true)?;
        self.expect(TokenKind::In)?;
        let body = self.parse_expr(0, true)?;
        let value = if recursive {
            Expr::alloc(self.arena, value.loc, ExprKind::Fix { binder, body: value })
        } else {
            value
        };
        Some(Expr::alloc(
            self.arena,
            let_tok.loc,
            ExprKind::Let { binder, value, body },
        ))
    }

    fn parse_if(&mut self) -> Option<&'a Expr<'a>> {
        let if_tok = self.pop();
        let test = self.parse_expr(0, true)?;
        self.expect(TokenKind::Then)?;
        let then_body = self.parse_expr(0, true)?;
        self.expect(TokenKind::Else)?;
        let else_body = self.parse_expr(0, true)?;
        Some(Expr::alloc(
            self.arena,
            if_tok.loc,
            ExprKind::If {
                test,
                then_body,
                else_body,
            },
        ))
    }

    /// `fun binder -> body` and `fix binder -> body`. The body is parsed
    /// with annotations disabled so a trailing `: ty` annotates the lambda.
    fn parse_lambda(&mut self, kind: TokenKind) -> Option<&'a Expr<'a>> {
        let intro = self.pop();
        let binder = self.parse_var()?;
        self.expect(TokenKind::Arrow)?;
        let body = self.parse_expr(0, false)?;
        let kind = if kind == TokenKind::Fun {
            ExprKind::Fun { binder, body }
        } else {
            ExprKind::Fix { binder, body }
        };
        Some(Expr::alloc(self.arena, intro.loc, kind))
    }

    /// A binding position: a bare identifier or `( ident : type )`.
    fn parse_var(&mut self) -> Option<&'a Binder<'a>> {
        if self.peek().kind == TokenKind::LParen {
            let lparen = self.pop();
            let name_tok = self.expect(TokenKind::Ident)?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type_expr()?;
            self.expect(TokenKind::RParen)?;
            return Some(self.arena.alloc(Binder {
                loc: lparen.loc.zero_width(),
                name: self.types.intern_str(name_tok.text),
                ty_ann: Some(ty),
            }));
        }
        let name_tok = self.expect(TokenKind::Ident)?;
        Some(self.arena.alloc(Binder {
            loc: name_tok.loc.zero_width(),
            name: self.types.intern_str(name_tok.text),
            ty_ann: None,
        }))
    }

    /// Type expressions: `*` products bind tighter than `->`, and arrows
    /// associate to the right.
    fn parse_type_expr(&mut self) -> Option<&'a Type<'a>> {
        let first = self.parse_type_atom()?;
        let mut elems = vec![first];
        while self.peek().kind == TokenKind::Mul {
            self.pop();
            elems.push(self.parse_type_atom()?);
        }
        let left = if elems.len() == 1 {
            first
        } else {
            self.types.tuple(&elems)
        };
        if self.peek().kind == TokenKind::Arrow {
            self.pop();
            let right = self.parse_type_expr()?;
            Some(self.types.arrow(left, right))
        } else {
            Some(left)
        }
    }

    fn parse_type_atom(&mut self) -> Option<&'a Type<'a>> {
        let front = *self.peek();
        match front.kind {
            TokenKind::Ident => {
                self.pop();
                match self.type_table.get(front.text).copied() {
                    Some(ty) => Some(ty),
                    None => {
                        self.error_at_token(
                            &front,
                            format!("unbound typename '{}'", front.text),
                        );
                        None
                    }
                }
            }
            TokenKind::LParen => {
                self.pop();
                let ty = self.parse_type_expr()?;
                self.expect(TokenKind::RParen)?;
                Some(ty)
            }
            _ => {
                self.error_at_token(
                    &front,
                    format!("expected type identifier; got token '{front}'"),
                );
                None
            }
        }
    }

    /// `type name = { field : ty, ... } ;` or `type name = case [ty] | ... ;`
    fn parse_type_decl(&mut self) -> Option<()> {
        self.pop(); // 'type'
        let name_tok = self.expect(TokenKind::Ident)?;
        let name = self.types.intern_str(name_tok.text);
        if self.type_table.contains_key(name) {
            self.error_at_token(&name_tok, format!("duplicate type name '{}'", name_tok.text));
            return None;
        }
        self.expect(TokenKind::Equals)?;
        let ty = if self.peek().kind == TokenKind::LBrace {
            self.parse_record_decl(name)?
        } else {
            self.parse_variant_decl(name)?
        };
        self.expect(TokenKind::Semicolon)?;
        self.type_table.insert(name, ty);
        Some(())
    }

    fn parse_record_decl(&mut self, name: &'a str) -> Option<&'a Type<'a>> {
        self.pop(); // '{'
        let mut fields: Vec<(&'a str, &'a Type<'a>)> = Vec::new();
        loop {
            let field_tok = self.expect(TokenKind::Ident)?;
            let field = self.types.intern_str(field_tok.text);
            if fields.iter().any(|(existing, _)| *existing == field) {
                self.error_at_token(
                    &field_tok,
                    format!("duplicate record field '{}'", field_tok.text),
                );
                return None;
            }
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type_expr()?;
            fields.push((field, ty));
            if self.peek().kind != TokenKind::Comma {
                break;
            }
            self.pop();
        }
        self.expect(TokenKind::RBrace)?;
        Some(self.types.record(name, &fields))
    }

    fn parse_variant_decl(&mut self, name: &'a str) -> Option<&'a Type<'a>> {
        if self.peek().kind == TokenKind::Bar {
            self.pop();
        }
        let mut cases: Vec<(&'a str, Option<&'a Type<'a>>)> = Vec::new();
        loop {
            let case_tok = self.expect(TokenKind::Ident)?;
            let case = self.types.intern_str(case_tok.text);
            if cases.iter().any(|(existing, _)| *existing == case) {
                self.error_at_token(
                    &case_tok,
                    format!("duplicate variant case '{}'", case_tok.text),
                );
                return None;
            }
            let payload = match self.peek().kind {
                TokenKind::Ident | TokenKind::LParen => Some(self.parse_type_expr()?),
                _ => None,
            };
            cases.push((case, payload));
            if self.peek().kind != TokenKind::Bar {
                break;
            }
            self.pop();
        }
        Some(self.types.variant(name, &cases))
    }
}
