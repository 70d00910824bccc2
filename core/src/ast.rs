//! Arena-allocated abstract syntax.
//!
//! Every node is immutable once built and holds only arena references, so
//! expressions are `Copy` handles into the arena. Nodes carry a zero-width
//! location anchoring diagnostics, plus an optional type annotation that the
//! analyzer checks the node against before anything else.

use std::fmt;

use bumpalo::Bump;

use crate::token::Loc;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Not => f.write_str("!"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Eq,
    Neq,
    Lt,
    Gt,
    Leq,
    Geq,
    And,
    Or,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spelling = match self {
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Eq => "=",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Leq => "<=",
            BinOp::Geq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        f.write_str(spelling)
    }
}

/// A bound name together with its optional declared type, as written in
/// `let (x : int) = ...` or `fun (f : int -> int) -> ...`.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'a> {
    pub loc: Loc,
    pub name: &'a str,
    pub ty_ann: Option<&'a Type<'a>>,
}

impl fmt::Display for Binder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty_ann {
            Some(ty) => write!(f, "({} : {ty})", self.name),
            None => f.write_str(self.name),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Expr<'a> {
    /// Zero-width anchor position for diagnostics.
    pub loc: Loc,
    /// `expr : ty` annotation, if any.
    pub ty_ann: Option<&'a Type<'a>>,
    pub kind: ExprKind<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum ExprKind<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    Unit,
    Var(&'a str),
    Let {
        binder: &'a Binder<'a>,
        value: &'a Expr<'a>,
        body: &'a Expr<'a>,
    },
    If {
        test: &'a Expr<'a>,
        then_body: &'a Expr<'a>,
        else_body: &'a Expr<'a>,
    },
    Fun {
        binder: &'a Binder<'a>,
        body: &'a Expr<'a>,
    },
    Fix {
        binder: &'a Binder<'a>,
        body: &'a Expr<'a>,
    },
    Apply {
        fun: &'a Expr<'a>,
        arg: &'a Expr<'a>,
    },
    Unary {
        op: UnaryOp,
        right: &'a Expr<'a>,
    },
    Binary {
        left: &'a Expr<'a>,
        op: BinOp,
        right: &'a Expr<'a>,
    },
    Tuple(&'a [&'a Expr<'a>]),
    Record {
        ty: &'a Type<'a>,
        fields: &'a [(&'a str, &'a Expr<'a>)],
    },
}

impl<'a> Expr<'a> {
    /// Allocates a node in the arena, anchored at the zero-width start of
    /// `loc`.
    pub fn alloc(arena: &'a Bump, loc: Loc, kind: ExprKind<'a>) -> &'a Expr<'a> {
        arena.alloc(Expr {
            loc: loc.zero_width(),
            ty_ann: None,
            kind,
        })
    }

    /// A copy of this node carrying the given annotation.
    pub fn with_ann(&self, arena: &'a Bump, ty: &'a Type<'a>) -> &'a Expr<'a> {
        arena.alloc(Expr {
            ty_ann: Some(ty),
            ..*self
        })
    }

    pub fn as_var(&self) -> Option<&'a str> {
        match self.kind {
            ExprKind::Var(name) => Some(name),
            _ => None,
        }
    }

    /// Deep copy into `arena`.
    pub fn copy(&self, arena: &'a Bump) -> &'a Expr<'a> {
        let kind = match self.kind {
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Bool(_)
            | ExprKind::Unit
            | ExprKind::Var(_) => self.kind,
            ExprKind::Let { binder, value, body } => ExprKind::Let {
                binder,
                value: value.copy(arena),
                body: body.copy(arena),
            },
            ExprKind::If {
                test,
                then_body,
                else_body,
            } => ExprKind::If {
                test: test.copy(arena),
                then_body: then_body.copy(arena),
                else_body: else_body.copy(arena),
            },
            ExprKind::Fun { binder, body } => ExprKind::Fun {
                binder,
                body: body.copy(arena),
            },
            ExprKind::Fix { binder, body } => ExprKind::Fix {
                binder,
                body: body.copy(arena),
            },
            ExprKind::Apply { fun, arg } => ExprKind::Apply {
                fun: fun.copy(arena),
                arg: arg.copy(arena),
            },
            ExprKind::Unary { op, right } => ExprKind::Unary {
                op,
                right: right.copy(arena),
            },
            ExprKind::Binary { left, op, right } => ExprKind::Binary {
                left: left.copy(arena),
                op,
                right: right.copy(arena),
            },
            ExprKind::Tuple(elems) => {
                let copied: Vec<&Expr> = elems.iter().map(|e| e.copy(arena)).collect();
                ExprKind::Tuple(arena.alloc_slice_copy(&copied))
            }
            ExprKind::Record { ty, fields } => {
                let copied: Vec<(&str, &Expr)> = fields
                    .iter()
                    .map(|(name, e)| (*name, e.copy(arena)))
                    .collect();
                ExprKind::Record {
                    ty,
                    fields: arena.alloc_slice_copy(&copied),
                }
            }
        };
        arena.alloc(Expr { kind, ..*self })
    }

    /// Capture-avoiding substitution of `replacement` for free occurrences
    /// of `name`. Any binder introducing the same name shadows it, so the
    /// walk does not descend into the shadowed body; a `let` binding's value
    /// is still substituted since the name is not in scope there. The
    /// replacement is deep-copied at every substitution site.
    pub fn subst(
        &self,
        arena: &'a Bump,
        name: &str,
        replacement: &'a Expr<'a>,
    ) -> &'a Expr<'a> {
        let kind = match self.kind {
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Bool(_)
            | ExprKind::Unit => self.kind,
            ExprKind::Var(var) => {
                if var == name {
                    return replacement.copy(arena);
                }
                self.kind
            }
            ExprKind::Let { binder, value, body } => ExprKind::Let {
                binder,
                value: value.subst(arena, name, replacement),
                body: if binder.name == name {
                    body.copy(arena)
                } else {
                    body.subst(arena, name, replacement)
                },
            },
            ExprKind::If {
                test,
                then_body,
                else_body,
            } => ExprKind::If {
                test: test.subst(arena, name, replacement),
                then_body: then_body.subst(arena, name, replacement),
                else_body: else_body.subst(arena, name, replacement),
            },
            ExprKind::Fun { binder, body } => ExprKind::Fun {
                binder,
                body: if binder.name == name {
                    body.copy(arena)
                } else {
                    body.subst(arena, name, replacement)
                },
            },
            ExprKind::Fix { binder, body } => ExprKind::Fix {
                binder,
                body: if binder.name == name {
                    body.copy(arena)
                } else {
                    body.subst(arena, name, replacement)
                },
            },
            ExprKind::Apply { fun, arg } => ExprKind::Apply {
                fun: fun.subst(arena, name, replacement),
                arg: arg.subst(arena, name, replacement),
            },
            ExprKind::Unary { op, right } => ExprKind::Unary {
                op,
                right: right.subst(arena, name, replacement),
            },
            ExprKind::Binary { left, op, right } => ExprKind::Binary {
                left: left.subst(arena, name, replacement),
                op,
                right: right.subst(arena, name, replacement),
            },
            ExprKind::Tuple(elems) => {
                let substed: Vec<&Expr> = elems
                    .iter()
                    .map(|e| e.subst(arena, name, replacement))
                    .collect();
                ExprKind::Tuple(arena.alloc_slice_copy(&substed))
            }
            ExprKind::Record { ty, fields } => {
                let substed: Vec<(&str, &Expr)> = fields
                    .iter()
                    .map(|(field, e)| (*field, e.subst(arena, name, replacement)))
                    .collect();
                ExprKind::Record {
                    ty,
                    fields: arena.alloc_slice_copy(&substed),
                }
            }
        };
        arena.alloc(Expr { kind, ..*self })
    }
}

/// Fully parenthesized rendering; primarily for `--parse` output and tests.
impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ExprKind::Int(v) => write!(f, "{v}")?,
            ExprKind::Float(v) => write!(f, "{v}")?,
            ExprKind::Bool(v) => write!(f, "{v}")?,
            ExprKind::Unit => f.write_str("()")?,
            ExprKind::Var(name) => f.write_str(name)?,
            ExprKind::Let { binder, value, body } => {
                write!(f, "(let {binder} = {value} in {body})")?;
            }
            ExprKind::If {
                test,
                then_body,
                else_body,
            } => write!(f, "(if {test} then {then_body} else {else_body})")?,
            ExprKind::Fun { binder, body } => write!(f, "(fun {binder} -> {body})")?,
            ExprKind::Fix { binder, body } => write!(f, "(fix {binder} -> {body})")?,
            ExprKind::Apply { fun, arg } => write!(f, "({fun} {arg})")?,
            ExprKind::Unary { op, right } => write!(f, "({op}{right})")?,
            ExprKind::Binary { left, op, right } => write!(f, "({left} {op} {right})")?,
            ExprKind::Tuple(elems) => {
                f.write_str("(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                f.write_str(")")?;
            }
            ExprKind::Record { fields, .. } => {
                f.write_str("{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name} = {value}")?;
                }
                f.write_str(" }")?;
            }
        }
        if let Some(ty) = self.ty_ann {
            write!(f, " : {ty}")?;
        }
        Ok(())
    }
}
