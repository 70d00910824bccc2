use std::mem;

use bumpalo::Bump;
use tracing::trace;

use crate::ast::{Expr, ExprKind};
use crate::evaluator::op_table::{self, OpError};
use crate::scope_stack::ScopeStack;
use crate::source::SourceFile;
use crate::token::Loc;
use crate::values::{Closure, Value};

/// Environment-based evaluator.
///
/// Functions evaluate to closures capturing a flattened snapshot of the
/// scope stack; applying one swaps the whole stack for the captured
/// environment, which is what gives lexical rather than dynamic scoping.
/// `fix` builds a self-naming closure that rebinds itself on every
/// application.
///
/// The evaluator can run on unchecked programs (the `--eval` mode), so it
/// reports its own type mismatches at runtime.
pub struct Evaluator<'a, 's> {
    source: &'s SourceFile,
    arena: &'a Bump,
    scopes: ScopeStack<'a, Value<'a>>,
}

impl<'a, 's> Evaluator<'a, 's> {
    pub fn new(source: &'s SourceFile, arena: &'a Bump) -> Self {
        Evaluator {
            source,
            arena,
            scopes: ScopeStack::new(),
        }
    }

    fn error_at(&self, loc: Loc, message: String) {
        self.source
            .report_error(loc.line, loc.col_start, loc.len(), message);
    }

    fn pop_scope(&mut self) {
        self.scopes
            .pop()
            .expect("evaluator scope stack underflow");
    }

    fn capture_env(&self) -> &'a [(&'a str, Value<'a>)] {
        self.arena.alloc_slice_copy(&self.scopes.flatten())
    }

    pub fn eval(&mut self, expr: &'a Expr<'a>) -> Option<Value<'a>> {
        trace!(expr = %expr, "eval");
        match expr.kind {
            ExprKind::Int(v) => Some(Value::Int(v)),
            ExprKind::Float(v) => Some(Value::Float(v)),
            ExprKind::Bool(v) => Some(Value::Bool(v)),
            ExprKind::Unit => Some(Value::Unit),
            ExprKind::Var(name) => match self.scopes.lookup(name) {
                Some(value) => Some(value),
                None => {
                    self.error_at(expr.loc, format!("unbound variable '{name}'"));
                    None
                }
            },
            ExprKind::Let { binder, value, body } => {
                let value = self.eval(value)?;
                self.scopes.push(binder.name, value);
                let result = self.eval(body);
                self.pop_scope();
                result
            }
            ExprKind::If {
                test,
                then_body,
                else_body,
            } => {
                let test_val = self.eval(test)?;
                match test_val.as_bool() {
                    Some(true) => self.eval(then_body),
                    Some(false) => self.eval(else_body),
                    None => {
                        self.error_at(
                            test.loc,
                            format!(
                                "expected expression of bool type in condition for if \
                                 statement; got type {}",
                                test_val.type_name()
                            ),
                        );
                        None
                    }
                }
            }
            ExprKind::Fun { .. } => Some(Value::Closure(self.arena.alloc(Closure {
                fun: expr,
                env: self.capture_env(),
                self_name: None,
            }))),
            ExprKind::Fix { binder, body } => {
                if let ExprKind::Fun { .. } = body.kind {
                    Some(Value::Closure(self.arena.alloc(Closure {
                        fun: body,
                        env: self.capture_env(),
                        self_name: Some(binder.name),
                    })))
                } else {
                    // A fixpoint whose body is not a function cannot close
                    // over itself; unfold it one step instead.
                    let unfolded = body.subst(self.arena, binder.name, expr);
                    self.eval(unfolded)
                }
            }
            ExprKind::Apply { fun, arg } => {
                let fun_val = self.eval(fun)?;
                let Value::Closure(closure) = fun_val else {
                    self.error_at(
                        fun.loc,
                        format!(
                            "expected expression of function type in function \
                             application; got type {}",
                            fun_val.type_name()
                        ),
                    );
                    return None;
                };
                let arg_val = self.eval(arg)?;
                self.apply(closure, arg_val)
            }
            ExprKind::Unary { op, right } => {
                let right_val = self.eval(right)?;
                match op_table::unary_op_result(op, right_val) {
                    Ok(value) => Some(value),
                    Err(OpError::Undefined) => {
                        self.error_at(
                            right.loc,
                            format!(
                                "expression (of {} type) does not define unary operation {op}",
                                right_val.type_name()
                            ),
                        );
                        None
                    }
                    Err(err) => {
                        self.error_at(expr.loc, err.to_string());
                        None
                    }
                }
            }
            ExprKind::Binary { left, op, right } => {
                let left_val = self.eval(left)?;
                let right_val = self.eval(right)?;
                match op_table::binary_op_result(left_val, op, right_val) {
                    Ok(value) => Some(value),
                    Err(OpError::Undefined) => {
                        self.error_at(
                            left.loc,
                            format!(
                                "left expression (of {} type) does not define operation \
                                 {op} with right expression (of {} type)",
                                left_val.type_name(),
                                right_val.type_name()
                            ),
                        );
                        None
                    }
                    Err(err) => {
                        self.error_at(expr.loc, err.to_string());
                        None
                    }
                }
            }
            ExprKind::Tuple(elems) => {
                let mut values = Vec::with_capacity(elems.len());
                for &elem in elems {
                    values.push(self.eval(elem)?);
                }
                Some(Value::Tuple(self.arena.alloc_slice_copy(&values)))
            }
            ExprKind::Record { ty, fields } => {
                let mut values = Vec::with_capacity(fields.len());
                for &(name, field) in fields {
                    values.push((name, self.eval(field)?));
                }
                Some(Value::Record {
                    ty,
                    fields: self.arena.alloc_slice_copy(&values),
                })
            }
        }
    }

    /// Applies a closure. The scope stack is swapped for the captured
    /// environment for the duration of the body, then restored, including
    /// on the error path.
    fn apply(&mut self, closure: &'a Closure<'a>, arg: Value<'a>) -> Option<Value<'a>> {
        let ExprKind::Fun { binder, body } = closure.fun.kind else {
            unreachable!("closures are built from fun nodes");
        };
        let saved = mem::replace(&mut self.scopes, ScopeStack::from_bindings(closure.env));
        if let Some(self_name) = closure.self_name {
            self.scopes.push(self_name, Value::Closure(closure));
        }
        self.scopes.push(binder.name, arg);
        let result = self.eval(body);
        self.scopes = saved;
        result
    }
}
