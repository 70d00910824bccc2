use tracing::debug;

use crate::ast::{Binder, Expr, ExprKind};
use crate::evaluator::op_table;
use crate::scope_stack::ScopeStack;
use crate::source::SourceFile;
use crate::token::Loc;
use crate::types::{Type, TypeManager};

/// Bidirectional type checker.
///
/// Every node either synthesizes a type bottom-up or is analyzed against an
/// expected type top-down. Analysis is strictly more permissive: an
/// unannotated lambda cannot synthesize, but analyzes fine against an arrow
/// type, which is how `let (f : int -> int) = fun x -> x + 1 in ...`
/// checks without annotating the lambda itself.
///
/// An explicit `expr : ty` annotation switches the node into analysis mode
/// against `ty` regardless of direction.
pub struct Analyzer<'a, 's> {
    source: &'s SourceFile,
    types: &'a TypeManager<'a>,
    ctx: ScopeStack<'a, &'a Type<'a>>,
    /// Cleared while probing whether a node happens to synthesize the
    /// expected type before falling back to a real analysis rule.
    report_errors: bool,
}

impl<'a, 's> Analyzer<'a, 's> {
    pub fn new(source: &'s SourceFile, types: &'a TypeManager<'a>) -> Self {
        Analyzer {
            source,
            types,
            ctx: ScopeStack::new(),
            report_errors: true,
        }
    }

    /// Checks a whole program, returning its type.
    pub fn check(&mut self, expr: &'a Expr<'a>) -> Option<&'a Type<'a>> {
        let ty = self.synthesize(expr);
        if let Some(ty) = ty {
            debug!(%ty, "type checking finished");
        }
        ty
    }

    pub fn synthesize(&mut self, expr: &'a Expr<'a>) -> Option<&'a Type<'a>> {
        if let Some(ann) = expr.ty_ann {
            if self.analyze_kind(expr, ann) {
                return Some(ann);
            }
            self.error_at(
                expr.loc,
                format!("expression does not analyze against annotated type {ann}"),
            );
            return None;
        }
        self.synthesize_kind(expr)
    }

    pub fn analyze(&mut self, expr: &'a Expr<'a>, expected: &'a Type<'a>) -> bool {
        match expr.ty_ann {
            Some(ann) => ann == expected && self.analyze_kind(expr, ann),
            None => self.analyze_kind(expr, expected),
        }
    }

    fn error_at(&self, loc: Loc, message: String) {
        if self.report_errors {
            self.source
                .report_error(loc.line, loc.col_start, loc.len(), message);
        }
    }

    fn silently<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.report_errors;
        self.report_errors = false;
        let result = f(self);
        self.report_errors = saved;
        result
    }

    /// Silent probe: does the node synthesize exactly `expected`?
    fn synthesizes_to(&mut self, expr: &'a Expr<'a>, expected: &'a Type<'a>) -> bool {
        self.silently(|a| a.synthesize_kind(expr)) == Some(expected)
    }

    fn pop_scope(&mut self) {
        self.ctx.pop().expect("analyzer scope stack underflow");
    }

    /// Types a `let` binding's value: against the binder's annotation when
    /// there is one, by synthesis otherwise.
    fn check_binding(
        &mut self,
        binder: &'a Binder<'a>,
        value: &'a Expr<'a>,
    ) -> Option<&'a Type<'a>> {
        match binder.ty_ann {
            Some(ann) => {
                if self.analyze(value, ann) {
                    Some(ann)
                } else {
                    self.error_at(value.loc, format!("expected expression of type {ann}"));
                    None
                }
            }
            None => self.synthesize(value),
        }
    }

    fn synthesize_kind(&mut self, expr: &'a Expr<'a>) -> Option<&'a Type<'a>> {
        match expr.kind {
            ExprKind::Int(_) => Some(self.types.int()),
            ExprKind::Float(_) => Some(self.types.float()),
            ExprKind::Bool(_) => Some(self.types.bool()),
            ExprKind::Unit => Some(self.types.unit()),
            ExprKind::Var(name) => match self.ctx.lookup(name) {
                Some(ty) => Some(ty),
                None => {
                    self.error_at(expr.loc, format!("unbound variable '{name}'"));
                    None
                }
            },
            ExprKind::Let { binder, value, body } => {
                let value_ty = self.check_binding(binder, value)?;
                self.ctx.push(binder.name, value_ty);
                let result = self.synthesize(body);
                self.pop_scope();
                result
            }
            ExprKind::If {
                test,
                then_body,
                else_body,
            } => {
                if !self.analyze(test, self.types.bool()) {
                    self.error_at(
                        test.loc,
                        "expected test expression of bool type".to_owned(),
                    );
                    return None;
                }
                let then_ty = self.synthesize(then_body)?;
                let else_ty = self.synthesize(else_body)?;
                if then_ty != else_ty {
                    self.error_at(
                        expr.loc,
                        format!(
                            "both branches must synthesize same type; true branch \
                             synthesizes {then_ty} and false branch synthesizes {else_ty}"
                        ),
                    );
                    return None;
                }
                Some(then_ty)
            }
            ExprKind::Fun { binder, body } => {
                let Some(dom) = binder.ty_ann else {
                    self.error_at(
                        expr.loc,
                        "type annotation is necessary to make function well-typed".to_owned(),
                    );
                    return None;
                };
                self.ctx.push(binder.name, dom);
                let cod = self.synthesize(body);
                self.pop_scope();
                Some(self.types.arrow(dom, cod?))
            }
            ExprKind::Fix { binder, body } => {
                let Some(ann) = binder.ty_ann else {
                    self.error_at(
                        expr.loc,
                        "type annotation is necessary to make fixpoint well-typed".to_owned(),
                    );
                    return None;
                };
                self.ctx.push(binder.name, ann);
                let ok = self.analyze(body, ann);
                self.pop_scope();
                if !ok {
                    self.error_at(body.loc, format!("expected expression of type {ann}"));
                    return None;
                }
                Some(ann)
            }
            ExprKind::Apply { fun, arg } => {
                let fun_ty = self.synthesize(fun)?;
                let Some((dom, cod)) = fun_ty.as_arrow() else {
                    self.error_at(
                        fun.loc,
                        format!(
                            "expected expression of arrow type in function application; \
                             got type {fun_ty}"
                        ),
                    );
                    return None;
                };
                if !self.analyze(arg, dom) {
                    self.error_at(
                        arg.loc,
                        format!("expected expression of type {dom} as function argument"),
                    );
                    return None;
                }
                Some(cod)
            }
            ExprKind::Unary { op, right } => {
                let right_ty = self.synthesize(right)?;
                match op_table::unary_op_type(op, right_ty, self.types) {
                    Some(ty) => Some(ty),
                    None => {
                        self.error_at(
                            right.loc,
                            format!(
                                "expression (of {right_ty} type) does not define unary \
                                 operation {op}"
                            ),
                        );
                        None
                    }
                }
            }
            ExprKind::Binary { left, op, right } => {
                let left_ty = self.synthesize(left)?;
                let right_ty = self.synthesize(right)?;
                match op_table::binary_op_type(left_ty, op, right_ty, self.types) {
                    Some(ty) => Some(ty),
                    None => {
                        self.error_at(
                            left.loc,
                            format!(
                                "left expression (of {left_ty} type) does not define \
                                 operation {op} with right expression (of {right_ty} type)"
                            ),
                        );
                        None
                    }
                }
            }
            ExprKind::Tuple(elems) => {
                let mut tys = Vec::with_capacity(elems.len());
                for &elem in elems {
                    tys.push(self.synthesize(elem)?);
                }
                Some(self.types.tuple(&tys))
            }
            ExprKind::Record { ty, fields } => {
                let Type::Record { fields: decl, .. } = ty else {
                    unreachable!("record literals carry a record type");
                };
                for &(name, value) in fields {
                    // the parser resolved the type by field-name set, so
                    // the declaration has every literal field
                    let field_ty = decl
                        .iter()
                        .find(|&&(decl_name, _)| decl_name == name)
                        .map(|&(_, ty)| ty)
                        .expect("record literal field missing from its type");
                    if !self.analyze(value, field_ty) {
                        self.error_at(
                            value.loc,
                            format!("expected expression of type {field_ty}"),
                        );
                        return None;
                    }
                }
                Some(ty)
            }
        }
    }

    fn analyze_kind(&mut self, expr: &'a Expr<'a>, expected: &'a Type<'a>) -> bool {
        match expr.kind {
            ExprKind::Fun { binder, body } => {
                if self.synthesizes_to(expr, expected) {
                    return true;
                }
                let Some((dom, cod)) = expected.as_arrow() else {
                    return false;
                };
                if let Some(ann) = binder.ty_ann {
                    if ann != dom {
                        return false;
                    }
                }
                self.ctx.push(binder.name, dom);
                let ok = self.analyze(body, cod);
                self.pop_scope();
                ok
            }
            ExprKind::Fix { binder, body } => {
                if self.synthesizes_to(expr, expected) {
                    return true;
                }
                if let Some(ann) = binder.ty_ann {
                    if ann != expected {
                        return false;
                    }
                }
                self.ctx.push(binder.name, expected);
                let ok = self.analyze(body, expected);
                self.pop_scope();
                ok
            }
            ExprKind::Let { binder, value, body } => {
                let Some(value_ty) = self.check_binding(binder, value) else {
                    return false;
                };
                self.ctx.push(binder.name, value_ty);
                let ok = self.analyze(body, expected);
                self.pop_scope();
                ok
            }
            ExprKind::If {
                test,
                then_body,
                else_body,
            } => {
                if !self.analyze(test, self.types.bool()) {
                    self.error_at(
                        test.loc,
                        "expected test expression of bool type".to_owned(),
                    );
                    return false;
                }
                self.analyze(then_body, expected) && self.analyze(else_body, expected)
            }
            ExprKind::Tuple(elems) => {
                if self.synthesizes_to(expr, expected) {
                    return true;
                }
                let Type::Tuple(tys) = expected else {
                    return false;
                };
                if tys.len() != elems.len() {
                    return false;
                }
                elems
                    .iter()
                    .zip(tys.iter())
                    .all(|(&elem, &ty)| self.analyze(elem, ty))
            }
            _ => match self.synthesize_kind(expr) {
                Some(ty) => ty == expected,
                None => false,
            },
        }
    }
}
