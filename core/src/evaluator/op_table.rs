//! The operator table: which operators exist at which types, and what they
//! compute. The analyzer asks the type-level questions and the evaluator the
//! value-level ones, so the two stages cannot drift apart.
//!
//! Only `=`, `<`, and the boolean connectives are primitive among the
//! comparisons; the rest derive from them. `!=` negates `=`, `>` is `<`
//! with its arguments flipped, and `<=`/`>=` combine the two, so a type
//! supports the whole comparison family exactly when it supports the
//! primitives involved. Comparison results are always `bool`.

use thiserror::Error;

use crate::ast::{BinOp, UnaryOp};
use crate::types::{Type, TypeManager};
use crate::values::Value;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpError {
    #[error("operation is not defined for the given operand types")]
    Undefined,
    #[error("division by zero")]
    DivisionByZero,
}

fn primitive_binary_type<'a>(
    left: &'a Type<'a>,
    op: BinOp,
    right: &'a Type<'a>,
    types: &TypeManager<'a>,
) -> Option<&'a Type<'a>> {
    use BinOp::*;
    match (left, op, right) {
        (Type::Int, Eq, Type::Int)
        | (Type::Float, Eq, Type::Float)
        | (Type::Bool, Eq, Type::Bool)
        | (Type::Unit, Eq, Type::Unit) => Some(types.bool()),
        (Type::Int, Lt, Type::Int) | (Type::Float, Lt, Type::Float) => Some(types.bool()),
        (Type::Bool, And | Or, Type::Bool) => Some(types.bool()),
        (Type::Int, Add | Sub | Mul | Div | Mod, Type::Int) => Some(types.int()),
        (Type::Float, Add | Sub | Mul | Div, Type::Float) => Some(types.float()),
        _ => None,
    }
}

/// The result type of `left op right`, or `None` when the operation is not
/// defined at those types.
pub fn binary_op_type<'a>(
    left: &'a Type<'a>,
    op: BinOp,
    right: &'a Type<'a>,
    types: &TypeManager<'a>,
) -> Option<&'a Type<'a>> {
    match op {
        BinOp::Neq => primitive_binary_type(left, BinOp::Eq, right, types),
        BinOp::Gt => primitive_binary_type(right, BinOp::Lt, left, types),
        BinOp::Leq | BinOp::Geq => {
            primitive_binary_type(left, BinOp::Lt, right, types)?;
            primitive_binary_type(left, BinOp::Eq, right, types)
        }
        _ => primitive_binary_type(left, op, right, types),
    }
}

pub fn unary_op_type<'a>(
    op: UnaryOp,
    right: &'a Type<'a>,
    types: &TypeManager<'a>,
) -> Option<&'a Type<'a>> {
    match (op, right) {
        (UnaryOp::Neg, Type::Int) => Some(types.int()),
        (UnaryOp::Neg, Type::Float) => Some(types.float()),
        (UnaryOp::Not, Type::Bool) => Some(types.bool()),
        _ => None,
    }
}

fn primitive_binary_result<'a>(
    left: Value<'a>,
    op: BinOp,
    right: Value<'a>,
) -> Result<Value<'a>, OpError> {
    use BinOp::*;
    use Value::*;
    match (left, op, right) {
        (Int(l), Eq, Int(r)) => Ok(Bool(l == r)),
        (Float(l), Eq, Float(r)) => Ok(Bool(l == r)),
        (Bool(l), Eq, Bool(r)) => Ok(Bool(l == r)),
        (Unit, Eq, Unit) => Ok(Bool(true)),
        (Int(l), Lt, Int(r)) => Ok(Bool(l < r)),
        (Float(l), Lt, Float(r)) => Ok(Bool(l < r)),
        (Bool(l), And, Bool(r)) => Ok(Bool(l && r)),
        (Bool(l), Or, Bool(r)) => Ok(Bool(l || r)),
        // Int arithmetic wraps on overflow.
        (Int(l), Add, Int(r)) => Ok(Int(l.wrapping_add(r))),
        (Int(l), Sub, Int(r)) => Ok(Int(l.wrapping_sub(r))),
        (Int(l), Mul, Int(r)) => Ok(Int(l.wrapping_mul(r))),
        (Int(l), Div, Int(r)) => {
            if r == 0 {
                Err(OpError::DivisionByZero)
            } else {
                Ok(Int(l.wrapping_div(r)))
            }
        }
        (Int(l), Mod, Int(r)) => {
            if r == 0 {
                Err(OpError::DivisionByZero)
            } else {
                Ok(Int(l.wrapping_rem(r)))
            }
        }
        (Float(l), Add, Float(r)) => Ok(Float(l + r)),
        (Float(l), Sub, Float(r)) => Ok(Float(l - r)),
        (Float(l), Mul, Float(r)) => Ok(Float(l * r)),
        (Float(l), Div, Float(r)) => Ok(Float(l / r)),
        _ => Err(OpError::Undefined),
    }
}

fn as_bool(value: Value<'_>) -> Result<bool, OpError> {
    value.as_bool().ok_or(OpError::Undefined)
}

/// Computes `left op right`, deriving the non-primitive comparisons the same
/// way [`binary_op_type`] types them.
pub fn binary_op_result<'a>(
    left: Value<'a>,
    op: BinOp,
    right: Value<'a>,
) -> Result<Value<'a>, OpError> {
    match op {
        BinOp::Neq => {
            let eq = as_bool(primitive_binary_result(left, BinOp::Eq, right)?)?;
            Ok(Value::Bool(!eq))
        }
        BinOp::Gt => primitive_binary_result(right, BinOp::Lt, left),
        BinOp::Leq => {
            let lt = as_bool(primitive_binary_result(left, BinOp::Lt, right)?)?;
            let eq = as_bool(primitive_binary_result(left, BinOp::Eq, right)?)?;
            Ok(Value::Bool(lt || eq))
        }
        BinOp::Geq => {
            let gt = as_bool(primitive_binary_result(right, BinOp::Lt, left)?)?;
            let eq = as_bool(primitive_binary_result(left, BinOp::Eq, right)?)?;
            Ok(Value::Bool(gt || eq))
        }
        _ => primitive_binary_result(left, op, right),
    }
}

pub fn unary_op_result(op: UnaryOp, right: Value<'_>) -> Result<Value<'_>, OpError> {
    match (op, right) {
        (UnaryOp::Neg, Value::Int(v)) => Ok(Value::Int(v.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnaryOp::Not, Value::Bool(v)) => Ok(Value::Bool(!v)),
        _ => Err(OpError::Undefined),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    fn int(v: i64) -> Value<'static> {
        Value::Int(v)
    }

    fn boolean(v: bool) -> Value<'static> {
        Value::Bool(v)
    }

    #[test]
    fn int_arithmetic() {
        assert_eq!(binary_op_result(int(7), BinOp::Add, int(5)), Ok(int(12)));
        assert_eq!(binary_op_result(int(7), BinOp::Sub, int(5)), Ok(int(2)));
        assert_eq!(binary_op_result(int(7), BinOp::Mul, int(5)), Ok(int(35)));
        assert_eq!(binary_op_result(int(7), BinOp::Div, int(5)), Ok(int(1)));
        assert_eq!(binary_op_result(int(7), BinOp::Mod, int(5)), Ok(int(2)));
    }

    #[test]
    fn int_arithmetic_wraps() {
        assert_eq!(
            binary_op_result(int(i64::MAX), BinOp::Add, int(1)),
            Ok(int(i64::MIN))
        );
        assert_eq!(
            binary_op_result(int(i64::MIN), BinOp::Div, int(-1)),
            Ok(int(i64::MIN))
        );
    }

    #[test]
    fn division_by_zero_is_its_own_error() {
        assert_eq!(
            binary_op_result(int(1), BinOp::Div, int(0)),
            Err(OpError::DivisionByZero)
        );
        assert_eq!(
            binary_op_result(int(1), BinOp::Mod, int(0)),
            Err(OpError::DivisionByZero)
        );
    }

    #[test]
    fn derived_comparisons() {
        assert_eq!(binary_op_result(int(1), BinOp::Neq, int(2)), Ok(boolean(true)));
        assert_eq!(binary_op_result(int(2), BinOp::Gt, int(1)), Ok(boolean(true)));
        assert_eq!(binary_op_result(int(2), BinOp::Leq, int(2)), Ok(boolean(true)));
        assert_eq!(binary_op_result(int(3), BinOp::Leq, int(2)), Ok(boolean(false)));
        assert_eq!(binary_op_result(int(2), BinOp::Geq, int(2)), Ok(boolean(true)));
        assert_eq!(binary_op_result(int(1), BinOp::Geq, int(2)), Ok(boolean(false)));
    }

    #[test]
    fn comparisons_on_unsupported_values() {
        assert_eq!(
            binary_op_result(boolean(true), BinOp::Lt, boolean(false)),
            Err(OpError::Undefined)
        );
        // != only needs =, which bool has
        assert_eq!(
            binary_op_result(boolean(true), BinOp::Neq, boolean(false)),
            Ok(boolean(true))
        );
    }

    #[test]
    fn mixed_operand_types_are_undefined() {
        assert_eq!(
            binary_op_result(int(1), BinOp::Add, Value::Float(2.0)),
            Err(OpError::Undefined)
        );
        assert_eq!(
            binary_op_result(int(1), BinOp::And, int(2)),
            Err(OpError::Undefined)
        );
    }

    #[test]
    fn unary_results() {
        assert_eq!(unary_op_result(UnaryOp::Neg, int(3)), Ok(int(-3)));
        assert_eq!(
            unary_op_result(UnaryOp::Not, boolean(false)),
            Ok(boolean(true))
        );
        assert_eq!(unary_op_result(UnaryOp::Not, int(1)), Err(OpError::Undefined));
    }

    #[test]
    fn type_table_matches_value_table() {
        let arena = Bump::new();
        let types = crate::types::TypeManager::new(&arena);
        let int_ty = types.int();
        let float_ty = types.float();
        let bool_ty = types.bool();

        assert_eq!(binary_op_type(int_ty, BinOp::Add, int_ty, types), Some(int_ty));
        assert_eq!(
            binary_op_type(float_ty, BinOp::Mul, float_ty, types),
            Some(float_ty)
        );
        // comparisons always produce bool
        for op in [BinOp::Eq, BinOp::Neq, BinOp::Lt, BinOp::Gt, BinOp::Leq, BinOp::Geq] {
            assert_eq!(binary_op_type(int_ty, op, int_ty, types), Some(bool_ty));
        }
        // bool has equality but no ordering
        assert_eq!(binary_op_type(bool_ty, BinOp::Neq, bool_ty, types), Some(bool_ty));
        assert_eq!(binary_op_type(bool_ty, BinOp::Lt, bool_ty, types), None);
        assert_eq!(binary_op_type(bool_ty, BinOp::Leq, bool_ty, types), None);
        // float has no modulo
        assert_eq!(binary_op_type(float_ty, BinOp::Mod, float_ty, types), None);
        // no mixed arithmetic
        assert_eq!(binary_op_type(int_ty, BinOp::Add, float_ty, types), None);

        assert_eq!(unary_op_type(UnaryOp::Neg, int_ty, types), Some(int_ty));
        assert_eq!(unary_op_type(UnaryOp::Not, bool_ty, types), Some(bool_ty));
        assert_eq!(unary_op_type(UnaryOp::Not, int_ty, types), None);
    }
}
