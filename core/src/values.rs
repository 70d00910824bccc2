//! Runtime values.

use std::fmt;

use crate::ast::Expr;
use crate::types::Type;

/// A function value: the `fun` node it came from plus the flattened
/// environment it captured. `self_name` is set for closures built by `fix`
/// and rebinds the closure itself on every application, which is what makes
/// recursion tie its own knot.
#[derive(Debug, Clone, Copy)]
pub struct Closure<'a> {
    pub fun: &'a Expr<'a>,
    pub env: &'a [(&'a str, Value<'a>)],
    pub self_name: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub enum Value<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    Unit,
    Closure(&'a Closure<'a>),
    Tuple(&'a [Value<'a>]),
    Record {
        ty: &'a Type<'a>,
        fields: &'a [(&'a str, Value<'a>)],
    },
}

/// Structural equality for data, identity for closures. This is the
/// equality used by tests and value display plumbing; the language's own
/// `=` operator goes through the operator table and never compares
/// functions.
impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(l), Value::Int(r)) => l == r,
            (Value::Float(l), Value::Float(r)) => l == r,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Unit, Value::Unit) => true,
            (Value::Closure(l), Value::Closure(r)) => std::ptr::eq(*l, *r),
            (Value::Tuple(l), Value::Tuple(r)) => l == r,
            (
                Value::Record { ty: lt, fields: lf },
                Value::Record { ty: rt, fields: rf },
            ) => lt == rt && lf == rf,
            _ => false,
        }
    }
}

impl<'a> Value<'a> {
    /// The value's type as shown in runtime error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Int(_) => "int".to_owned(),
            Value::Float(_) => "float".to_owned(),
            Value::Bool(_) => "bool".to_owned(),
            Value::Unit => "unit".to_owned(),
            Value::Closure(_) => "function".to_owned(),
            Value::Tuple(_) => "tuple".to_owned(),
            Value::Record { ty, .. } => ty.to_string(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Unit => f.write_str("()"),
            Value::Closure(closure) => write!(f, "{}", closure.fun),
            Value::Tuple(elems) => {
                f.write_str("(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                f.write_str(")")
            }
            Value::Record { fields, .. } => {
                f.write_str("{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name} = {value}")?;
                }
                f.write_str(" }")
            }
        }
    }
}
