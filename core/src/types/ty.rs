use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

/// A type in the language. All compound types hold arena references, so a
/// `Type` is `Copy` and a checked program's types live exactly as long as
/// its arena.
///
/// Base and structural types are interned by the
/// [`TypeManager`](super::TypeManager) and can be compared by pointer;
/// variant and record types are nominal and compare by name.
#[derive(Debug, Clone, Copy)]
pub enum Type<'a> {
    Int,
    Float,
    Bool,
    Unit,
    Arrow(&'a Type<'a>, &'a Type<'a>),
    Tuple(&'a [&'a Type<'a>]),
    Variant {
        name: &'a str,
        cases: &'a [(&'a str, Option<&'a Type<'a>>)],
    },
    Record {
        name: &'a str,
        fields: &'a [(&'a str, &'a Type<'a>)],
    },
}

impl<'a> Type<'a> {
    pub fn is_arrow(&self) -> bool {
        matches!(self, Type::Arrow(..))
    }

    pub fn as_arrow(&self) -> Option<(&'a Type<'a>, &'a Type<'a>)> {
        match self {
            Type::Arrow(dom, cod) => Some((dom, cod)),
            _ => None,
        }
    }
}

impl PartialEq for Type<'_> {
    fn eq(&self, other: &Self) -> bool {
        // Interned types make the pointer fast path hit almost always.
        if std::ptr::eq(self, other) {
            return true;
        }
        match (self, other) {
            (Type::Int, Type::Int)
            | (Type::Float, Type::Float)
            | (Type::Bool, Type::Bool)
            | (Type::Unit, Type::Unit) => true,
            (Type::Arrow(d1, c1), Type::Arrow(d2, c2)) => d1 == d2 && c1 == c2,
            (Type::Tuple(t1), Type::Tuple(t2)) => t1 == t2,
            (Type::Variant { name: n1, .. }, Type::Variant { name: n2, .. }) => n1 == n2,
            (Type::Record { name: n1, .. }, Type::Record { name: n2, .. }) => n1 == n2,
            _ => false,
        }
    }
}

impl Eq for Type<'_> {}

impl Hash for Type<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Type::Int | Type::Float | Type::Bool | Type::Unit => {}
            Type::Arrow(dom, cod) => {
                dom.hash(state);
                cod.hash(state);
            }
            Type::Tuple(types) => {
                for ty in *types {
                    ty.hash(state);
                }
            }
            Type::Variant { name, .. } | Type::Record { name, .. } => name.hash(state),
        }
    }
}

impl fmt::Display for Type<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::Bool => f.write_str("bool"),
            Type::Unit => f.write_str("unit"),
            Type::Arrow(dom, cod) => {
                // Arrows are right associative, so only a left arrow needs
                // parentheses.
                if dom.is_arrow() {
                    write!(f, "({dom}) -> {cod}")
                } else {
                    write!(f, "{dom} -> {cod}")
                }
            }
            Type::Tuple(types) => {
                f.write_str("(")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" * ")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str(")")
            }
            Type::Variant { name, .. } | Type::Record { name, .. } => f.write_str(name),
        }
    }
}
