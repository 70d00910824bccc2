//! Pratt parser.
//!
//! Expressions are parsed with a binding-power loop. Function application is
//! the subtle case: there is no application token, so after each complete
//! left-hand side the parser speculatively tries to parse an argument with
//! error reporting suppressed, rolling the cursor back if nothing is there.
//! Leading `type` declarations populate the type table consulted by type
//! expressions and record literals.

mod expr;

pub use expr::Parser;

/// Left/right binding powers. A higher right power than left makes an
/// operator left associative; the reverse makes it right associative.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BindingPower {
    pub left: u8,
    pub right: u8,
}

impl BindingPower {
    /// Function application binds tighter than any operator and associates
    /// to the left.
    pub fn fun_ap() -> Self {
        BindingPower { left: 60, right: 61 }
    }
}
