//! Type representation and interning.

mod manager;
mod ty;

pub use manager::TypeManager;
pub use ty::Type;
