//! Tree-walking evaluator.

mod eval;
pub mod op_table;

pub use eval::Evaluator;
