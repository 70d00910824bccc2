//! Bidirectional type checker.

#[allow(clippy::module_inception)]
mod analyzer;
#[cfg(test)]
mod analyzer_test;

pub use analyzer::Analyzer;
