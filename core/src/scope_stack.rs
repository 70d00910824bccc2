//! Flat scope stack shared by the analyzer (names to types) and the
//! evaluator (names to values).
//!
//! Scopes are a single vector of bindings; entering a scope pushes and
//! leaving it pops, and lookup scans innermost-first so shadowing falls out
//! of the ordering.

use hashbrown::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("scope stack underflow")]
pub struct PopError;

#[derive(Debug, Clone, Default)]
pub struct ScopeStack<'a, T: Copy> {
    bindings: Vec<(&'a str, T)>,
}

impl<'a, T: Copy> ScopeStack<'a, T> {
    pub fn new() -> Self {
        ScopeStack {
            bindings: Vec::new(),
        }
    }

    /// A stack primed with the given bindings, later entries innermost.
    pub fn from_bindings(bindings: &[(&'a str, T)]) -> Self {
        ScopeStack {
            bindings: bindings.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn push(&mut self, name: &'a str, value: T) {
        self.bindings.push((name, value));
    }

    pub fn pop(&mut self) -> Result<(), PopError> {
        self.bindings.pop().map(|_| ()).ok_or(PopError)
    }

    /// Innermost binding for `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<T> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| *value)
    }

    /// Snapshot of the visible bindings with shadowed entries dropped, for
    /// capture in closures. Names are unique in the result, so its ordering
    /// no longer matters for lookup.
    pub fn flatten(&self) -> Vec<(&'a str, T)> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (name, value) in self.bindings.iter().rev() {
            if seen.insert(*name) {
                out.push((*name, *value));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_innermost() {
        let mut scopes: ScopeStack<i32> = ScopeStack::new();
        scopes.push("x", 1);
        scopes.push("y", 2);
        scopes.push("x", 3);
        assert_eq!(scopes.lookup("x"), Some(3));
        assert_eq!(scopes.lookup("y"), Some(2));
        assert_eq!(scopes.lookup("z"), None);
    }

    #[test]
    fn pop_restores_shadowed_binding() {
        let mut scopes: ScopeStack<i32> = ScopeStack::new();
        scopes.push("x", 1);
        scopes.push("x", 2);
        assert_eq!(scopes.lookup("x"), Some(2));
        scopes.pop().unwrap();
        assert_eq!(scopes.lookup("x"), Some(1));
        scopes.pop().unwrap();
        assert_eq!(scopes.lookup("x"), None);
        assert_eq!(scopes.pop(), Err(PopError));
    }

    #[test]
    fn flatten_dedupes_shadowed_names() {
        let mut scopes: ScopeStack<i32> = ScopeStack::new();
        scopes.push("x", 1);
        scopes.push("y", 2);
        scopes.push("x", 3);
        let mut flat = scopes.flatten();
        flat.sort();
        assert_eq!(flat, vec![("x", 3), ("y", 2)]);
    }

    #[test]
    fn from_bindings_round_trips_through_flatten() {
        let mut scopes: ScopeStack<i32> = ScopeStack::new();
        scopes.push("a", 1);
        scopes.push("b", 2);
        scopes.push("a", 3);
        let captured = ScopeStack::from_bindings(&scopes.flatten());
        assert_eq!(captured.lookup("a"), Some(3));
        assert_eq!(captured.lookup("b"), Some(2));
    }
}
