use std::cell::RefCell;

use bumpalo::Bump;
use hashbrown::HashMap;

use super::Type;

/// Arena-backed type interner.
///
/// Base and structural types (`int`, arrows, tuples) are hash-consed, so
/// equal types are also pointer-equal and repeated construction is free.
/// Nominal types (records and variants) are allocated once per declaration
/// and never interned; their identity is their name.
///
/// The manager itself lives in the arena it interns into, which ties its
/// borrow to `'a` and lets it hand out `&'a Type<'a>` from `&self`.
pub struct TypeManager<'a> {
    arena: &'a Bump,
    interned: RefCell<HashMap<Type<'a>, &'a Type<'a>>>,
    interned_strs: RefCell<HashMap<&'a str, &'a str>>,
}

impl<'a> TypeManager<'a> {
    pub fn new(arena: &'a Bump) -> &'a Self {
        arena.alloc(TypeManager {
            arena,
            interned: RefCell::new(HashMap::new()),
            interned_strs: RefCell::new(HashMap::new()),
        })
    }

    fn intern(&self, ty: Type<'a>) -> &'a Type<'a> {
        *self
            .interned
            .borrow_mut()
            .entry(ty)
            .or_insert_with(|| self.arena.alloc(ty))
    }

    /// Copies a string into the arena, one copy per distinct content.
    pub fn intern_str(&self, s: &str) -> &'a str {
        if let Some(interned) = self.interned_strs.borrow().get(s) {
            return interned;
        }
        let stored = self.arena.alloc_str(s);
        self.interned_strs.borrow_mut().insert(stored, stored);
        stored
    }

    pub fn int(&self) -> &'a Type<'a> {
        self.intern(Type::Int)
    }

    pub fn float(&self) -> &'a Type<'a> {
        self.intern(Type::Float)
    }

    pub fn bool(&self) -> &'a Type<'a> {
        self.intern(Type::Bool)
    }

    pub fn unit(&self) -> &'a Type<'a> {
        self.intern(Type::Unit)
    }

    pub fn arrow(&self, dom: &'a Type<'a>, cod: &'a Type<'a>) -> &'a Type<'a> {
        self.intern(Type::Arrow(dom, cod))
    }

    pub fn tuple(&self, elems: &[&'a Type<'a>]) -> &'a Type<'a> {
        let elems = self.arena.alloc_slice_copy(elems);
        self.intern(Type::Tuple(elems))
    }

    /// Allocates a fresh nominal record type. Not interned; the caller is
    /// responsible for rejecting duplicate names.
    pub fn record(
        &self,
        name: &'a str,
        fields: &[(&'a str, &'a Type<'a>)],
    ) -> &'a Type<'a> {
        let fields = self.arena.alloc_slice_copy(fields);
        self.arena.alloc(Type::Record { name, fields })
    }

    /// Allocates a fresh nominal variant type.
    pub fn variant(
        &self,
        name: &'a str,
        cases: &[(&'a str, Option<&'a Type<'a>>)],
    ) -> &'a Type<'a> {
        let cases = self.arena.alloc_slice_copy(cases);
        self.arena.alloc(Type::Variant { name, cases })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_types_are_pointer_equal() {
        let arena = Bump::new();
        let types = TypeManager::new(&arena);
        assert!(std::ptr::eq(types.int(), types.int()));
        assert!(std::ptr::eq(types.bool(), types.bool()));
        assert!(!std::ptr::eq(types.int(), types.float()));
    }

    #[test]
    fn arrows_and_tuples_are_interned() {
        let arena = Bump::new();
        let types = TypeManager::new(&arena);
        let a = types.arrow(types.int(), types.bool());
        let b = types.arrow(types.int(), types.bool());
        assert!(std::ptr::eq(a, b));

        let t1 = types.tuple(&[types.int(), types.float()]);
        let t2 = types.tuple(&[types.int(), types.float()]);
        assert!(std::ptr::eq(t1, t2));
        assert_ne!(t1, types.tuple(&[types.float(), types.int()]));
    }

    #[test]
    fn interned_strings_share_storage() {
        let arena = Bump::new();
        let types = TypeManager::new(&arena);
        let a = types.intern_str("hello");
        let b = types.intern_str(&format!("hel{}", "lo"));
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn nominal_types_are_not_interned() {
        let arena = Bump::new();
        let types = TypeManager::new(&arena);
        let name = types.intern_str("point");
        let fields = [(types.intern_str("x"), types.int())];
        let a = types.record(name, &fields);
        let b = types.record(name, &fields);
        assert!(!std::ptr::eq(a, b));
        assert_eq!(a, b); // but they still compare equal by name
    }
}
