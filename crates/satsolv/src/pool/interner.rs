use indexmap::IndexSet;
use std::fmt;

/// An interned string. `Id::EMPTY` is the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Id(u32);

impl Id {
    pub const EMPTY: Id = Id(0);

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Deduplicating string store. Ids are never reused while the interner lives.
#[derive(Debug, Clone)]
pub struct Interner {
    strings: IndexSet<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        let mut strings = IndexSet::new();
        strings.insert(Box::from(""));
        Self { strings }
    }

    /// Intern a string, returning the existing id if it is already known
    pub fn intern(&mut self, s: &str) -> Id {
        if let Some(index) = self.strings.get_index_of(s) {
            return Id(index as u32);
        }
        let (index, _) = self.strings.insert_full(Box::from(s));
        Id(index as u32)
    }

    /// Look up a string without interning it
    pub fn lookup(&self, s: &str) -> Option<Id> {
        self.strings.get_index_of(s).map(|index| Id(index as u32))
    }

    /// Resolve an id; unknown ids resolve to the empty string
    pub fn resolve(&self, id: Id) -> &str {
        self.strings.get_index(id.0 as usize).map(|s| &**s).unwrap_or("")
    }

    pub fn contains(&self, id: Id) -> bool {
        (id.0 as usize) < self.strings.len()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern("glibc");
        let b = interner.intern("glibc");
        let c = interner.intern("zlib");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "glibc");
        assert_eq!(interner.resolve(c), "zlib");
    }

    #[test]
    fn test_empty_string_is_reserved() {
        let mut interner = Interner::new();
        assert!(interner.is_empty());
        assert_eq!(interner.intern(""), Id::EMPTY);
        assert_eq!(interner.resolve(Id::EMPTY), "");
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let mut interner = Interner::new();
        assert_eq!(interner.lookup("foo"), None);
        let id = interner.intern("foo");
        assert_eq!(interner.lookup("foo"), Some(id));
        assert_eq!(interner.len(), 2);
    }
}
