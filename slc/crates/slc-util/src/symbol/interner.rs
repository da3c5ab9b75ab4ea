//! The global string table backing [`Symbol`].
//!
//! Reads go through a `DashMap` keyed with `ahash` so concurrent interning
//! needs no global lock; the reverse index (symbol -> string) is a plain
//! vector behind an `RwLock` that is only write-locked when a *new* string
//! is seen. Interned strings are leaked to obtain `'static` references;
//! the set of distinct names in a compilation is bounded, so this is a
//! deliberate leak-on-purpose strategy.

use std::sync::{LazyLock, RwLock};

use dashmap::DashMap;

use super::Symbol;

static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(StringTable::new);

pub(super) fn table() -> &'static StringTable {
    &STRING_TABLE
}

pub(super) struct StringTable {
    /// string -> index, lock-free for the common already-interned case
    names: DashMap<&'static str, u32, ahash::RandomState>,
    /// index -> string
    strings: RwLock<Vec<&'static str>>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            names: DashMap::with_capacity_and_hasher(256, ahash::RandomState::new()),
            strings: RwLock::new(Vec::with_capacity(256)),
        }
    }

    pub(super) fn intern(&self, string: &str) -> Symbol {
        if let Some(index) = self.names.get(string) {
            return Symbol::from_index(*index);
        }

        let mut strings = self.strings.write().expect("string table poisoned");
        // another thread may have interned it while we waited for the lock
        if let Some(index) = self.names.get(string) {
            return Symbol::from_index(*index);
        }

        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = u32::try_from(strings.len()).expect("string table overflow");
        strings.push(leaked);
        self.names.insert(leaked, index);
        Symbol::from_index(index)
    }

    pub(super) fn resolve(&self, symbol: Symbol) -> &'static str {
        let strings = self.strings.read().expect("string table poisoned");
        strings[symbol.as_u32() as usize]
    }
}
