use std::borrow::Borrow;
use std::hash::Hash;

use dashmap::DashMap;
use once_cell::sync::Lazy;

type Hasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// A process-wide, append-only table mapping a canonical key to its single
/// shared instance. Entries are never removed.
pub(crate) struct Table<K, V> {
    map: Lazy<DashMap<K, V, Hasher>>,
}

impl<K: Eq + Hash, V: Clone> Table<K, V> {
    pub const fn new() -> Self {
        Table { map: Lazy::new(DashMap::default) }
    }

    /// Returns the interned value for `key`, calling `make` to produce the
    /// owned key and value only if `key` isn't present yet. If two callers
    /// race, the first insert wins and both observe the same value.
    pub fn intern<Q, F>(&self, key: &Q, make: F) -> V
        where K: Borrow<Q>, Q: Hash + Eq + ?Sized, F: FnOnce() -> (K, V)
    {
        if let Some(existing) = self.map.get(key) {
            return existing.value().clone();
        }

        let (key, value) = make();
        self.map.entry(key).or_insert(value).value().clone()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.map.len()
    }
}
