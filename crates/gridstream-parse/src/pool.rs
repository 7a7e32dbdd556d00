//! Process-lifetime string intern pool.
//!
//! Interned strings are handed out as [`InternedStr`] handles that stay valid
//! and dereference to the same bytes for as long as any handle (or the pool)
//! is alive. The pool never relocates an inserted buffer, so handles obtained
//! before a [`StringPool::merge`] remain usable afterwards.

use std::collections::HashSet;
use std::sync::Arc;

/// A stable, cheaply clonable view of an interned string.
pub type InternedStr = Arc<str>;

/// Hash set of owned, immutable string buffers.
#[derive(Debug, Default)]
pub struct StringPool {
    store: HashSet<InternedStr>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string.
    ///
    /// Returns the stable view together with a flag that is `true` when the
    /// string was not previously present in the pool.
    pub fn intern(&mut self, s: &str) -> (InternedStr, bool) {
        if let Some(existing) = self.store.get(s) {
            return (Arc::clone(existing), false);
        }
        let owned: InternedStr = Arc::from(s);
        self.store.insert(Arc::clone(&owned));
        (owned, true)
    }

    /// Number of unique strings held by the pool.
    pub fn size(&self) -> usize {
        self.store.len()
    }

    /// Drop all entries. Handles held by callers remain valid; they simply
    /// no longer participate in deduplication.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Move the contents of another pool into this one. The other pool is
    /// left empty, and none of its previously returned views are
    /// invalidated.
    pub fn merge(&mut self, other: &mut StringPool) {
        for s in other.store.drain() {
            self.store.insert(s);
        }
    }

    /// All interned strings, sorted, for deterministic output.
    pub fn interned_strings(&self) -> Vec<InternedStr> {
        let mut all: Vec<InternedStr> = self.store.iter().cloned().collect();
        all.sort();
        all
    }
}
