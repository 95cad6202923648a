//! Expiry Index
//!
//! An ordered set of `(alias, expires_at)` pairs, soonest deadline first.
//! The sweeper only ever looks at the head, so the structure is optimized
//! for peek/pop of the minimum while still allowing removal by alias when a
//! link is renewed, renamed or deleted.
//!
//! ## Layout
//!
//! ```text
//!   order:   BTreeMap<(Instant, seq), alias>     sorted by deadline, then insertion
//!   handles: HashMap<alias, (Instant, seq)>      alias -> its key in `order`
//! ```
//!
//! The monotonically increasing `seq` makes every key unique and keeps ties
//! in insertion order. All operations are O(log n).

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

type OrderKey = (Instant, u64);

/// One entry of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryEntry {
    pub alias: String,
    pub expires_at: Instant,
}

/// Deadline-ordered index with at most one entry per alias.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    order: BTreeMap<OrderKey, String>,
    handles: HashMap<String, OrderKey>,
    next_seq: u64,
}

impl ExpiryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `alias` with the given deadline.
    ///
    /// An existing entry for the same alias is removed first, so the index
    /// never holds a stale earlier deadline for a renewed alias.
    pub fn insert(&mut self, alias: &str, expires_at: Instant) {
        self.remove(alias);

        let key = (expires_at, self.next_seq);
        self.next_seq += 1;

        self.order.insert(key, alias.to_string());
        self.handles.insert(alias.to_string(), key);
    }

    /// Removes the entry for `alias`. Returns whether one existed.
    pub fn remove(&mut self, alias: &str) -> bool {
        match self.handles.remove(alias) {
            Some(key) => {
                self.order.remove(&key);
                true
            }
            None => false,
        }
    }

    /// The entry with the soonest deadline.
    pub fn peek_min(&self) -> Option<ExpiryEntry> {
        self.order
            .first_key_value()
            .map(|(&(expires_at, _), alias)| ExpiryEntry {
                alias: alias.clone(),
                expires_at,
            })
    }

    /// Removes and returns the entry with the soonest deadline.
    pub fn pop_min(&mut self) -> Option<ExpiryEntry> {
        let ((expires_at, _), alias) = self.order.pop_first()?;
        self.handles.remove(&alias);
        Some(ExpiryEntry { alias, expires_at })
    }

    /// The deadline currently indexed for `alias`.
    pub fn deadline(&self, alias: &str) -> Option<Instant> {
        self.handles.get(alias).map(|&(expires_at, _)| expires_at)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.handles.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.handles.clear();
    }

    /// Aliases in deadline order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pop_in_deadline_order() {
        let base = Instant::now();
        let mut index = ExpiryIndex::new();

        index.insert("c", base + Duration::from_secs(30));
        index.insert("a", base + Duration::from_secs(10));
        index.insert("b", base + Duration::from_secs(20));

        assert_eq!(index.peek_min().unwrap().alias, "a");
        assert_eq!(index.pop_min().unwrap().alias, "a");
        assert_eq!(index.pop_min().unwrap().alias, "b");
        assert_eq!(index.pop_min().unwrap().alias, "c");
        assert!(index.pop_min().is_none());
        assert!(index.peek_min().is_none());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut index = ExpiryIndex::new();

        for alias in ["first", "second", "third"] {
            index.insert(alias, deadline);
        }

        let order: Vec<&str> = index.aliases().collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_reinsert_replaces_old_entry() {
        let base = Instant::now();
        let mut index = ExpiryIndex::new();

        index.insert("a", base + Duration::from_secs(1));
        index.insert("b", base + Duration::from_secs(2));
        index.insert("a", base + Duration::from_secs(3));

        assert_eq!(index.len(), 2);
        assert_eq!(index.deadline("a"), Some(base + Duration::from_secs(3)));
        assert_eq!(index.pop_min().unwrap().alias, "b");
        assert_eq!(index.pop_min().unwrap().alias, "a");
    }

    #[test]
    fn test_remove() {
        let base = Instant::now();
        let mut index = ExpiryIndex::new();

        index.insert("a", base);
        assert!(index.contains("a"));
        assert!(index.remove("a"));
        assert!(!index.remove("a"));
        assert!(index.is_empty());
        assert_eq!(index.deadline("a"), None);
    }

    #[test]
    fn test_pop_clears_handle() {
        let mut index = ExpiryIndex::new();
        index.insert("a", Instant::now());

        let entry = index.pop_min().unwrap();
        assert_eq!(entry.alias, "a");
        assert!(!index.contains("a"));
        assert!(!index.remove("a"));
    }

    #[test]
    fn test_clear() {
        let mut index = ExpiryIndex::new();
        index.insert("a", Instant::now());
        index.insert("b", Instant::now());
        index.clear();

        assert!(index.is_empty());
        assert!(!index.contains("a"));
    }
}
