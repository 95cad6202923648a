//! Reverse Index
//!
//! Maps each target back to the set of aliases currently pointing at it.
//! A target with no aliases has no entry at all.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct ReverseIndex {
    targets: HashMap<String, HashSet<String>>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `alias` under `target`.
    pub fn insert(&mut self, target: &str, alias: &str) {
        self.targets
            .entry(target.to_string())
            .or_default()
            .insert(alias.to_string());
    }

    /// Removes `alias` from `target`'s set, dropping the set once empty.
    pub fn remove(&mut self, target: &str, alias: &str) -> bool {
        let Some(aliases) = self.targets.get_mut(target) else {
            return false;
        };

        let removed = aliases.remove(alias);
        if aliases.is_empty() {
            self.targets.remove(target);
        }
        removed
    }

    /// Aliases pointing at `target`, if any.
    pub fn aliases(&self, target: &str) -> Option<&HashSet<String>> {
        self.targets.get(target)
    }

    /// Number of distinct targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashSet<String>)> {
        self.targets.iter()
    }
}
