//! Deletion detection by set difference
//!
//! A deletion-aware adapter notes every key it sees while processing, then
//! compares that set against the keys stored locally for the same scope.
//! Whatever is stored but was not seen has been deleted upstream.

use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

use parking_lot::Mutex;

/// Keys observed during a run. Shared across `process_item` calls.
#[derive(Debug, Default)]
pub struct SeenKeys<K> {
    keys: Mutex<HashSet<K>>,
}

impl<K: Eq + Hash + Clone> SeenKeys<K> {
    pub fn new() -> Self {
        Self { keys: Mutex::new(HashSet::new()) }
    }

    pub fn insert(&self, key: K) {
        self.keys.lock().insert(key);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.keys.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }

    /// Drain the collected keys, leaving the set empty for the next run.
    pub fn take(&self) -> HashSet<K> {
        std::mem::take(&mut *self.keys.lock())
    }
}

/// Result of comparing local keys against freshly fetched ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan<K: Ord> {
    /// Stored locally, absent upstream.
    pub deleted: BTreeSet<K>,
    /// Present on both sides.
    pub retained: BTreeSet<K>,
    /// New upstream.
    pub added: BTreeSet<K>,
}

impl<K: Ord + Clone> DeletionPlan<K> {
    pub fn compute<'a>(
        local: impl IntoIterator<Item = &'a K>,
        fetched: impl IntoIterator<Item = &'a K>,
    ) -> Self
    where
        K: 'a,
    {
        let local: BTreeSet<K> = local.into_iter().cloned().collect();
        let fetched: BTreeSet<K> = fetched.into_iter().cloned().collect();

        Self {
            deleted: local.difference(&fetched).cloned().collect(),
            retained: local.intersection(&fetched).cloned().collect(),
            added: fetched.difference(&local).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_but_unseen_keys_are_deleted() {
        let local = [1, 2, 3, 4];
        let fetched = [2, 3, 5];
        let plan = DeletionPlan::compute(&local, &fetched);

        assert_eq!(plan.deleted, BTreeSet::from([1, 4]));
        assert_eq!(plan.retained, BTreeSet::from([2, 3]));
        assert_eq!(plan.added, BTreeSet::from([5]));
    }

    #[test]
    fn seen_keys_drain_between_runs() {
        let seen = SeenKeys::new();
        seen.insert("a".to_string());
        seen.insert("a".to_string());
        seen.insert("b".to_string());
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&"b".to_string()));

        let drained = seen.take();
        assert_eq!(drained.len(), 2);
        assert!(seen.is_empty());
    }
}
