//! Overlay Cache Module
//!
//! A transaction-scoped local cache layered over a shared master cache.
//! Writes stay local until the overlay is merged; dropping the overlay
//! discards them.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use crate::cache::{BoundedCache, MergeOutcome};

// == Overlay Cache ==
/// Local writes over a read-through master.
///
/// Read precedence: a local value, then a local invalidation (which hides any
/// master value), then the master.
#[derive(Debug)]
pub struct OverlayCache<K, V> {
    local: BoundedCache<K, V>,
    master: Arc<BoundedCache<K, V>>,
    invalidated: HashSet<K>,
    fully_invalidated: bool,
}

impl<K, V> OverlayCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    // == Constructors ==
    /// Creates an overlay reading through to `master`, sized like the master.
    pub fn new(master: Arc<BoundedCache<K, V>>) -> Self {
        Self {
            local: BoundedCache::new(format!("{}.local", master.name()), master.capacity()),
            master,
            invalidated: HashSet::new(),
            fully_invalidated: false,
        }
    }

    // == Get ==
    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(value) = self.local.get(key) {
            return Some(value);
        }

        if self.fully_invalidated || self.invalidated.contains(key) {
            return None;
        }

        self.master.get(key)
    }

    // == Put ==
    /// Caches locally. The master is never touched before merge.
    pub fn put(&mut self, key: K, value: V) {
        self.local.put(key, value);
    }

    // == Invalidate ==
    /// Hides `key` from this overlay and schedules its removal from the master.
    pub fn invalidate(&mut self, key: &K) {
        self.local.remove(key);
        self.invalidated.insert(key.clone());
    }

    // == Invalidate All ==
    /// Clears local state and stops reading through. The master is cleared at merge.
    pub fn invalidate_all(&mut self) {
        self.local.invalidate_all();
        self.invalidated.clear();
        self.fully_invalidated = true;
    }

    pub fn is_fully_invalidated(&self) -> bool {
        self.fully_invalidated
    }

    pub fn pending_invalidations(&self) -> usize {
        self.invalidated.len()
    }

    pub fn local_size(&self) -> usize {
        self.local.size()
    }

    pub fn master(&self) -> &Arc<BoundedCache<K, V>> {
        &self.master
    }

    // == Merge ==
    /// Publishes local state into the master under one master write lock.
    ///
    /// Order: clear the master if fully invalidated, remove invalidated keys,
    /// then insert surviving local entries through the master's eviction policy.
    /// Consuming `self` makes the merge happen at most once.
    pub fn merge(self) -> MergeOutcome {
        let entries = self.local.drain();
        self.master
            .apply_merge(self.fully_invalidated, self.invalidated, entries)
    }
}
