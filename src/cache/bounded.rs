//! Bounded Cache Module
//!
//! Capacity-limited key/value map with LRU eviction, guarded by one
//! read-write lock per instance.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::cache::{CacheStats, RecencyTracker, StatsRecorder};

// == Merge Outcome ==
/// What a merge did to the destination cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The destination was emptied before anything else was applied
    pub cleared: bool,
    /// Keys removed from the destination
    pub removed: usize,
    /// Entries offered to the destination
    pub published: usize,
    /// Entries evicted from the destination to make room
    pub evicted: usize,
}

#[derive(Debug)]
struct CacheState<K, V> {
    entries: HashMap<K, V>,
    recency: RecencyTracker<K>,
}

impl<K: Clone + Eq + Hash, V> CacheState<K, V> {
    fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.recency.remove(key);
        Some(value)
    }

    /// Inserts a new key, evicting as needed. Existing keys keep their value
    /// and are only promoted. Returns the number of evicted entries.
    fn insert_if_absent(&mut self, key: K, value: V, capacity: usize) -> usize {
        if self.entries.contains_key(&key) {
            self.recency.mark_recent(&key);
            return 0;
        }

        let mut evicted = 0;
        while self.entries.len() >= capacity {
            match self.recency.pop_oldest() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    evicted += 1;
                }
                None => break,
            }
        }

        self.recency.mark_recent(&key);
        self.entries.insert(key, value);
        evicted
    }
}

// == Bounded Cache ==
/// A generic capacity-limited LRU map.
///
/// A capacity of zero makes the cache a permanent no-op: puts are dropped and
/// every get misses. Re-putting an existing key refreshes its recency but never
/// replaces the stored value; stale values are only cleared by invalidation.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    name: String,
    capacity: usize,
    state: RwLock<CacheState<K, V>>,
    stats: StatsRecorder,
}

impl<K, V> BoundedCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    // == Constructor ==
    /// Creates a named cache holding at most `capacity` entries.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        // Allocation is lazy; large tiers are mostly empty for a while.
        let preallocate = capacity.min(1024);
        Self {
            name: name.into(),
            capacity,
            state: RwLock::new(CacheState {
                entries: HashMap::with_capacity(preallocate),
                recency: RecencyTracker::with_capacity(preallocate),
            }),
            stats: StatsRecorder::new(),
        }
    }

    /// Creates a disabled cache that stores nothing.
    pub fn disabled(name: impl Into<String>) -> Self {
        Self::new(name, 0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    // == Get ==
    /// Returns the cached value and promotes the key to most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        if !self.is_enabled() {
            self.stats.record_miss();
            return None;
        }

        let mut state = self.state.write();
        match state.entries.get(key).cloned() {
            Some(value) => {
                state.recency.mark_recent(key);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns the cached value without touching recency or counters.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.state.read().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.state.read().entries.contains_key(key)
    }

    // == Put ==
    /// Caches `value` under `key` unless the key is already present.
    pub fn put(&self, key: K, value: V) {
        if !self.is_enabled() {
            return;
        }

        let evicted = self
            .state
            .write()
            .insert_if_absent(key, value, self.capacity);
        if evicted > 0 {
            trace!(cache = %self.name, evicted, "evicted least recently used entries");
            self.stats.record_evictions(evicted as u64);
        }
    }

    // == Remove ==
    /// Removes a key from both the value store and the recency order.
    pub fn remove(&self, key: &K) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        self.state.write().remove(key)
    }

    // == Invalidate All ==
    /// Drops every entry. Capacity and counters are kept.
    pub fn invalidate_all(&self) {
        let mut state = self.state.write();
        if !state.entries.is_empty() {
            debug!(cache = %self.name, entries = state.entries.len(), "invalidating all entries");
        }
        state.clear();
    }

    pub fn size(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.size(), self.capacity)
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    // == Merge Support ==
    /// Removes and returns every entry, least recently used first.
    pub(crate) fn drain(&self) -> Vec<(K, V)> {
        let mut state = self.state.write();
        let keys: Vec<K> = state.recency.iter().cloned().collect();
        let mut drained = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = state.entries.remove(&key) {
                drained.push((key, value));
            }
        }
        state.clear();
        drained
    }

    /// Applies a local overlay's accumulated state under a single write lock,
    /// so readers see either the pre-merge or the post-merge contents.
    pub(crate) fn apply_merge<R, E>(&self, clear_first: bool, removals: R, entries: E) -> MergeOutcome
    where
        R: IntoIterator<Item = K>,
        E: IntoIterator<Item = (K, V)>,
    {
        let mut outcome = MergeOutcome {
            cleared: clear_first,
            ..MergeOutcome::default()
        };

        let mut state = self.state.write();
        if clear_first {
            state.clear();
        }

        for key in removals {
            if state.remove(&key).is_some() {
                outcome.removed += 1;
            }
        }

        if self.is_enabled() {
            for (key, value) in entries {
                outcome.evicted += state.insert_if_absent(key, value, self.capacity);
                outcome.published += 1;
            }
        }
        drop(state);

        self.stats.record_evictions(outcome.evicted as u64);
        outcome
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let cache = BoundedCache::new("test", 10);
        cache.put("key1", 1);

        assert_eq!(cache.get(&"key1"), Some(1));
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.capacity(), 10);
    }

    #[test]
    fn test_get_missing_is_none() {
        let cache: BoundedCache<&str, u32> = BoundedCache::new("test", 10);
        assert_eq!(cache.get(&"missing"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_capacity_two_evicts_first_insert() {
        let cache = BoundedCache::new("test", 2);
        cache.put("A", 1);
        cache.put("B", 2);
        cache.put("C", 3);

        assert_eq!(cache.get(&"A"), None);
        assert_eq!(cache.get(&"B"), Some(2));
        assert_eq!(cache.get(&"C"), Some(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_promotes_key() {
        let cache = BoundedCache::new("test", 3);
        cache.put("key0", 0);
        cache.put("key1", 1);
        cache.put("key2", 2);

        cache.get(&"key0");
        cache.put("key3", 3);

        assert_eq!(cache.get(&"key0"), Some(0));
        assert_eq!(cache.get(&"key1"), None);
    }

    #[test]
    fn test_put_existing_key_keeps_first_value() {
        let cache = BoundedCache::new("test", 10);
        cache.put("k", "v1");
        cache.put("k", "v2");

        assert_eq!(cache.get(&"k"), Some("v1"));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_put_existing_key_refreshes_recency() {
        let cache = BoundedCache::new("test", 2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 100);
        cache.put("c", 3);

        assert_eq!(cache.peek(&"a"), Some(1));
        assert!(!cache.contains(&"b"));
    }

    #[test]
    fn test_disabled_cache_is_noop() {
        let cache = BoundedCache::disabled("off");
        cache.put(1u32, 1u32);

        assert!(!cache.is_enabled());
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.remove(&1), None);
    }

    #[test]
    fn test_remove_and_invalidate_all() {
        let cache = BoundedCache::new("test", 10);
        cache.put(1, "one");
        cache.put(2, "two");

        assert_eq!(cache.remove(&1), Some("one"));
        assert_eq!(cache.remove(&1), None);

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    fn test_drain_returns_lru_order_and_empties() {
        let cache = BoundedCache::new("test", 10);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.get(&"a");

        assert_eq!(cache.drain(), vec![("b", 2), ("a", 1)]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_apply_merge_clears_removes_then_inserts() {
        let cache = BoundedCache::new("test", 3);
        cache.put("x", 1);
        cache.put("y", 2);

        let outcome = cache.apply_merge(false, vec!["x"], vec![("y", 20), ("z", 3)]);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.published, 2);
        assert!(!outcome.cleared);
        assert_eq!(cache.peek(&"x"), None);
        assert_eq!(cache.peek(&"y"), Some(2));
        assert_eq!(cache.peek(&"z"), Some(3));

        let outcome = cache.apply_merge(true, Vec::new(), vec![("w", 4)]);
        assert!(outcome.cleared);
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.peek(&"w"), Some(4));
    }

    #[test]
    fn test_apply_merge_respects_capacity() {
        let cache = BoundedCache::new("test", 2);
        let outcome = cache.apply_merge(false, Vec::new(), vec![(1, 1), (2, 2), (3, 3)]);

        assert_eq!(outcome.evicted, 1);
        assert_eq!(cache.size(), 2);
        assert!(!cache.contains(&1));
    }

    #[test]
    fn test_reset_stats() {
        let cache = BoundedCache::new("test", 1);
        cache.put(1, 1);
        cache.get(&1);
        cache.get(&2);
        cache.reset_stats();

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.total_entries, 1);
    }
}
