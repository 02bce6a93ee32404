//! UTXO Cache Module
//!
//! Unspent output ids indexed by transaction hash and output index, with a
//! reverse index for removal by output id and a ledger of invalidated ids
//! that is replayed into the master on commit.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::cache::identifiers::{Sha256Hash, TransactionOutputId};
use crate::cache::{CacheStats, StatsRecorder};

/// Default bound on cached outputs (2^28).
pub const DEFAULT_MAX_UTXO_COUNT: usize = 1 << 28;

// == Commit Summary ==
/// Result of absorbing a local UTXO cache into a master.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtxoCommitSummary {
    /// The destination was emptied because the source was fully invalidated
    pub cleared: bool,
    /// Outputs copied from the source
    pub published: usize,
    /// Invalidated ids replayed against the destination
    pub invalidated: usize,
    /// Outputs dropped by pruning after the commit
    pub pruned: usize,
}

#[derive(Debug, Default)]
struct UtxoIndex {
    by_hash: BTreeMap<Sha256Hash, BTreeMap<u32, TransactionOutputId>>,
    by_output_id: BTreeMap<TransactionOutputId, Sha256Hash>,
    invalidated: Vec<TransactionOutputId>,
    invalidated_lookup: HashSet<TransactionOutputId>,
    /// Set by `invalidate_all` on a local cache; stops read-through and clears the master at commit
    fully_invalidated: bool,
}

impl UtxoIndex {
    fn len(&self) -> usize {
        self.by_output_id.len()
    }

    fn get(&self, hash: &Sha256Hash, index: u32) -> Option<TransactionOutputId> {
        self.by_hash.get(hash)?.get(&index).copied()
    }

    fn insert(&mut self, hash: Sha256Hash, index: u32, output_id: TransactionOutputId) {
        // An id lives in exactly one slot; drop whatever either side pointed at before.
        if let Some(previous) = self.get(&hash, index) {
            if previous != output_id {
                self.remove_output_id(previous);
            }
        }
        if self.by_output_id.contains_key(&output_id) {
            self.remove_output_id(output_id);
        }

        self.by_hash.entry(hash).or_default().insert(index, output_id);
        self.by_output_id.insert(output_id, hash);
    }

    fn remove_output_id(&mut self, output_id: TransactionOutputId) -> bool {
        let Some(hash) = self.by_output_id.remove(&output_id) else {
            return false;
        };

        let outputs = self
            .by_hash
            .get_mut(&hash)
            .unwrap_or_else(|| panic!("UTXO reverse index points at missing hash {}", hash));
        let index = outputs
            .iter()
            .find_map(|(index, id)| (*id == output_id).then_some(*index))
            .unwrap_or_else(|| panic!("UTXO reverse index desync for output {}", output_id));
        outputs.remove(&index);
        if outputs.is_empty() {
            self.by_hash.remove(&hash);
        }
        true
    }

    fn record_invalidation(&mut self, output_id: TransactionOutputId) {
        if self.invalidated_lookup.insert(output_id) {
            self.invalidated.push(output_id);
        }
    }

    fn forget_invalidation(&mut self, output_id: TransactionOutputId) {
        if self.invalidated_lookup.remove(&output_id) {
            self.invalidated.retain(|id| *id != output_id);
        }
    }

    fn clear(&mut self) {
        self.by_hash.clear();
        self.by_output_id.clear();
        self.invalidated.clear();
        self.invalidated_lookup.clear();
        self.fully_invalidated = false;
    }

    /// Drops every other output in hash order, starting with the first.
    fn prune_half(&mut self) -> usize {
        let mut doomed = Vec::with_capacity(self.len() / 2 + 1);
        let mut should_prune = true;
        for outputs in self.by_hash.values() {
            for output_id in outputs.values() {
                if should_prune {
                    doomed.push(*output_id);
                }
                should_prune = !should_prune;
            }
        }

        for output_id in &doomed {
            self.remove_output_id(*output_id);
        }
        doomed.len()
    }

    fn check_consistency(&self) {
        let mut forward_count = 0;
        for (hash, outputs) in &self.by_hash {
            assert!(!outputs.is_empty(), "UTXO index holds empty entry for {}", hash);
            for (index, output_id) in outputs {
                forward_count += 1;
                assert_eq!(
                    self.by_output_id.get(output_id),
                    Some(hash),
                    "UTXO reverse index desync for {}:{} -> {}",
                    hash,
                    index,
                    output_id
                );
            }
        }
        assert_eq!(
            forward_count,
            self.by_output_id.len(),
            "UTXO reverse index holds ids missing from the primary index"
        );
        assert_eq!(self.invalidated.len(), self.invalidated_lookup.len());
    }
}

// == UTXO Cache ==
/// Bidirectional unspent-output index usable as either a master or a
/// transaction-local overlay.
///
/// A local cache reads through to its master unless the master's answer is an
/// id this cache has invalidated. [`UtxoCache::commit`] is the only way local
/// state reaches a master.
#[derive(Debug)]
pub struct UtxoCache {
    name: String,
    max_item_count: usize,
    index: RwLock<UtxoIndex>,
    master: Option<Arc<UtxoCache>>,
    closed: AtomicBool,
    stats: StatsRecorder,
}

impl UtxoCache {
    // == Constructors ==
    /// Creates a master cache bounded to `max_item_count` outputs (0 disables it).
    pub fn new(name: impl Into<String>, max_item_count: usize) -> Self {
        Self {
            name: name.into(),
            max_item_count,
            index: RwLock::new(UtxoIndex::default()),
            master: None,
            closed: AtomicBool::new(false),
            stats: StatsRecorder::new(),
        }
    }

    /// Creates a local cache that reads through to `master`.
    pub fn local(master: Arc<UtxoCache>) -> Self {
        let mut cache = Self::new(format!("{}.local", master.name), master.max_item_count);
        cache.master = Some(master);
        cache
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_item_count(&self) -> usize {
        self.max_item_count
    }

    pub fn is_enabled(&self) -> bool {
        self.max_item_count > 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn master(&self) -> Option<&Arc<UtxoCache>> {
        self.master.as_ref()
    }

    // == Put ==
    /// Caches an unspent output and clears any pending invalidation of its id.
    pub fn put(&self, transaction_hash: Sha256Hash, output_index: u32, output_id: TransactionOutputId) {
        if !self.is_enabled() || self.is_closed() {
            return;
        }

        let mut index = self.index.write();
        index.insert(transaction_hash, output_index, output_id);
        index.forget_invalidation(output_id);
    }

    // == Get ==
    /// Looks up locally, then in the master unless the master's id was invalidated here.
    pub fn get(&self, transaction_hash: &Sha256Hash, output_index: u32) -> Option<TransactionOutputId> {
        if self.is_closed() {
            return None;
        }

        let index = self.index.read();
        if let Some(output_id) = index.get(transaction_hash, output_index) {
            self.stats.record_hit();
            return Some(output_id);
        }
        self.stats.record_miss();

        if index.fully_invalidated {
            return None;
        }
        let output_id = self.master.as_ref()?.get(transaction_hash, output_index)?;
        if index.invalidated_lookup.contains(&output_id) {
            return None;
        }
        Some(output_id)
    }

    // == Invalidate ==
    /// Removes an output by id and records the id for replay at commit.
    pub fn invalidate(&self, output_id: TransactionOutputId) {
        self.invalidate_many(std::iter::once(output_id));
    }

    pub fn invalidate_many<I>(&self, output_ids: I)
    where
        I: IntoIterator<Item = TransactionOutputId>,
    {
        if self.is_closed() {
            return;
        }

        let mut index = self.index.write();
        for output_id in output_ids {
            index.remove_output_id(output_id);
            // Only a local cache has somewhere to replay the ledger.
            if self.master.is_some() {
                index.record_invalidation(output_id);
            }
        }
    }

    /// Drops every cached output and pending invalidation.
    ///
    /// On a local cache this also stops reading through, and the master is
    /// emptied when this cache is committed.
    pub fn invalidate_all(&self) {
        let mut index = self.index.write();
        index.clear();
        index.fully_invalidated = self.master.is_some();
    }

    /// Forgets pending invalidations without applying them anywhere.
    pub fn clear_invalidated(&self) {
        let mut index = self.index.write();
        index.invalidated.clear();
        index.invalidated_lookup.clear();
    }

    // == Commit ==
    /// Absorbs and clears `source`.
    ///
    /// Every output of the source is merged into this cache, then every id the
    /// source invalidated is removed here. Locks are taken source first, then
    /// destination, under one destination write lock for the whole merge.
    pub fn commit(&self, source: &UtxoCache) -> UtxoCommitSummary {
        assert!(
            !std::ptr::eq(self, source),
            "UTXO cache cannot commit into itself"
        );

        let mut summary = UtxoCommitSummary::default();
        let mut source_index = source.index.write();

        if self.is_enabled() && !self.is_closed() {
            let mut index = self.index.write();
            if source_index.fully_invalidated {
                index.clear();
                summary.cleared = true;
            }
            for (hash, outputs) in &source_index.by_hash {
                for (output_index, output_id) in outputs {
                    index.insert(*hash, *output_index, *output_id);
                    summary.published += 1;
                }
            }

            for output_id in &source_index.invalidated {
                index.remove_output_id(*output_id);
                summary.invalidated += 1;
            }

            // Each pass removes at least one output from a non-empty index.
            while index.len() > self.max_item_count {
                summary.pruned += index.prune_half();
            }
            if summary.pruned > 0 {
                warn!(
                    cache = %self.name,
                    pruned = summary.pruned,
                    remaining = index.len(),
                    "UTXO cache exceeded its bound; pruned"
                );
            }

            if cfg!(debug_assertions) {
                index.check_consistency();
            }
        }

        source_index.clear();
        drop(source_index);

        debug!(
            cache = %self.name,
            published = summary.published,
            invalidated = summary.invalidated,
            "committed local UTXO cache"
        );
        summary
    }

    // == Prune Half ==
    /// Drops every other cached output, in hash order. Returns the number dropped.
    pub fn prune_half(&self) -> usize {
        self.index.write().prune_half()
    }

    // == Close ==
    /// Releases cached state; afterwards writes are dropped and reads miss.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.index.write().clear();
    }

    // == Inspection ==
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_invalidations(&self) -> usize {
        self.index.read().invalidated.len()
    }

    /// Panics if the primary and reverse indexes disagree.
    pub fn check_consistency(&self) {
        self.index.read().check_consistency();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len(), self.max_item_count)
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}
