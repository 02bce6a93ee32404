//! Local Cache Sets
//!
//! Per-transaction cache sets. A [`LocalCacheSet`] collects writes for one
//! database transaction and publishes them with [`LocalCacheSet::merge_into`]
//! on commit; on rollback it is simply dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::facade::{
    DatabaseCache, KeyValueCache, ReadOnlyCache, ReadOnlyUtxoCache, UnspentOutputCache,
};
use crate::cache::identifiers::{
    AddressId, BlockHeight, BlockId, BlockchainSegmentId, CachedOutputIdentifier,
    ImmutableTransaction, Sha256Hash, TransactionId, TransactionOutputId,
};
use crate::cache::{
    CacheDomain, MasterCacheSet, MergeOutcome, OverlayCache, UtxoCache, UtxoCommitSummary,
};
use crate::error::{CacheError, Result};

// == Merge Summary ==
/// What one commit published into the master cache set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub domains: BTreeMap<CacheDomain, MergeOutcome>,
    pub unspent_outputs: UtxoCommitSummary,
}

impl MergeSummary {
    pub fn outcome(&self, domain: CacheDomain) -> MergeOutcome {
        self.domains.get(&domain).copied().unwrap_or_default()
    }

    pub fn total_published(&self) -> usize {
        self.domains.values().map(|o| o.published).sum::<usize>() + self.unspent_outputs.published
    }
}

// == Local Cache Set ==
/// One overlay per domain, exclusively owned by an open transaction.
#[derive(Debug)]
pub struct LocalCacheSet {
    master: Arc<MasterCacheSet>,
    transaction_ids: OverlayCache<Sha256Hash, TransactionId>,
    transactions: OverlayCache<TransactionId, ImmutableTransaction>,
    transaction_output_ids: OverlayCache<CachedOutputIdentifier, TransactionOutputId>,
    blockchain_segments: OverlayCache<BlockId, BlockchainSegmentId>,
    address_ids: OverlayCache<String, AddressId>,
    block_heights: OverlayCache<BlockId, BlockHeight>,
    unspent_outputs: UtxoCache,
}

impl LocalCacheSet {
    pub(crate) fn new(master: Arc<MasterCacheSet>) -> Self {
        Self {
            transaction_ids: OverlayCache::new(master.transaction_ids.clone()),
            transactions: OverlayCache::new(master.transactions.clone()),
            transaction_output_ids: OverlayCache::new(master.transaction_output_ids.clone()),
            blockchain_segments: OverlayCache::new(master.blockchain_segments.clone()),
            address_ids: OverlayCache::new(master.address_ids.clone()),
            block_heights: OverlayCache::new(master.block_heights.clone()),
            unspent_outputs: UtxoCache::local(master.unspent_outputs.clone()),
            master,
        }
    }

    pub fn master(&self) -> &Arc<MasterCacheSet> {
        &self.master
    }

    // == Merge ==
    /// Publishes this transaction's cache state into `master`.
    ///
    /// Must be called on commit, before the transaction releases its database
    /// locks. `master` must be the set this local set was opened from. Each
    /// domain is applied under that domain's master write lock.
    pub fn merge_into(self, master: &MasterCacheSet) -> Result<MergeSummary> {
        if !std::ptr::eq(Arc::as_ptr(&self.master), master) {
            return Err(CacheError::MasterMismatch);
        }
        if master.is_closed() {
            return Err(CacheError::Closed("master cache set".to_string()));
        }

        let Self {
            master: _,
            transaction_ids,
            transactions,
            transaction_output_ids,
            blockchain_segments,
            address_ids,
            block_heights,
            unspent_outputs,
        } = self;

        let mut summary = MergeSummary::default();
        summary.domains.insert(CacheDomain::TransactionId, transaction_ids.merge());
        summary.domains.insert(CacheDomain::Transaction, transactions.merge());
        summary
            .domains
            .insert(CacheDomain::TransactionOutputId, transaction_output_ids.merge());
        summary
            .domains
            .insert(CacheDomain::BlockchainSegment, blockchain_segments.merge());
        summary.domains.insert(CacheDomain::AddressId, address_ids.merge());
        summary.domains.insert(CacheDomain::BlockHeight, block_heights.merge());
        summary.unspent_outputs = master.unspent_outputs.commit(&unspent_outputs);

        debug!(
            published = summary.total_published(),
            utxo_invalidated = summary.unspent_outputs.invalidated,
            "merged local cache set into master"
        );
        Ok(summary)
    }

    /// Discards every local write. Equivalent to dropping the set.
    pub fn rollback(self) {
        debug!("discarding local cache set");
    }
}

impl DatabaseCache for LocalCacheSet {
    fn transaction_ids(&mut self) -> &mut dyn KeyValueCache<Sha256Hash, TransactionId> {
        &mut self.transaction_ids
    }

    fn transactions(&mut self) -> &mut dyn KeyValueCache<TransactionId, ImmutableTransaction> {
        &mut self.transactions
    }

    fn transaction_output_ids(
        &mut self,
    ) -> &mut dyn KeyValueCache<CachedOutputIdentifier, TransactionOutputId> {
        &mut self.transaction_output_ids
    }

    fn blockchain_segments(&mut self) -> &mut dyn KeyValueCache<BlockId, BlockchainSegmentId> {
        &mut self.blockchain_segments
    }

    fn address_ids(&mut self) -> &mut dyn KeyValueCache<String, AddressId> {
        &mut self.address_ids
    }

    fn block_heights(&mut self) -> &mut dyn KeyValueCache<BlockId, BlockHeight> {
        &mut self.block_heights
    }

    fn unspent_outputs(&mut self) -> &mut dyn UnspentOutputCache {
        &mut self.unspent_outputs
    }
}

// == Read-Only Cache Set ==
/// Reads the master directly; every write and invalidation is dropped.
#[derive(Debug)]
pub struct ReadOnlyCacheSet {
    pub(crate) transaction_ids: ReadOnlyCache<Sha256Hash, TransactionId>,
    pub(crate) transactions: ReadOnlyCache<TransactionId, ImmutableTransaction>,
    pub(crate) transaction_output_ids: ReadOnlyCache<CachedOutputIdentifier, TransactionOutputId>,
    pub(crate) blockchain_segments: ReadOnlyCache<BlockId, BlockchainSegmentId>,
    pub(crate) address_ids: ReadOnlyCache<String, AddressId>,
    pub(crate) block_heights: ReadOnlyCache<BlockId, BlockHeight>,
    pub(crate) unspent_outputs: ReadOnlyUtxoCache,
}

impl DatabaseCache for ReadOnlyCacheSet {
    fn transaction_ids(&mut self) -> &mut dyn KeyValueCache<Sha256Hash, TransactionId> {
        &mut self.transaction_ids
    }

    fn transactions(&mut self) -> &mut dyn KeyValueCache<TransactionId, ImmutableTransaction> {
        &mut self.transactions
    }

    fn transaction_output_ids(
        &mut self,
    ) -> &mut dyn KeyValueCache<CachedOutputIdentifier, TransactionOutputId> {
        &mut self.transaction_output_ids
    }

    fn blockchain_segments(&mut self) -> &mut dyn KeyValueCache<BlockId, BlockchainSegmentId> {
        &mut self.blockchain_segments
    }

    fn address_ids(&mut self) -> &mut dyn KeyValueCache<String, AddressId> {
        &mut self.address_ids
    }

    fn block_heights(&mut self) -> &mut dyn KeyValueCache<BlockId, BlockHeight> {
        &mut self.block_heights
    }

    fn unspent_outputs(&mut self) -> &mut dyn UnspentOutputCache {
        &mut self.unspent_outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn hash(n: u8) -> Sha256Hash {
        Sha256Hash::from_bytes([n; 32])
    }

    fn new_master() -> Arc<MasterCacheSet> {
        Arc::new(MasterCacheSet::new(&CacheConfig::uniform(16)))
    }

    #[test]
    fn test_commit_publishes_every_domain() {
        let master = new_master();
        let mut local = master.local();

        local.transaction_ids().put(hash(1), TransactionId::new(1));
        local
            .transactions()
            .put(TransactionId::new(1), ImmutableTransaction::from(vec![0xde, 0xad]));
        local.transaction_output_ids().put(
            CachedOutputIdentifier::new(TransactionId::new(1), 0),
            TransactionOutputId::new(10),
        );
        local.blockchain_segments().put(BlockId::new(5), BlockchainSegmentId::new(1));
        local.address_ids().put("addr".to_string(), AddressId::new(3));
        local.block_heights().put(BlockId::new(5), 100);
        local.unspent_outputs().put(hash(1), 0, TransactionOutputId::new(10));

        assert_eq!(master.get_transaction_id(&hash(1)), None);

        let summary = local.merge_into(&master).unwrap();
        assert_eq!(summary.total_published(), 7);
        assert_eq!(summary.outcome(CacheDomain::BlockHeight).published, 1);

        assert_eq!(master.get_transaction_id(&hash(1)), Some(TransactionId::new(1)));
        assert_eq!(
            master.get_transaction(&TransactionId::new(1)).unwrap().as_bytes(),
            &[0xde, 0xad]
        );
        assert_eq!(
            master.get_transaction_output_id(&CachedOutputIdentifier::new(TransactionId::new(1), 0)),
            Some(TransactionOutputId::new(10))
        );
        assert_eq!(master.get_blockchain_segment_id(&BlockId::new(5)), Some(BlockchainSegmentId::new(1)));
        assert_eq!(master.get_address_id("addr"), Some(AddressId::new(3)));
        assert_eq!(master.get_block_height(&BlockId::new(5)), Some(100));
        assert_eq!(master.get_unspent_output_id(&hash(1), 0), Some(TransactionOutputId::new(10)));
    }

    #[test]
    fn test_rollback_leaves_master_untouched() {
        let master = new_master();
        let mut local = master.local();
        local.transaction_ids().put(hash(1), TransactionId::new(1));
        local.unspent_outputs().put(hash(1), 0, TransactionOutputId::new(1));
        local.rollback();

        assert_eq!(master.get_transaction_id(&hash(1)), None);
        assert!(master.unspent_outputs().is_empty());
    }

    #[test]
    fn test_local_reads_fall_through() {
        let master = new_master();
        let mut seed = master.local();
        seed.block_heights().put(BlockId::new(1), 10);
        seed.merge_into(&master).unwrap();

        let mut local = master.local();
        local.block_heights().put(BlockId::new(2), 20);
        assert_eq!(local.block_heights().get(&BlockId::new(1)), Some(10));
        assert_eq!(local.block_heights().get(&BlockId::new(2)), Some(20));
        drop(local);

        assert_eq!(master.get_block_height(&BlockId::new(2)), None);
    }

    #[test]
    fn test_merge_into_foreign_master_is_rejected() {
        let master = new_master();
        let other = new_master();
        let mut local = master.local();
        local.block_heights().put(BlockId::new(1), 1);

        assert!(matches!(local.merge_into(&other), Err(CacheError::MasterMismatch)));
        assert_eq!(master.get_block_height(&BlockId::new(1)), None);
        assert_eq!(other.get_block_height(&BlockId::new(1)), None);
    }

    #[test]
    fn test_merge_into_closed_master_is_rejected() {
        let master = new_master();
        let local = master.local();
        master.close();

        assert!(matches!(local.merge_into(&master), Err(CacheError::Closed(_))));
    }

    #[test]
    fn test_invalidate_domain_clears_master_on_merge() {
        let master = new_master();
        let mut seed = master.local();
        seed.transaction_ids().put(hash(1), TransactionId::new(1));
        seed.transaction_ids().put(hash(2), TransactionId::new(2));
        seed.merge_into(&master).unwrap();

        let mut local = master.local();
        local.invalidate_domain(CacheDomain::TransactionId);
        assert_eq!(local.transaction_ids().get(&hash(1)), None);

        let summary = local.merge_into(&master).unwrap();
        assert!(summary.outcome(CacheDomain::TransactionId).cleared);
        assert_eq!(master.get_transaction_id(&hash(1)), None);
        assert_eq!(master.get_transaction_id(&hash(2)), None);
    }

    #[test]
    fn test_read_only_set_never_writes() {
        let master = new_master();
        let mut seed = master.local();
        seed.address_ids().put("a".to_string(), AddressId::new(1));
        seed.merge_into(&master).unwrap();

        let mut read_only = master.read_only();
        read_only.address_ids().put("b".to_string(), AddressId::new(2));
        read_only.address_ids().invalidate(&"a".to_string());
        read_only.invalidate_domain(CacheDomain::AddressId);
        read_only.unspent_outputs().put(hash(1), 0, TransactionOutputId::new(1));

        assert_eq!(read_only.address_ids().get(&"a".to_string()), Some(AddressId::new(1)));
        assert_eq!(master.get_address_id("b"), None);
        assert!(master.unspent_outputs().is_empty());
    }
}
