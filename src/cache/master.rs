//! Master Cache Set
//!
//! The process-wide caches shared by every database transaction. They are
//! only ever mutated by merging a committed [`LocalCacheSet`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::cache::facade::{ReadOnlyCache, ReadOnlyUtxoCache};
use crate::cache::identifiers::{
    AddressId, BlockHeight, BlockId, BlockchainSegmentId, CachedOutputIdentifier,
    ImmutableTransaction, Sha256Hash, TransactionId, TransactionOutputId,
};
use crate::cache::{
    BoundedCache, CacheDomain, CacheStats, LocalCacheSet, ReadOnlyCacheSet, UtxoCache,
};
use crate::config::CacheConfig;

// == Master Cache Set ==
/// One long-lived cache per domain, injected wherever transactions are opened.
#[derive(Debug)]
pub struct MasterCacheSet {
    pub(crate) transaction_ids: Arc<BoundedCache<Sha256Hash, TransactionId>>,
    pub(crate) transactions: Arc<BoundedCache<TransactionId, ImmutableTransaction>>,
    pub(crate) transaction_output_ids: Arc<BoundedCache<CachedOutputIdentifier, TransactionOutputId>>,
    pub(crate) blockchain_segments: Arc<BoundedCache<BlockId, BlockchainSegmentId>>,
    pub(crate) address_ids: Arc<BoundedCache<String, AddressId>>,
    pub(crate) block_heights: Arc<BoundedCache<BlockId, BlockHeight>>,
    pub(crate) unspent_outputs: Arc<UtxoCache>,
    closed: AtomicBool,
}

impl MasterCacheSet {
    // == Constructor ==
    /// Builds every domain cache with the capacity the configuration assigns it.
    pub fn new(config: &CacheConfig) -> Self {
        fn bounded<K, V>(config: &CacheConfig, domain: CacheDomain) -> Arc<BoundedCache<K, V>>
        where
            K: Clone + Eq + std::hash::Hash,
            V: Clone,
        {
            Arc::new(BoundedCache::new(domain.name(), config.capacity(domain)))
        }

        Self {
            transaction_ids: bounded(config, CacheDomain::TransactionId),
            transactions: bounded(config, CacheDomain::Transaction),
            transaction_output_ids: bounded(config, CacheDomain::TransactionOutputId),
            blockchain_segments: bounded(config, CacheDomain::BlockchainSegment),
            address_ids: bounded(config, CacheDomain::AddressId),
            block_heights: bounded(config, CacheDomain::BlockHeight),
            unspent_outputs: Arc::new(UtxoCache::new(
                CacheDomain::UnspentTransactionOutput.name(),
                config.capacity(CacheDomain::UnspentTransactionOutput),
            )),
            closed: AtomicBool::new(false),
        }
    }

    // == Cache Sets ==
    /// Opens a transaction-scoped cache set reading through to this master.
    pub fn local(self: &Arc<Self>) -> LocalCacheSet {
        LocalCacheSet::new(Arc::clone(self))
    }

    /// Opens a cache set that reads this master and never writes anything.
    pub fn read_only(self: &Arc<Self>) -> ReadOnlyCacheSet {
        ReadOnlyCacheSet {
            transaction_ids: ReadOnlyCache::new(self.transaction_ids.clone()),
            transactions: ReadOnlyCache::new(self.transactions.clone()),
            transaction_output_ids: ReadOnlyCache::new(self.transaction_output_ids.clone()),
            blockchain_segments: ReadOnlyCache::new(self.blockchain_segments.clone()),
            address_ids: ReadOnlyCache::new(self.address_ids.clone()),
            block_heights: ReadOnlyCache::new(self.block_heights.clone()),
            unspent_outputs: ReadOnlyUtxoCache::new(self.unspent_outputs.clone()),
        }
    }

    // == Reads ==
    pub fn get_transaction_id(&self, transaction_hash: &Sha256Hash) -> Option<TransactionId> {
        self.transaction_ids.get(transaction_hash)
    }

    pub fn get_transaction(&self, transaction_id: &TransactionId) -> Option<ImmutableTransaction> {
        self.transactions.get(transaction_id)
    }

    pub fn get_transaction_output_id(&self, identifier: &CachedOutputIdentifier) -> Option<TransactionOutputId> {
        self.transaction_output_ids.get(identifier)
    }

    pub fn get_blockchain_segment_id(&self, block_id: &BlockId) -> Option<BlockchainSegmentId> {
        self.blockchain_segments.get(block_id)
    }

    pub fn get_address_id(&self, address: &str) -> Option<AddressId> {
        self.address_ids.get(&address.to_string())
    }

    pub fn get_block_height(&self, block_id: &BlockId) -> Option<BlockHeight> {
        self.block_heights.get(block_id)
    }

    pub fn get_unspent_output_id(&self, transaction_hash: &Sha256Hash, output_index: u32) -> Option<TransactionOutputId> {
        self.unspent_outputs.get(transaction_hash, output_index)
    }

    pub fn unspent_outputs(&self) -> &Arc<UtxoCache> {
        &self.unspent_outputs
    }

    // == Diagnostics ==
    pub fn stats(&self, domain: CacheDomain) -> CacheStats {
        match domain {
            CacheDomain::TransactionId => self.transaction_ids.stats(),
            CacheDomain::Transaction => self.transactions.stats(),
            CacheDomain::TransactionOutputId => self.transaction_output_ids.stats(),
            CacheDomain::BlockchainSegment => self.blockchain_segments.stats(),
            CacheDomain::AddressId => self.address_ids.stats(),
            CacheDomain::BlockHeight => self.block_heights.stats(),
            CacheDomain::UnspentTransactionOutput => self.unspent_outputs.stats(),
        }
    }

    pub fn all_stats(&self) -> Vec<(CacheDomain, CacheStats)> {
        CacheDomain::ALL
            .into_iter()
            .map(|domain| (domain, self.stats(domain)))
            .collect()
    }

    /// Emits one log line per domain.
    pub fn log_stats(&self) {
        for (domain, stats) in self.all_stats() {
            info!(
                cache = %domain,
                hits = stats.hits,
                misses = stats.misses,
                evictions = stats.evictions,
                entries = stats.total_entries,
                capacity = stats.capacity,
                hit_rate = stats.hit_rate(),
                "cache stats"
            );
        }
    }

    pub fn reset_stats(&self) {
        self.transaction_ids.reset_stats();
        self.transactions.reset_stats();
        self.transaction_output_ids.reset_stats();
        self.blockchain_segments.reset_stats();
        self.address_ids.reset_stats();
        self.block_heights.reset_stats();
        self.unspent_outputs.reset_stats();
    }

    // == Close ==
    /// Releases the UTXO cache's memory. Later merges are rejected.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.unspent_outputs.close();
            info!("master cache set closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
