//! Cache Facade Module
//!
//! The typed per-domain surface the database layer talks to, and the
//! read-only decorators used by callers that must never publish cache state.

use std::hash::Hash;
use std::sync::Arc;

use crate::cache::identifiers::{
    AddressId, BlockHeight, BlockId, BlockchainSegmentId, CachedOutputIdentifier,
    ImmutableTransaction, Sha256Hash, TransactionId, TransactionOutputId,
};
use crate::cache::{BoundedCache, CacheDomain, OverlayCache, UtxoCache};

// == Key/Value Facade ==
/// Typed get/put/invalidate over one cached lookup.
pub trait KeyValueCache<K, V> {
    fn get(&self, key: &K) -> Option<V>;
    fn put(&mut self, key: K, value: V);
    fn invalidate(&mut self, key: &K);
    fn invalidate_all(&mut self);
}

impl<K, V> KeyValueCache<K, V> for OverlayCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        OverlayCache::get(self, key)
    }

    fn put(&mut self, key: K, value: V) {
        OverlayCache::put(self, key, value)
    }

    fn invalidate(&mut self, key: &K) {
        OverlayCache::invalidate(self, key)
    }

    fn invalidate_all(&mut self) {
        OverlayCache::invalidate_all(self)
    }
}

/// Reads a master cache directly and silently drops every write.
#[derive(Debug)]
pub struct ReadOnlyCache<K, V> {
    master: Arc<BoundedCache<K, V>>,
}

impl<K, V> ReadOnlyCache<K, V> {
    pub fn new(master: Arc<BoundedCache<K, V>>) -> Self {
        Self { master }
    }
}

impl<K, V> KeyValueCache<K, V> for ReadOnlyCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        self.master.get(key)
    }

    fn put(&mut self, _key: K, _value: V) {}

    fn invalidate(&mut self, _key: &K) {}

    fn invalidate_all(&mut self) {}
}

// == Unspent Output Facade ==
/// Typed surface over a UTXO cache.
pub trait UnspentOutputCache {
    fn get(&self, transaction_hash: &Sha256Hash, output_index: u32) -> Option<TransactionOutputId>;
    fn put(&mut self, transaction_hash: Sha256Hash, output_index: u32, output_id: TransactionOutputId);
    fn invalidate(&mut self, output_id: TransactionOutputId);
    fn invalidate_many(&mut self, output_ids: &[TransactionOutputId]);
    fn invalidate_all(&mut self);
}

impl UnspentOutputCache for UtxoCache {
    fn get(&self, transaction_hash: &Sha256Hash, output_index: u32) -> Option<TransactionOutputId> {
        UtxoCache::get(self, transaction_hash, output_index)
    }

    fn put(&mut self, transaction_hash: Sha256Hash, output_index: u32, output_id: TransactionOutputId) {
        UtxoCache::put(self, transaction_hash, output_index, output_id)
    }

    fn invalidate(&mut self, output_id: TransactionOutputId) {
        UtxoCache::invalidate(self, output_id)
    }

    fn invalidate_many(&mut self, output_ids: &[TransactionOutputId]) {
        UtxoCache::invalidate_many(self, output_ids.iter().copied())
    }

    fn invalidate_all(&mut self) {
        UtxoCache::invalidate_all(self)
    }
}

/// Reads a master UTXO cache directly and silently drops every write.
#[derive(Debug)]
pub struct ReadOnlyUtxoCache {
    master: Arc<UtxoCache>,
}

impl ReadOnlyUtxoCache {
    pub fn new(master: Arc<UtxoCache>) -> Self {
        Self { master }
    }
}

impl UnspentOutputCache for ReadOnlyUtxoCache {
    fn get(&self, transaction_hash: &Sha256Hash, output_index: u32) -> Option<TransactionOutputId> {
        self.master.get(transaction_hash, output_index)
    }

    fn put(&mut self, _transaction_hash: Sha256Hash, _output_index: u32, _output_id: TransactionOutputId) {}

    fn invalidate(&mut self, _output_id: TransactionOutputId) {}

    fn invalidate_many(&mut self, _output_ids: &[TransactionOutputId]) {}

    fn invalidate_all(&mut self) {}
}

// == Database Cache ==
/// Every cached lookup of the database layer, one facade per domain.
///
/// Implemented by [`crate::cache::LocalCacheSet`] (writes deferred until merge)
/// and [`crate::cache::ReadOnlyCacheSet`] (writes dropped).
pub trait DatabaseCache {
    fn transaction_ids(&mut self) -> &mut dyn KeyValueCache<Sha256Hash, TransactionId>;

    fn transactions(&mut self) -> &mut dyn KeyValueCache<TransactionId, ImmutableTransaction>;

    fn transaction_output_ids(
        &mut self,
    ) -> &mut dyn KeyValueCache<CachedOutputIdentifier, TransactionOutputId>;

    fn blockchain_segments(&mut self) -> &mut dyn KeyValueCache<BlockId, BlockchainSegmentId>;

    fn address_ids(&mut self) -> &mut dyn KeyValueCache<String, AddressId>;

    fn block_heights(&mut self) -> &mut dyn KeyValueCache<BlockId, BlockHeight>;

    fn unspent_outputs(&mut self) -> &mut dyn UnspentOutputCache;

    /// Invalidates every entry of one domain.
    fn invalidate_domain(&mut self, domain: CacheDomain) {
        match domain {
            CacheDomain::TransactionId => self.transaction_ids().invalidate_all(),
            CacheDomain::Transaction => self.transactions().invalidate_all(),
            CacheDomain::TransactionOutputId => self.transaction_output_ids().invalidate_all(),
            CacheDomain::BlockchainSegment => self.blockchain_segments().invalidate_all(),
            CacheDomain::AddressId => self.address_ids().invalidate_all(),
            CacheDomain::BlockHeight => self.block_heights().invalidate_all(),
            CacheDomain::UnspentTransactionOutput => self.unspent_outputs().invalidate_all(),
        }
    }
}
