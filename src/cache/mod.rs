//! Cache Module
//!
//! Bounded LRU caches, transaction-scoped overlays and the UTXO index that
//! sit between the node's query logic and its relational store.
//!
//! Writes made during a database transaction land in a [`LocalCacheSet`].
//! Committing merges it into the shared [`MasterCacheSet`]; rolling back
//! drops it, so uncommitted state can never reach the shared caches.

mod bounded;
mod domain;
mod facade;
pub mod identifiers;
mod local;
mod master;
mod overlay;
mod recency;
mod stats;
mod utxo;


// Re-export public types
pub use bounded::{BoundedCache, MergeOutcome};
pub use domain::CacheDomain;
pub use facade::{
    DatabaseCache, KeyValueCache, ReadOnlyCache, ReadOnlyUtxoCache, UnspentOutputCache,
};
pub use local::{LocalCacheSet, MergeSummary, ReadOnlyCacheSet};
pub use master::MasterCacheSet;
pub use overlay::OverlayCache;
pub use recency::RecencyTracker;
pub use stats::{CacheStats, StatsRecorder};
pub use utxo::{UtxoCache, UtxoCommitSummary, DEFAULT_MAX_UTXO_COUNT};
