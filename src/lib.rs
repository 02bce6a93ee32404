//! Chain Cache - transaction-scoped caches for a blockchain node's database layer
//!
//! Bounded LRU caches for derived facts (ids, heights, segments, unspent
//! outputs), per-transaction overlays that only publish on commit, and a
//! small diagnostics server over the shared master caches.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheDomain, DatabaseCache, LocalCacheSet, MasterCacheSet, ReadOnlyCacheSet};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_stats_task;
