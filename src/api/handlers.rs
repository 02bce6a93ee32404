//! API Handlers
//!
//! HTTP request handlers for each diagnostics endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::{CacheDomain, DatabaseCache, MasterCacheSet};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, InvalidateResponse, ResetResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// Holds the injected master cache set. The caches lock internally, so no
/// outer lock is needed here.
#[derive(Clone)]
pub struct AppState {
    pub master: Arc<MasterCacheSet>,
}

impl AppState {
    pub fn new(master: Arc<MasterCacheSet>) -> Self {
        Self { master }
    }

    /// Builds a fresh master cache set sized by the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(MasterCacheSet::new(&config.cache)))
    }
}

/// Handler for GET /stats
///
/// Returns per-domain counters of the master caches.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.master.all_stats()))
}

/// Handler for POST /stats/reset
pub async fn reset_stats_handler(State(state): State<AppState>) -> Json<ResetResponse> {
    state.master.reset_stats();
    Json(ResetResponse::new())
}

/// Handler for POST /invalidate/:domain
///
/// Flushes one domain after an out-of-band database edit. The flush goes
/// through a local cache set and a merge like any other master mutation.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let domain: CacheDomain = domain.parse()?;
    if state.master.is_closed() {
        return Err(CacheError::Closed("master cache set".to_string()));
    }

    let entries_dropped = state.master.stats(domain).total_entries;
    let mut local = state.master.local();
    local.invalidate_domain(domain);
    local.merge_into(&state.master)?;

    info!(cache = %domain, entries_dropped, "cache invalidated on request");
    Ok(Json(InvalidateResponse::new(domain, entries_dropped)))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    if state.master.is_closed() {
        Json(HealthResponse::closed())
    } else {
        Json(HealthResponse::healthy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::identifiers::{BlockId, Sha256Hash, TransactionId, TransactionOutputId};
    use crate::config::CacheConfig;

    fn test_state() -> AppState {
        AppState::new(Arc::new(MasterCacheSet::new(&CacheConfig::uniform(16))))
    }

    fn seed(state: &AppState) {
        let mut local = state.master.local();
        local
            .transaction_ids()
            .put(Sha256Hash::from_bytes([1u8; 32]), TransactionId::new(1));
        local.block_heights().put(BlockId::new(1), 100);
        local
            .unspent_outputs()
            .put(Sha256Hash::from_bytes([2u8; 32]), 0, TransactionOutputId::new(9));
        local.merge_into(&state.master).unwrap();
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        seed(&state);

        let response = stats_handler(State(state)).await;
        assert_eq!(response.domains.len(), CacheDomain::ALL.len());
        assert_eq!(response.total_entries, 3);
        let heights = response.domain(CacheDomain::BlockHeight).unwrap();
        assert_eq!(heights.total_entries, 1);
        assert_eq!(heights.capacity, 16);
    }

    #[tokio::test]
    async fn test_reset_stats_handler() {
        let state = test_state();
        state.master.get_block_height(&BlockId::new(1));
        assert_eq!(state.master.stats(CacheDomain::BlockHeight).misses, 1);

        reset_stats_handler(State(state.clone())).await;
        assert_eq!(state.master.stats(CacheDomain::BlockHeight).misses, 0);
    }

    #[tokio::test]
    async fn test_invalidate_handler_flushes_one_domain() {
        let state = test_state();
        seed(&state);

        let response = invalidate_handler(State(state.clone()), Path("block-height".to_string()))
            .await
            .unwrap();
        assert_eq!(response.domain, CacheDomain::BlockHeight);
        assert_eq!(response.entries_dropped, 1);

        assert_eq!(state.master.get_block_height(&BlockId::new(1)), None);
        assert_eq!(
            state.master.get_transaction_id(&Sha256Hash::from_bytes([1u8; 32])),
            Some(TransactionId::new(1))
        );
    }

    #[tokio::test]
    async fn test_invalidate_handler_flushes_utxo_domain() {
        let state = test_state();
        seed(&state);

        invalidate_handler(State(state.clone()), Path("unspent-transaction-output".to_string()))
            .await
            .unwrap();
        assert!(state.master.unspent_outputs().is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_unknown_domain() {
        let result = invalidate_handler(State(test_state()), Path("mempool".to_string())).await;
        assert!(matches!(result, Err(CacheError::UnknownDomain(_))));
    }

    #[tokio::test]
    async fn test_invalidate_closed_master() {
        let state = test_state();
        state.master.close();

        let result = invalidate_handler(State(state), Path("address-id".to_string())).await;
        assert!(matches!(result, Err(CacheError::Closed(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let state = test_state();
        let response = health_handler(State(state.clone())).await;
        assert_eq!(response.status, "healthy");

        state.master.close();
        let response = health_handler(State(state)).await;
        assert_eq!(response.status, "closed");
    }
}
