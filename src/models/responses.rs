//! Response DTOs for the diagnostics API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheDomain, CacheStats};

/// Counters of one domain cache, as returned by `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct DomainStatsResponse {
    pub domain: CacheDomain,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub total_entries: usize,
    /// Zero means the domain cache is disabled
    pub capacity: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl DomainStatsResponse {
    pub fn new(domain: CacheDomain, stats: &CacheStats) -> Self {
        Self {
            domain,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            capacity: stats.capacity,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub domains: Vec<DomainStatsResponse>,
    /// Entries across every domain
    pub total_entries: usize,
}

impl StatsResponse {
    pub fn new(stats: Vec<(CacheDomain, CacheStats)>) -> Self {
        let domains: Vec<_> = stats
            .iter()
            .map(|(domain, stats)| DomainStatsResponse::new(*domain, stats))
            .collect();
        let total_entries = domains.iter().map(|d| d.total_entries).sum();
        Self {
            domains,
            total_entries,
        }
    }

    pub fn domain(&self, domain: CacheDomain) -> Option<&DomainStatsResponse> {
        self.domains.iter().find(|d| d.domain == domain)
    }
}

/// Response body for POST /stats/reset
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub message: String,
}

impl ResetResponse {
    pub fn new() -> Self {
        Self {
            message: "Cache statistics reset".to_string(),
        }
    }
}

impl Default for ResetResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for POST /invalidate/:domain
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub domain: CacheDomain,
    /// Entries the master held before the flush
    pub entries_dropped: usize,
}

impl InvalidateResponse {
    pub fn new(domain: CacheDomain, entries_dropped: usize) -> Self {
        Self {
            message: format!("Cache '{}' invalidated", domain),
            domain,
            entries_dropped,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "closed" once the master caches are shut down
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self::with_status("healthy")
    }

    pub fn closed() -> Self {
        Self::with_status("closed")
    }

    fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(hits: u64, misses: u64, total_entries: usize) -> CacheStats {
        CacheStats {
            hits,
            misses,
            evictions: 0,
            total_entries,
            capacity: 16,
        }
    }

    #[test]
    fn test_domain_stats_hit_rate() {
        let resp = DomainStatsResponse::new(CacheDomain::BlockHeight, &stats(80, 20, 3));
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_stats_response_totals_entries() {
        let resp = StatsResponse::new(vec![
            (CacheDomain::TransactionId, stats(0, 0, 3)),
            (CacheDomain::BlockHeight, stats(0, 0, 4)),
        ]);
        assert_eq!(resp.total_entries, 7);
        assert_eq!(resp.domain(CacheDomain::BlockHeight).map(|d| d.total_entries), Some(4));
        assert!(resp.domain(CacheDomain::AddressId).is_none());
    }

    #[test]
    fn test_stats_response_serializes_domain_names() {
        let resp = StatsResponse::new(vec![(CacheDomain::BlockchainSegment, stats(1, 1, 1))]);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"blockchain-segment\""));
        assert!(json.contains("hit_rate"));
    }

    #[test]
    fn test_invalidate_response_serialize() {
        let resp = InvalidateResponse::new(CacheDomain::AddressId, 5);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"entries_dropped\":5"));
        assert!(json.contains("invalidated"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
        assert_eq!(HealthResponse::closed().status, "closed");
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Unknown cache domain: foo");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("foo"));
    }
}
