//! Configuration Module
//!
//! Loads cache sizing and diagnostics server settings from environment variables.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::cache::{CacheDomain, DEFAULT_MAX_UTXO_COUNT};
use crate::error::CacheError;

// == Size Tier ==
/// Coarse cache size classes, resolved to item counts by [`TierTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeTier {
    Disabled,
    Small,
    Medium,
    Large,
}

impl FromStr for SizeTier {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(SizeTier::Disabled),
            "small" => Ok(SizeTier::Small),
            "medium" => Ok(SizeTier::Medium),
            "large" => Ok(SizeTier::Large),
            other => Err(CacheError::InvalidConfig(format!(
                "Unknown cache size tier '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SizeTier::Disabled => "disabled",
            SizeTier::Small => "small",
            SizeTier::Medium => "medium",
            SizeTier::Large => "large",
        };
        f.write_str(name)
    }
}

// == Tier Table ==
/// Item counts for each size tier. Disabled is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierTable {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
}

impl TierTable {
    pub fn item_count(&self, tier: SizeTier) -> usize {
        match tier {
            SizeTier::Disabled => 0,
            SizeTier::Small => self.small,
            SizeTier::Medium => self.medium,
            SizeTier::Large => self.large,
        }
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            small: 1_460,
            medium: 128_000,
            large: 500_000,
        }
    }
}

// == Cache Config ==
/// Per-domain cache sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub tiers: TierTable,
    pub domain_tiers: HashMap<CacheDomain, SizeTier>,
    /// Bound on cached unspent outputs (0 disables the UTXO cache)
    pub max_utxo_count: usize,
}

impl CacheConfig {
    /// Default tier for a domain when none is configured.
    pub fn default_tier(domain: CacheDomain) -> SizeTier {
        match domain {
            CacheDomain::TransactionId => SizeTier::Medium,
            CacheDomain::Transaction => SizeTier::Medium,
            CacheDomain::TransactionOutputId => SizeTier::Large,
            CacheDomain::BlockchainSegment => SizeTier::Small,
            CacheDomain::AddressId => SizeTier::Disabled,
            CacheDomain::BlockHeight => SizeTier::Large,
            CacheDomain::UnspentTransactionOutput => SizeTier::Large,
        }
    }

    pub fn tier(&self, domain: CacheDomain) -> SizeTier {
        self.domain_tiers
            .get(&domain)
            .copied()
            .unwrap_or_else(|| Self::default_tier(domain))
    }

    /// Resolves a domain's capacity in items.
    ///
    /// The UTXO domain is bounded by `max_utxo_count` unless its tier is disabled.
    pub fn capacity(&self, domain: CacheDomain) -> usize {
        let tier = self.tier(domain);
        match domain {
            CacheDomain::UnspentTransactionOutput if tier != SizeTier::Disabled => {
                self.max_utxo_count
            }
            _ => self.tiers.item_count(tier),
        }
    }

    /// Returns a copy with one domain's tier overridden.
    pub fn with_tier(mut self, domain: CacheDomain, tier: SizeTier) -> Self {
        self.domain_tiers.insert(domain, tier);
        self
    }

    /// A configuration where every domain uses the same small capacity.
    pub fn uniform(capacity: usize) -> Self {
        Self {
            tiers: TierTable {
                small: capacity,
                medium: capacity,
                large: capacity,
            },
            domain_tiers: CacheDomain::ALL
                .into_iter()
                .map(|domain| (domain, SizeTier::Small))
                .collect(),
            max_utxo_count: capacity,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            tiers: TierTable::default(),
            domain_tiers: HashMap::new(),
            max_utxo_count: DEFAULT_MAX_UTXO_COUNT,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache sizing
    pub cache: CacheConfig,
    /// HTTP port of the diagnostics server
    pub server_port: u16,
    /// Seconds between stats log lines (0 disables the reporter)
    pub stats_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - Diagnostics HTTP port (default: 3000)
    /// - `STATS_INTERVAL` - Stats log interval in seconds (default: 60)
    /// - `CACHE_TIER_SMALL` / `CACHE_TIER_MEDIUM` / `CACHE_TIER_LARGE` - Tier item counts
    /// - `<DOMAIN>_CACHE_TIER` - Per-domain tier, e.g. `ADDRESS_ID_CACHE_TIER=small`
    /// - `UTXO_CACHE_MAX_ITEMS` - Bound on cached unspent outputs (default: 2^28)
    pub fn from_env() -> Self {
        let defaults = TierTable::default();
        let tiers = TierTable {
            small: parse_env("CACHE_TIER_SMALL").unwrap_or(defaults.small),
            medium: parse_env("CACHE_TIER_MEDIUM").unwrap_or(defaults.medium),
            large: parse_env("CACHE_TIER_LARGE").unwrap_or(defaults.large),
        };

        let mut domain_tiers = HashMap::new();
        for domain in CacheDomain::ALL {
            let Ok(raw) = env::var(domain.tier_env_var()) else {
                continue;
            };
            match raw.parse::<SizeTier>() {
                Ok(tier) => {
                    domain_tiers.insert(domain, tier);
                }
                Err(err) => warn!(
                    "{}: {}; keeping default tier {}",
                    domain.tier_env_var(),
                    err,
                    CacheConfig::default_tier(domain)
                ),
            }
        }

        Self {
            cache: CacheConfig {
                tiers,
                domain_tiers,
                max_utxo_count: parse_env("UTXO_CACHE_MAX_ITEMS").unwrap_or(DEFAULT_MAX_UTXO_COUNT),
            },
            server_port: parse_env("SERVER_PORT").unwrap_or(3000),
            stats_interval: parse_env("STATS_INTERVAL").unwrap_or(60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
            stats_interval: 60,
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.stats_interval, 60);
        assert_eq!(config.cache.max_utxo_count, DEFAULT_MAX_UTXO_COUNT);
    }

    #[test]
    fn test_default_capacities() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity(CacheDomain::AddressId), 0);
        assert_eq!(config.capacity(CacheDomain::BlockchainSegment), 1_460);
        assert_eq!(config.capacity(CacheDomain::TransactionId), 128_000);
        assert_eq!(config.capacity(CacheDomain::BlockHeight), 500_000);
        assert_eq!(
            config.capacity(CacheDomain::UnspentTransactionOutput),
            DEFAULT_MAX_UTXO_COUNT
        );
        assert!(
            config.capacity(CacheDomain::TransactionOutputId)
                > config.capacity(CacheDomain::Transaction)
        );
    }

    #[test]
    fn test_with_tier_override() {
        let config = CacheConfig::default()
            .with_tier(CacheDomain::AddressId, SizeTier::Small)
            .with_tier(CacheDomain::UnspentTransactionOutput, SizeTier::Disabled);

        assert_eq!(config.capacity(CacheDomain::AddressId), 1_460);
        assert_eq!(config.capacity(CacheDomain::UnspentTransactionOutput), 0);
    }

    #[test]
    fn test_uniform() {
        let config = CacheConfig::uniform(8);
        for domain in CacheDomain::ALL {
            assert_eq!(config.capacity(domain), 8);
        }
    }

    #[test]
    fn test_size_tier_parse() {
        assert_eq!("Large".parse::<SizeTier>().unwrap(), SizeTier::Large);
        assert_eq!("off".parse::<SizeTier>().unwrap(), SizeTier::Disabled);
        assert!(matches!(
            "huge".parse::<SizeTier>(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("STATS_INTERVAL");
        env::remove_var("CACHE_TIER_SMALL");
        env::remove_var("UTXO_CACHE_MAX_ITEMS");
        env::remove_var("BLOCKCHAIN_SEGMENT_CACHE_TIER");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.stats_interval, 60);
        assert_eq!(config.cache.tiers.small, 1_460);
        assert_eq!(config.cache.tier(CacheDomain::BlockchainSegment), SizeTier::Small);
    }
}
