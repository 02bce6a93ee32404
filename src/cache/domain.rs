//! Cache Domains
//!
//! Names the lookups the node caches, for configuration and diagnostics.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CacheError;

/// One cached lookup of the database layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheDomain {
    /// Transaction hash -> transaction id
    TransactionId,
    /// Transaction id -> transaction
    Transaction,
    /// (transaction id, output index) -> output id
    TransactionOutputId,
    /// Block id -> blockchain segment id
    BlockchainSegment,
    /// Address -> address id
    AddressId,
    /// Block id -> block height
    BlockHeight,
    /// (transaction hash, output index) -> unspent output id
    UnspentTransactionOutput,
}

impl CacheDomain {
    pub const ALL: [CacheDomain; 7] = [
        CacheDomain::TransactionId,
        CacheDomain::Transaction,
        CacheDomain::TransactionOutputId,
        CacheDomain::BlockchainSegment,
        CacheDomain::AddressId,
        CacheDomain::BlockHeight,
        CacheDomain::UnspentTransactionOutput,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CacheDomain::TransactionId => "transaction-id",
            CacheDomain::Transaction => "transaction",
            CacheDomain::TransactionOutputId => "transaction-output-id",
            CacheDomain::BlockchainSegment => "blockchain-segment",
            CacheDomain::AddressId => "address-id",
            CacheDomain::BlockHeight => "block-height",
            CacheDomain::UnspentTransactionOutput => "unspent-transaction-output",
        }
    }

    /// Environment variable selecting this domain's size tier.
    pub fn tier_env_var(self) -> &'static str {
        match self {
            CacheDomain::TransactionId => "TRANSACTION_ID_CACHE_TIER",
            CacheDomain::Transaction => "TRANSACTION_CACHE_TIER",
            CacheDomain::TransactionOutputId => "TRANSACTION_OUTPUT_ID_CACHE_TIER",
            CacheDomain::BlockchainSegment => "BLOCKCHAIN_SEGMENT_CACHE_TIER",
            CacheDomain::AddressId => "ADDRESS_ID_CACHE_TIER",
            CacheDomain::BlockHeight => "BLOCK_HEIGHT_CACHE_TIER",
            CacheDomain::UnspentTransactionOutput => "UTXO_CACHE_TIER",
        }
    }
}

impl fmt::Display for CacheDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CacheDomain {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        CacheDomain::ALL
            .into_iter()
            .find(|domain| domain.name() == normalized)
            .ok_or_else(|| CacheError::UnknownDomain(s.to_string()))
    }
}
