//! Identifiers Module
//!
//! Typed keys and values stored by the node caches.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::CacheError;

// == Sha256 Hash ==
/// A 32-byte hash in Bitcoin's internal (little-endian) byte order.
///
/// Ordering compares the most-significant byte first, which is the last byte
/// of the internal representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sha256Hash([u8; Sha256Hash::BYTE_COUNT]);

impl Sha256Hash {
    pub const BYTE_COUNT: usize = 32;

    /// Wraps bytes already in internal byte order.
    pub const fn from_bytes(bytes: [u8; Self::BYTE_COUNT]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::BYTE_COUNT] {
        &self.0
    }

    // == Hex ==
    /// Parses the conventional big-endian hex form (as shown by block explorers).
    pub fn from_hex(hex: &str) -> Result<Self, CacheError> {
        let hex = hex.trim();
        if hex.len() != Self::BYTE_COUNT * 2 {
            return Err(CacheError::InvalidRequest(format!(
                "Hash must be {} hex characters, got {}",
                Self::BYTE_COUNT * 2,
                hex.len()
            )));
        }

        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CacheError::InvalidRequest("Hash is not valid hex".to_string()));
        }

        let mut bytes = [0u8; Self::BYTE_COUNT];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| CacheError::InvalidRequest("Hash is not valid hex".to_string()))?;
            let byte = u8::from_str_radix(pair, 16)
                .map_err(|_| CacheError::InvalidRequest(format!("Invalid hex byte: {}", pair)))?;
            bytes[Self::BYTE_COUNT - 1 - i] = byte;
        }

        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().rev().map(|b| format!("{:02x}", b)).collect()
    }
}

impl Ord for Sha256Hash {
    // Unsigned bytes, byte 31 first: hashes sort as big-endian numbers.
    // `prune_half` walks outputs in this order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for Sha256Hash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Hash({})", self.to_hex())
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Sha256Hash {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Sha256Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

// == Database Row Ids ==
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Row id of a stored transaction.
    TransactionId
);
row_id!(
    /// Row id of a stored transaction output.
    TransactionOutputId
);
row_id!(
    /// Row id of a stored block.
    BlockId
);
row_id!(
    /// Row id of a blockchain segment; segment semantics belong to the chain logic.
    BlockchainSegmentId
);
row_id!(
    /// Row id of an indexed address.
    AddressId
);

/// Height of a block within its chain.
pub type BlockHeight = u64;

// == Output Identifiers ==
/// Identifies an output by its transaction's row id and its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CachedOutputIdentifier {
    pub transaction_id: TransactionId,
    pub output_index: u32,
}

impl CachedOutputIdentifier {
    pub fn new(transaction_id: TransactionId, output_index: u32) -> Self {
        Self {
            transaction_id,
            output_index,
        }
    }
}

// == Immutable Transaction ==
/// A serialized transaction shared between caches without copying.
///
/// Decoding is left to the caller; the cache only stores the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImmutableTransaction(Arc<[u8]>);

impl ImmutableTransaction {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ImmutableTransaction {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}
