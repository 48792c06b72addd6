//! Price level snapshot record
//!
//! The mapped per-symbol level arrays hold one of these per slot,
//! indexed by `price % MAX_LEVELS`. The array is a lossy projection of
//! the authoritative in-memory book; colliding prices overwrite each
//! other and readers needing exact depth query the engine instead.

use serde::{Deserialize, Serialize};

/// Aggregate of all resting orders at one price on one side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub price: u64,
    pub total_quantity: u64,
    pub order_count: u64,
}

impl LevelRecord {
    /// Serialized size in bytes
    pub const ENCODED_SIZE: usize = 24;

    pub fn new(price: u64, total_quantity: u64, order_count: u64) -> Self {
        Self {
            price,
            total_quantity,
            order_count,
        }
    }

    /// A level with no orders or no quantity is empty.
    pub fn is_empty(&self) -> bool {
        self.order_count == 0 || self.total_quantity == 0
    }

    /// Serialize to the fixed little-endian record layout.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0..8].copy_from_slice(&self.price.to_le_bytes());
        buf[8..16].copy_from_slice(&self.total_quantity.to_le_bytes());
        buf[16..24].copy_from_slice(&self.order_count.to_le_bytes());
        buf
    }

    /// Deserialize from the fixed record layout.
    pub fn from_bytes(buf: &[u8; Self::ENCODED_SIZE]) -> Self {
        Self {
            price: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            total_quantity: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
            order_count: u64::from_le_bytes(buf[16..24].try_into().unwrap()),
        }
    }
}
