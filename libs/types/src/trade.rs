//! Trade slot record
//!
//! Emitted by the engine on every fill and appended to the trade ring.
//! Trade ids are assigned monotonically from the region header.

use serde::{Deserialize, Serialize};

/// Trade slot record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: u64,
    pub buy_order_id: u64,
    pub sell_order_id: u64,
    pub price: u64,
    pub quantity: u64,
    pub timestamp: u64,
    pub symbol_fp: u32,
}

impl TradeRecord {
    /// Serialized size in bytes
    pub const ENCODED_SIZE: usize = 52;

    /// Serialize to the fixed little-endian slot layout.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0..8].copy_from_slice(&self.trade_id.to_le_bytes());
        buf[8..16].copy_from_slice(&self.buy_order_id.to_le_bytes());
        buf[16..24].copy_from_slice(&self.sell_order_id.to_le_bytes());
        buf[24..32].copy_from_slice(&self.price.to_le_bytes());
        buf[32..40].copy_from_slice(&self.quantity.to_le_bytes());
        buf[40..48].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[48..52].copy_from_slice(&self.symbol_fp.to_le_bytes());
        buf
    }

    /// Deserialize from the fixed slot layout.
    pub fn from_bytes(buf: &[u8; Self::ENCODED_SIZE]) -> Self {
        Self {
            trade_id: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            buy_order_id: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
            sell_order_id: u64::from_le_bytes(buf[16..24].try_into().unwrap()),
            price: u64::from_le_bytes(buf[24..32].try_into().unwrap()),
            quantity: u64::from_le_bytes(buf[32..40].try_into().unwrap()),
            timestamp: u64::from_le_bytes(buf[40..48].try_into().unwrap()),
            symbol_fp: u32::from_le_bytes(buf[48..52].try_into().unwrap()),
        }
    }
}
