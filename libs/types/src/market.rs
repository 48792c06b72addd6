//! Per-symbol market data record
//!
//! One entry per registered symbol in the mapped market-data array,
//! refreshed by the engine after every matched order. Readers accept
//! one-generation staleness.

use serde::{Deserialize, Serialize};

/// Market data record for one symbol
///
/// `best_bid` is 0 when the bid side is empty; `best_ask` is `u64::MAX`
/// when the ask side is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDataRecord {
    pub symbol_fp: u32,
    pub last_price: u64,
    pub last_quantity: u64,
    pub volume_24h: u64,
    pub best_bid: u64,
    pub best_ask: u64,
    pub timestamp: u64,
}

impl MarketDataRecord {
    /// Serialized size in bytes
    pub const ENCODED_SIZE: usize = 52;

    /// Create an empty entry for a symbol.
    pub fn new(symbol_fp: u32) -> Self {
        Self {
            symbol_fp,
            last_price: 0,
            last_quantity: 0,
            volume_24h: 0,
            best_bid: 0,
            best_ask: u64::MAX,
            timestamp: 0,
        }
    }

    /// Fold one executed trade into the entry.
    pub fn apply_trade(&mut self, price: u64, quantity: u64, timestamp: u64) {
        self.last_price = price;
        self.last_quantity = quantity;
        self.volume_24h = self.volume_24h.saturating_add(quantity);
        self.timestamp = timestamp;
    }

    /// Refresh the cached top of book.
    pub fn update_best(&mut self, best_bid: u64, best_ask: u64, timestamp: u64) {
        self.best_bid = best_bid;
        self.best_ask = best_ask;
        self.timestamp = timestamp;
    }

    /// Spread between best ask and best bid; `None` when either side is empty.
    pub fn spread(&self) -> Option<u64> {
        if self.best_bid == 0 || self.best_ask == u64::MAX {
            None
        } else {
            Some(self.best_ask - self.best_bid)
        }
    }

    /// Serialize to the fixed little-endian record layout.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0..4].copy_from_slice(&self.symbol_fp.to_le_bytes());
        buf[4..12].copy_from_slice(&self.last_price.to_le_bytes());
        buf[12..20].copy_from_slice(&self.last_quantity.to_le_bytes());
        buf[20..28].copy_from_slice(&self.volume_24h.to_le_bytes());
        buf[28..36].copy_from_slice(&self.best_bid.to_le_bytes());
        buf[36..44].copy_from_slice(&self.best_ask.to_le_bytes());
        buf[44..52].copy_from_slice(&self.timestamp.to_le_bytes());
        buf
    }

    /// Deserialize from the fixed record layout.
    pub fn from_bytes(buf: &[u8; Self::ENCODED_SIZE]) -> Self {
        Self {
            symbol_fp: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            last_price: u64::from_le_bytes(buf[4..12].try_into().unwrap()),
            last_quantity: u64::from_le_bytes(buf[12..20].try_into().unwrap()),
            volume_24h: u64::from_le_bytes(buf[20..28].try_into().unwrap()),
            best_bid: u64::from_le_bytes(buf[28..36].try_into().unwrap()),
            best_ask: u64::from_le_bytes(buf[36..44].try_into().unwrap()),
            timestamp: u64::from_le_bytes(buf[44..52].try_into().unwrap()),
        }
    }
}
