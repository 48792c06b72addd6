//! Shared region layout
//!
//! Defines the byte layout of the memory-mapped exchange region:
//!
//! ```text
//! Header(64) | OrderRing | TradeRing | MarketData[MAX_SYMBOLS]
//!            | Levels[MAX_SYMBOLS][2][MAX_LEVELS]
//! ```
//!
//! All offsets are compile-time constants; every multi-byte integer in
//! the region is little-endian. The header's eight words are naturally
//! aligned u64s so they can be accessed atomically.

use types::level::LevelRecord;
use types::market::MarketDataRecord;
use types::order::{OrderRecord, Side};
use types::trade::TradeRecord;

/// Header size in bytes
pub const HEADER_SIZE: usize = 64;

/// Number of order ring slots
pub const ORDER_RING_CAPACITY: u64 = 1024 * 1024;
/// Number of trade ring slots
pub const TRADE_RING_CAPACITY: u64 = 1024 * 1024;
/// Maximum number of registered symbols
pub const MAX_SYMBOLS: usize = 1000;
/// Price level slots per symbol per side
pub const MAX_LEVELS: u64 = 10_000;

/// Order slot stride; the 44-byte record is padded up to 52
pub const ORDER_SLOT_SIZE: usize = 52;
/// Trade slot stride
pub const TRADE_SLOT_SIZE: usize = TradeRecord::ENCODED_SIZE;

/// Header word offsets, each an 8-byte little-endian integer
pub mod header {
    pub const ORDER_RING_HEAD: usize = 0;
    pub const ORDER_RING_TAIL: usize = 8;
    pub const TRADE_RING_HEAD: usize = 16;
    pub const TRADE_RING_TAIL: usize = 24;
    pub const NEXT_TRADE_ID: usize = 32;
    pub const LAST_UPDATE_TS: usize = 40;
    pub const VERSION: usize = 48;
    pub const STATUS: usize = 56;
}

/// Engine status word values
pub const STATUS_ACTIVE: u64 = 1;
pub const STATUS_IDLE: u64 = 0;

pub const ORDER_RING_OFFSET: usize = HEADER_SIZE;
pub const ORDER_RING_SIZE: usize = ORDER_RING_CAPACITY as usize * ORDER_SLOT_SIZE;

pub const TRADE_RING_OFFSET: usize = ORDER_RING_OFFSET + ORDER_RING_SIZE;
pub const TRADE_RING_SIZE: usize = TRADE_RING_CAPACITY as usize * TRADE_SLOT_SIZE;

pub const MARKET_DATA_OFFSET: usize = TRADE_RING_OFFSET + TRADE_RING_SIZE;
pub const MARKET_DATA_SIZE: usize = MAX_SYMBOLS * MarketDataRecord::ENCODED_SIZE;

pub const LEVELS_OFFSET: usize = MARKET_DATA_OFFSET + MARKET_DATA_SIZE;
/// Bid plus ask slabs for every symbol
pub const LEVELS_SIZE: usize =
    MAX_SYMBOLS * 2 * MAX_LEVELS as usize * LevelRecord::ENCODED_SIZE;

/// Total mapped region size
pub const TOTAL_SIZE: usize = LEVELS_OFFSET + LEVELS_SIZE;

/// Byte offset of an order ring slot
#[inline]
pub fn order_slot_offset(index: u64) -> usize {
    debug_assert!(index < ORDER_RING_CAPACITY);
    ORDER_RING_OFFSET + index as usize * ORDER_SLOT_SIZE
}

/// Byte offset of a trade ring slot
#[inline]
pub fn trade_slot_offset(index: u64) -> usize {
    debug_assert!(index < TRADE_RING_CAPACITY);
    TRADE_RING_OFFSET + index as usize * TRADE_SLOT_SIZE
}

/// Byte offset of a symbol's market data record
#[inline]
pub fn market_data_offset(symbol_index: usize) -> usize {
    debug_assert!(symbol_index < MAX_SYMBOLS);
    MARKET_DATA_OFFSET + symbol_index * MarketDataRecord::ENCODED_SIZE
}

/// Byte offset of the first bid level slot of a symbol
#[inline]
pub fn bid_levels_offset(symbol_index: usize) -> usize {
    debug_assert!(symbol_index < MAX_SYMBOLS);
    LEVELS_OFFSET + symbol_index * 2 * MAX_LEVELS as usize * LevelRecord::ENCODED_SIZE
}

/// Byte offset of the first ask level slot of a symbol
#[inline]
pub fn ask_levels_offset(symbol_index: usize) -> usize {
    bid_levels_offset(symbol_index) + MAX_LEVELS as usize * LevelRecord::ENCODED_SIZE
}

/// Byte offset of the level slot for a price on one side of a symbol.
///
/// The slot index is `price % MAX_LEVELS`; distinct prices can collide,
/// which makes the mapped level array a lossy projection of the book.
#[inline]
pub fn level_slot_offset(symbol_index: usize, side: Side, price: u64) -> usize {
    let base = match side {
        Side::BUY => bid_levels_offset(symbol_index),
        Side::SELL => ask_levels_offset(symbol_index),
    };
    base + (price % MAX_LEVELS) as usize * LevelRecord::ENCODED_SIZE
}

// The order record must fit its slot (the slot carries 8 trailing pad
// bytes); the trade record fills its slot exactly.
const _: () = assert!(OrderRecord::ENCODED_SIZE <= ORDER_SLOT_SIZE);
const _: () = assert!(TradeRecord::ENCODED_SIZE == TRADE_SLOT_SIZE);
