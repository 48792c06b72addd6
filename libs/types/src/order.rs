//! Order sides, order types, and the order slot record
//!
//! An order occupies a fixed-size slot in the shared order ring. Enum
//! wire values start at zero so that a zero-initialized slot decodes to
//! the lowest-risk variants and is then rejected by the validity
//! predicate (`order_id == 0`), never as a rare corrupt variant.

use serde::{Deserialize, Serialize};

use crate::symbol::symbol_fingerprint;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }

    /// Wire value of this side
    pub fn as_u32(self) -> u32 {
        match self {
            Side::BUY => 0,
            Side::SELL => 1,
        }
    }

    /// Decode a wire value. Out-of-range values map to the default
    /// variant; the surrounding record is caught by `is_valid`.
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => Side::SELL,
            _ => Side::BUY,
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Rest at the limit price when not fully matched
    Limit,
    /// Sweep the opposite side at any price; the remainder never rests
    Market,
    /// Sweep the opposite side up to a price cap; the remainder never rests
    MarketWithPrice,
}

impl OrderType {
    /// Wire value of this order type
    pub fn as_u32(self) -> u32 {
        match self {
            OrderType::Limit => 0,
            OrderType::Market => 1,
            OrderType::MarketWithPrice => 2,
        }
    }

    /// Decode a wire value, mapping out-of-range values to `Limit`.
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => OrderType::Market,
            2 => OrderType::MarketWithPrice,
            _ => OrderType::Limit,
        }
    }

    /// Whether this type carries a meaningful price field
    pub fn is_priced(self) -> bool {
        !matches!(self, OrderType::Market)
    }
}

/// Order slot record
///
/// Prices are integers in the symbol's minor unit, quantities in base
/// units, timestamps in monotonic nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: u64,
    pub symbol_fp: u32,
    pub side: Side,
    pub order_type: OrderType,
    pub price: u64,
    pub quantity: u64,
    pub timestamp: u64,
}

impl OrderRecord {
    /// Serialized size in bytes
    pub const ENCODED_SIZE: usize = 44;

    /// Create an order record, deriving the fingerprint from the symbol.
    pub fn new(
        order_id: u64,
        symbol: &str,
        side: Side,
        order_type: OrderType,
        price: u64,
        quantity: u64,
        timestamp: u64,
    ) -> Self {
        Self {
            order_id,
            symbol_fp: symbol_fingerprint(symbol),
            side,
            order_type,
            price,
            quantity,
            timestamp,
        }
    }

    /// An order is valid iff it has a positive id, quantity and
    /// timestamp, and a positive price unless it is a pure market order.
    pub fn is_valid(&self) -> bool {
        self.order_id > 0
            && self.quantity > 0
            && self.timestamp > 0
            && (!self.order_type.is_priced() || self.price > 0)
    }

    /// Serialize to the fixed little-endian slot layout.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0..8].copy_from_slice(&self.order_id.to_le_bytes());
        buf[8..12].copy_from_slice(&self.symbol_fp.to_le_bytes());
        buf[12..16].copy_from_slice(&self.side.as_u32().to_le_bytes());
        buf[16..20].copy_from_slice(&self.order_type.as_u32().to_le_bytes());
        buf[20..28].copy_from_slice(&self.price.to_le_bytes());
        buf[28..36].copy_from_slice(&self.quantity.to_le_bytes());
        buf[36..44].copy_from_slice(&self.timestamp.to_le_bytes());
        buf
    }

    /// Deserialize from the fixed slot layout.
    ///
    /// Never fails: malformed enum values decode to their default
    /// variants and the record is screened by `is_valid` instead.
    pub fn from_bytes(buf: &[u8; Self::ENCODED_SIZE]) -> Self {
        Self {
            order_id: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            symbol_fp: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            side: Side::from_u32(u32::from_le_bytes(buf[12..16].try_into().unwrap())),
            order_type: OrderType::from_u32(u32::from_le_bytes(buf[16..20].try_into().unwrap())),
            price: u64::from_le_bytes(buf[20..28].try_into().unwrap()),
            quantity: u64::from_le_bytes(buf[28..36].try_into().unwrap()),
            timestamp: u64::from_le_bytes(buf[36..44].try_into().unwrap()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> OrderRecord {
        OrderRecord::new(42, "BTC-USD", Side::BUY, OrderType::Limit, 50_000, 10, 1_000)
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::BUY.opposite(), Side::SELL);
        assert_eq!(Side::SELL.opposite(), Side::BUY);
    }

    #[test]
    fn test_side_wire_values() {
        assert_eq!(Side::BUY.as_u32(), 0);
        assert_eq!(Side::SELL.as_u32(), 1);
        assert_eq!(Side::from_u32(0), Side::BUY);
        assert_eq!(Side::from_u32(1), Side::SELL);
    }

    #[test]
    fn test_side_out_of_range_defaults_to_buy() {
        assert_eq!(Side::from_u32(7), Side::BUY);
    }

    #[test]
    fn test_order_type_out_of_range_defaults_to_limit() {
        assert_eq!(OrderType::from_u32(99), OrderType::Limit);
    }

    #[test]
    fn test_order_roundtrip() {
        let order = sample_order();
        let decoded = OrderRecord::from_bytes(&order.to_bytes());
        assert_eq!(order, decoded);
    }

    #[test]
    fn test_zeroed_slot_decodes_invalid() {
        let decoded = OrderRecord::from_bytes(&[0u8; OrderRecord::ENCODED_SIZE]);
        assert_eq!(decoded.side, Side::BUY);
        assert_eq!(decoded.order_type, OrderType::Limit);
        assert!(!decoded.is_valid());
    }

    #[test]
    fn test_validity_predicate() {
        let order = sample_order();
        assert!(order.is_valid());

        let mut bad = order;
        bad.order_id = 0;
        assert!(!bad.is_valid());

        let mut bad = order;
        bad.quantity = 0;
        assert!(!bad.is_valid());

        let mut bad = order;
        bad.timestamp = 0;
        assert!(!bad.is_valid());

        // A limit order needs a price, a market order does not.
        let mut bad = order;
        bad.price = 0;
        assert!(!bad.is_valid());
        bad.order_type = OrderType::Market;
        assert!(bad.is_valid());
        bad.order_type = OrderType::MarketWithPrice;
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_order_serialization() {
        let order = sample_order();
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: OrderRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
