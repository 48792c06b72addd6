//! Error taxonomy for order submission
//!
//! Errors surfaced to callers of the admission layer, using thiserror.
//! Engine-internal failures (region setup, trade-ring pressure) live
//! next to the code that produces them in the engine crate.

use thiserror::Error;

/// Rejection reasons for an order submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("invalid quantity: {quantity}")]
    InvalidQuantity { quantity: u64 },

    #[error("invalid price {price} for {order_type} order")]
    InvalidPrice { price: u64, order_type: String },

    #[error("order ring is full")]
    RingFull,

    #[error("engine is not running")]
    NotRunning,
}
