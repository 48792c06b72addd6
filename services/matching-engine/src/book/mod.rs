//! Order book infrastructure
//!
//! Price levels with FIFO resting queues and the per-symbol book that
//! matches incoming orders under price-time priority.

pub mod order_book;
pub mod price_level;

pub use order_book::{Fill, MarketRemainderPolicy, MatchOutcome, OrderBook};
pub use price_level::{PriceLevel, RestingOrder};
