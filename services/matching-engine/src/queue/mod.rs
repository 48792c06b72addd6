//! Ring queues over the mapped region
//!
//! Order intake (submitters produce, engine consumes) and trade output
//! (engine produces, downstream consumers poll).

pub mod order_ring;
pub mod trade_ring;

pub use order_ring::OrderRing;
pub use trade_ring::TradeRing;
