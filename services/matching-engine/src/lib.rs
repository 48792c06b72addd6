//! Matching Engine Service
//!
//! Single-venue, multi-symbol limit order matching over a shared
//! memory-mapped region. Orders arrive through an SPSC ring, are
//! matched under strict price-time priority by one dedicated engine
//! thread, and every fill is published to a trade ring while the
//! mapped market-data and price-level snapshots are refreshed in place.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced (best price first, FIFO
//!   within a price)
//! - Orders are processed in ring commit order
//! - Level aggregates always equal their resting-order queues
//! - The engine thread is the sole writer of book state and of the
//!   mapped region outside the order ring's producer side

pub mod admission;
pub mod book;
pub mod clock;
pub mod engine;
pub mod queue;
pub mod reader;
pub mod registry;
pub mod shm;
pub mod stats;
pub mod store;

pub use admission::Admission;
pub use book::{Fill, MarketRemainderPolicy, MatchOutcome, OrderBook};
pub use engine::{EngineConfig, EngineError, MatchingEngine, OrderBookSnapshot, DEFAULT_SYMBOLS};
pub use queue::{OrderRing, TradeRing};
pub use reader::MarketDataReader;
pub use registry::{RegistryError, SymbolInfo, SymbolRegistry};
pub use shm::{MappedRegion, ReadRegion, RegionError};
pub use stats::{EngineStatistics, EngineStats};
pub use store::{InMemoryRestingStore, RestingOrderStore};
