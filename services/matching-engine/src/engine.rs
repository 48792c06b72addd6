//! Matching engine
//!
//! The single consumer of the order ring. One dedicated thread drains
//! orders, dispatches each to its symbol's book, appends the resulting
//! trades to the trade ring, and refreshes the mapped market-data and
//! price-level snapshots. The thread is the sole writer of book state
//! and of every mapped byte except the order ring's producer side.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use types::level::LevelRecord;
use types::market::MarketDataRecord;
use types::order::OrderRecord;

use crate::admission::Admission;
use crate::book::{Fill, MarketRemainderPolicy, OrderBook};
use crate::clock;
use crate::queue::{OrderRing, TradeRing};
use crate::registry::{RegistryError, SymbolRegistry};
use crate::shm::{layout, MappedRegion, RegionError};
use crate::stats::{EngineStats, EngineStatistics};
use crate::store::{InMemoryRestingStore, RestingOrderStore};

/// Symbols registered on every startup
pub const DEFAULT_SYMBOLS: [&str; 5] =
    ["BTC-USD", "ETH-USD", "BNB-USD", "ADA-USD", "SOL-USD"];

/// Deadline for the engine thread to exit after a stop request
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path of the mapped region file
    pub data_path: PathBuf,
    /// Sleep when the order ring is empty
    pub idle_poll: Duration,
    /// What to do with the unfilled remainder of a market order
    pub remainder_policy: MarketRemainderPolicy,
    /// Retries before a full trade ring halts the engine
    pub trade_ring_retries: u32,
    /// Sleep between trade-ring retries
    pub trade_ring_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./data/exchange.bin"),
            idle_poll: Duration::from_millis(1),
            remainder_policy: MarketRemainderPolicy::Drop,
            trade_ring_retries: 100,
            trade_ring_backoff: Duration::from_millis(1),
        }
    }
}

/// Engine lifecycle and registration failures
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("region error: {0}")]
    Region(#[from] RegionError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("engine already running")]
    AlreadyRunning,
}

/// Authoritative top-N view of one book, for status surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct OrderBookSnapshot {
    pub symbol: String,
    pub bids: Vec<LevelRecord>,
    pub asks: Vec<LevelRecord>,
    pub best_bid: u64,
    pub best_ask: u64,
    pub spread: Option<u64>,
    pub timestamp: u64,
}

/// Book plus the market-data entry the engine maintains for it.
struct SymbolState {
    book: OrderBook,
    market: MarketDataRecord,
}

struct Worker {
    handle: JoinHandle<()>,
    done_rx: Receiver<()>,
}

/// The matching engine and its shared handles.
pub struct MatchingEngine {
    config: EngineConfig,
    region: Arc<MappedRegion>,
    order_ring: Arc<OrderRing>,
    trade_ring: Arc<TradeRing>,
    store: Arc<dyn RestingOrderStore>,
    registry: Arc<SymbolRegistry>,
    books: Arc<Mutex<HashMap<u32, SymbolState>>>,
    stats: Arc<EngineStats>,
    running: Arc<AtomicBool>,
    next_order_id: Arc<AtomicU64>,
    producer: Arc<Mutex<()>>,
    worker: Option<Worker>,
}

impl MatchingEngine {
    /// Open the region and prepare the engine with the in-memory store.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_store(config, Arc::new(InMemoryRestingStore::new()))
    }

    /// Open the region and prepare the engine with a custom side store.
    pub fn with_store(
        config: EngineConfig,
        store: Arc<dyn RestingOrderStore>,
    ) -> Result<Self, EngineError> {
        let region = Arc::new(MappedRegion::open(&config.data_path)?);
        let order_ring = Arc::new(OrderRing::new(region.clone()));
        let trade_ring = Arc::new(TradeRing::new(region.clone()));

        let engine = Self {
            config,
            region,
            order_ring,
            trade_ring,
            store,
            registry: Arc::new(SymbolRegistry::new()),
            books: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(EngineStats::new()),
            running: Arc::new(AtomicBool::new(false)),
            next_order_id: Arc::new(AtomicU64::new(1)),
            producer: Arc::new(Mutex::new(())),
            worker: None,
        };

        for symbol in DEFAULT_SYMBOLS {
            engine.add_symbol(symbol)?;
        }
        info!(symbols = engine.registry.len(), "matching engine initialized");
        Ok(engine)
    }

    /// Register a symbol and create its book.
    ///
    /// Returns false when the symbol was already registered. Fails on a
    /// fingerprint collision or once the symbol limit is reached.
    pub fn add_symbol(&self, symbol: &str) -> Result<bool, EngineError> {
        let Some(info) = self.registry.register(symbol)? else {
            return Ok(false);
        };

        let state = SymbolState {
            book: OrderBook::new(
                symbol,
                info.index,
                self.store.clone(),
                self.config.remainder_policy,
            ),
            market: MarketDataRecord::new(info.fingerprint),
        };
        if let Ok(mut books) = self.books.lock() {
            books.insert(info.fingerprint, state);
        }
        info!(symbol, index = info.index, fingerprint = info.fingerprint, "symbol registered");
        Ok(true)
    }

    /// Start the consumer thread.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(EngineError::AlreadyRunning);
        }

        self.region.set_active(true);
        let (done_tx, done_rx) = mpsc::channel();
        let core = EngineCore {
            region: self.region.clone(),
            order_ring: self.order_ring.clone(),
            trade_ring: self.trade_ring.clone(),
            books: self.books.clone(),
            stats: self.stats.clone(),
            running: self.running.clone(),
            idle_poll: self.config.idle_poll,
            trade_ring_retries: self.config.trade_ring_retries,
            trade_ring_backoff: self.config.trade_ring_backoff,
            done_tx,
        };

        let handle = match thread::Builder::new()
            .name("matching-engine".to_string())
            .spawn(move || core.run())
        {
            Ok(handle) => handle,
            Err(err) => {
                self.running.store(false, Ordering::Release);
                self.region.set_active(false);
                return Err(RegionError::Io(err).into());
            }
        };

        self.worker = Some(Worker { handle, done_rx });
        info!("matching engine started");
        Ok(())
    }

    /// Request shutdown, wait for the in-flight order to finish, clear
    /// the region status, and flush.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);

        if let Some(worker) = self.worker.take() {
            match worker.done_rx.recv_timeout(SHUTDOWN_DEADLINE) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    let _ = worker.handle.join();
                }
                Err(RecvTimeoutError::Timeout) => {
                    error!("engine thread did not stop within {:?}", SHUTDOWN_DEADLINE);
                    return;
                }
            }
        }

        self.region.set_active(false);
        if let Err(err) = self.region.flush() {
            error!(%err, "failed to flush region on shutdown");
        }
        info!("matching engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Submitter-facing handle; clones share the id sequence and the
    /// producer lock.
    pub fn admission(&self) -> Admission {
        Admission::new(
            self.order_ring.clone(),
            self.registry.clone(),
            self.running.clone(),
            self.next_order_id.clone(),
            self.producer.clone(),
        )
    }

    /// Authoritative depth snapshot from the in-memory book.
    pub fn order_book_snapshot(&self, symbol: &str, depth: usize) -> Option<OrderBookSnapshot> {
        let info = self.registry.info(symbol)?;
        let books = self.books.lock().ok()?;
        let state = books.get(&info.fingerprint)?;
        Some(OrderBookSnapshot {
            symbol: symbol.to_string(),
            bids: state.book.top_bid_levels(depth),
            asks: state.book.top_ask_levels(depth),
            best_bid: state.book.best_bid(),
            best_ask: state.book.best_ask(),
            spread: state.book.spread(),
            timestamp: clock::monotonic_nanos(),
        })
    }

    /// The market-data entry the engine maintains for a symbol.
    pub fn market_data(&self, symbol: &str) -> Option<MarketDataRecord> {
        let info = self.registry.info(symbol)?;
        let books = self.books.lock().ok()?;
        books.get(&info.fingerprint).map(|state| state.market)
    }

    pub fn statistics(&self) -> EngineStatistics {
        EngineStatistics {
            processed_orders: self.stats.processed_orders(),
            processed_trades: self.stats.processed_trades(),
            discarded_slots: self.order_ring.discarded(),
            unknown_symbol_drops: self.stats.unknown_symbol_drops(),
            trade_ring_drops: self.stats.trade_ring_drops(),
            last_process_ns: self.stats.last_process_ns(),
            order_ring_size: self.order_ring.size(),
            trade_ring_size: self.trade_ring.size(),
            symbol_count: self.registry.len(),
            running: self.is_running(),
            timestamp: clock::monotonic_nanos(),
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        self.registry.symbols()
    }

    pub fn order_ring(&self) -> &Arc<OrderRing> {
        &self.order_ring
    }

    pub fn trade_ring(&self) -> &Arc<TradeRing> {
        &self.trade_ring
    }

    pub fn region(&self) -> &Arc<MappedRegion> {
        &self.region
    }

    pub fn store(&self) -> &Arc<dyn RestingOrderStore> {
        &self.store
    }
}

impl Drop for MatchingEngine {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop();
        }
    }
}

/// State moved onto the consumer thread.
struct EngineCore {
    region: Arc<MappedRegion>,
    order_ring: Arc<OrderRing>,
    trade_ring: Arc<TradeRing>,
    books: Arc<Mutex<HashMap<u32, SymbolState>>>,
    stats: Arc<EngineStats>,
    running: Arc<AtomicBool>,
    idle_poll: Duration,
    trade_ring_retries: u32,
    trade_ring_backoff: Duration,
    done_tx: Sender<()>,
}

impl EngineCore {
    fn run(self) {
        info!("engine thread running");
        while self.running.load(Ordering::Acquire) {
            self.process_next();
        }
        // The thread leaves the region idle even when it halted itself.
        self.region.set_active(false);
        if let Err(err) = self.region.flush() {
            error!(%err, "failed to flush region from engine thread");
        }
        info!("engine thread exiting");
        let _ = self.done_tx.send(());
    }

    /// One loop iteration: poll, dispatch, publish, snapshot.
    fn process_next(&self) {
        let Some(order) = self.order_ring.poll() else {
            thread::sleep(self.idle_poll);
            return;
        };

        let started = Instant::now();
        self.dispatch(&order);
        self.region.update_timestamp(clock::monotonic_nanos());
        self.stats.record_order(started.elapsed().as_nanos() as u64);
    }

    fn dispatch(&self, order: &OrderRecord) {
        let Ok(mut books) = self.books.lock() else {
            error!("book table lock poisoned; dropping order");
            return;
        };
        let Some(state) = books.get_mut(&order.symbol_fp) else {
            self.stats.record_unknown_symbol();
            warn!(fingerprint = order.symbol_fp, order_id = order.order_id, "unknown symbol fingerprint");
            return;
        };

        let outcome = state.book.process_order(order);
        let now = clock::monotonic_nanos();

        for fill in &outcome.fills {
            match self.offer_trade_with_backoff(fill, order.symbol_fp) {
                Some(_trade_id) => {
                    state.market.apply_trade(fill.price, fill.quantity, now);
                    self.stats.record_trade();
                }
                None => {
                    self.stats.record_trade_ring_drop();
                    error!(
                        order_id = order.order_id,
                        "trade ring persistently full; halting engine"
                    );
                    self.running.store(false, Ordering::Release);
                    break;
                }
            }
        }

        // Market data is refreshed after the trades it reflects are in
        // the ring; level snapshots include levels that emptied.
        state
            .market
            .update_best(state.book.best_bid(), state.book.best_ask(), now);
        self.region.write_bytes(
            layout::market_data_offset(state.book.symbol_index()),
            &state.market.to_bytes(),
        );
        for &(side, price) in &outcome.touched {
            let snapshot = state.book.level_snapshot(side, price);
            self.region.write_bytes(
                layout::level_slot_offset(state.book.symbol_index(), side, price),
                &snapshot.to_bytes(),
            );
        }
    }

    fn offer_trade_with_backoff(&self, fill: &Fill, symbol_fp: u32) -> Option<u64> {
        let mut attempt = 0;
        loop {
            if let Some(trade_id) = self.trade_ring.offer_trade(
                fill.buy_order_id,
                fill.sell_order_id,
                fill.price,
                fill.quantity,
                symbol_fp,
            ) {
                return Some(trade_id);
            }
            if attempt >= self.trade_ring_retries {
                return None;
            }
            if attempt == 0 {
                warn!("trade ring full; backing off");
            }
            attempt += 1;
            thread::sleep(self.trade_ring_backoff);
        }
    }
}
