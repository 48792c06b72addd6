//! End-to-end matching scenarios
//!
//! Each scenario drives a fresh engine through the admission layer and
//! verifies the trades published to the trade ring, the book state, and
//! the mapped snapshots afterwards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use matching_engine::{
    EngineConfig, InMemoryRestingStore, MarketDataReader, MatchingEngine, RestingOrderStore,
};
use tempfile::TempDir;
use types::order::{OrderRecord, OrderType, Side};
use types::symbol::symbol_fingerprint;
use types::trade::TradeRecord;

struct Harness {
    engine: MatchingEngine,
    store: Arc<InMemoryRestingStore>,
    _tmp: TempDir,
}

fn harness() -> Harness {
    let tmp = TempDir::new().unwrap();
    let config = EngineConfig {
        data_path: tmp.path().join("exchange.bin"),
        ..EngineConfig::default()
    };
    let store = Arc::new(InMemoryRestingStore::new());
    let mut engine = MatchingEngine::with_store(config, store.clone()).unwrap();
    engine.start().unwrap();
    Harness {
        engine,
        store,
        _tmp: tmp,
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met within 5s");
        std::thread::sleep(Duration::from_millis(1));
    }
}

impl Harness {
    fn submit_limit(&self, side: Side, price: u64, quantity: u64) -> u64 {
        self.engine
            .admission()
            .submit_limit("BTC-USD", side, price, quantity)
            .unwrap()
    }

    fn submit_market(&self, side: Side, quantity: u64) -> u64 {
        self.engine
            .admission()
            .submit_market("BTC-USD", side, quantity)
            .unwrap()
    }

    fn wait_processed(&self, orders: u64) {
        wait_until(|| self.engine.statistics().processed_orders >= orders);
    }

    fn drain_trades(&self) -> Vec<TradeRecord> {
        let mut trades = Vec::new();
        while let Some(trade) = self.engine.trade_ring().poll() {
            trades.push(trade);
        }
        trades
    }

    fn ask_levels(&self) -> Vec<(u64, u64, u64)> {
        self.engine
            .order_book_snapshot("BTC-USD", 10)
            .unwrap()
            .asks
            .iter()
            .map(|l| (l.price, l.total_quantity, l.order_count))
            .collect()
    }

    fn bid_levels(&self) -> Vec<(u64, u64, u64)> {
        self.engine
            .order_book_snapshot("BTC-USD", 10)
            .unwrap()
            .bids
            .iter()
            .map(|l| (l.price, l.total_quantity, l.order_count))
            .collect()
    }
}

#[test]
fn scenario_single_level_partial_fill_then_two_level_sweep() {
    let h = harness();

    // Two resting sells, then a small crossing buy.
    let sell_a = h.submit_limit(Side::SELL, 5_000, 10);
    let sell_b = h.submit_limit(Side::SELL, 5_100, 10);
    let buy = h.submit_limit(Side::BUY, 5_100, 1);
    h.wait_processed(3);

    let trades = h.drain_trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].buy_order_id, buy);
    assert_eq!(trades[0].sell_order_id, sell_a);
    assert_eq!(trades[0].price, 5_000);
    assert_eq!(trades[0].quantity, 1);

    assert_eq!(h.ask_levels(), vec![(5_000, 9, 1), (5_100, 10, 1)]);
    assert!(h.bid_levels().is_empty());

    // Continuing from that state: an 11-lot buy sweeps the first level
    // and bites into the second.
    let big_buy = h.submit_limit(Side::BUY, 5_100, 11);
    h.wait_processed(4);

    let trades = h.drain_trades();
    assert_eq!(trades.len(), 2);
    assert_eq!(
        (trades[0].buy_order_id, trades[0].sell_order_id, trades[0].price, trades[0].quantity),
        (big_buy, sell_a, 5_000, 9)
    );
    assert_eq!(
        (trades[1].buy_order_id, trades[1].sell_order_id, trades[1].price, trades[1].quantity),
        (big_buy, sell_b, 5_100, 2)
    );

    assert_eq!(h.ask_levels(), vec![(5_100, 8, 1)]);
    assert!(h.bid_levels().is_empty());
}

#[test]
fn scenario_time_priority_within_level() {
    let h = harness();

    let first = h.submit_limit(Side::SELL, 5_000, 5);
    let second = h.submit_limit(Side::SELL, 5_000, 3);
    let buy = h.submit_limit(Side::BUY, 5_000, 6);
    h.wait_processed(3);

    let trades = h.drain_trades();
    assert_eq!(trades.len(), 2);
    // The earlier sell fills completely before the later one is touched.
    assert_eq!(
        (trades[0].buy_order_id, trades[0].sell_order_id, trades[0].quantity),
        (buy, first, 5)
    );
    assert_eq!(
        (trades[1].buy_order_id, trades[1].sell_order_id, trades[1].quantity),
        (buy, second, 1)
    );

    assert_eq!(h.ask_levels(), vec![(5_000, 2, 1)]);
    // Only the second sell's remainder survives in the side store.
    assert!(h.store.get(first).is_none());
    assert_eq!(h.store.get(second).unwrap().quantity, 2);
}

#[test]
fn scenario_sell_hits_best_bid() {
    let h = harness();

    let low_bid = h.submit_limit(Side::BUY, 4_900, 10);
    let high_bid = h.submit_limit(Side::BUY, 5_000, 10);
    let sell = h.submit_limit(Side::SELL, 4_900, 1);
    h.wait_processed(3);

    let trades = h.drain_trades();
    assert_eq!(trades.len(), 1);
    // Execution happens at the best bid, not at the sell's limit.
    assert_eq!(
        (trades[0].buy_order_id, trades[0].sell_order_id, trades[0].price, trades[0].quantity),
        (high_bid, sell, 5_000, 1)
    );

    assert_eq!(h.bid_levels(), vec![(5_000, 9, 1), (4_900, 10, 1)]);
    assert_eq!(h.store.get(low_bid).unwrap().quantity, 10);
}

#[test]
fn scenario_market_sweep_with_dropped_remainder() {
    let h = harness();

    h.submit_limit(Side::SELL, 50_000, 5);
    h.submit_limit(Side::SELL, 50_050, 3);
    h.submit_limit(Side::SELL, 50_100, 5);
    let market = h.submit_market(Side::BUY, 25);
    h.wait_processed(4);

    let trades = h.drain_trades();
    let executions: Vec<(u64, u64)> = trades.iter().map(|t| (t.price, t.quantity)).collect();
    assert_eq!(executions, vec![(50_000, 5), (50_050, 3), (50_100, 5)]);

    // The 12 unfilled units are discarded: nothing rests anywhere.
    assert!(h.ask_levels().is_empty());
    assert!(h.bid_levels().is_empty());
    assert!(h.store.get(market).is_none());
}

#[test]
fn scenario_unknown_fingerprint_is_dropped() {
    let h = harness();

    // Bypass admission and commit a well-formed order whose fingerprint
    // is not registered.
    let rogue = OrderRecord::new(999, "DOGE-USD", Side::BUY, OrderType::Limit, 5_000, 1, 1_000);
    assert!(h.engine.order_ring().offer(&rogue));

    wait_until(|| h.engine.statistics().unknown_symbol_drops == 1);

    // The slot was consumed, no trade was emitted, and no book changed.
    assert!(h.engine.order_ring().is_empty());
    assert!(h.engine.trade_ring().is_empty());
    assert!(h.ask_levels().is_empty());
    assert!(h.bid_levels().is_empty());
    assert_eq!(h.engine.statistics().processed_trades, 0);
}

#[test]
fn scenario_market_data_and_level_snapshots_reach_the_mapped_region() {
    let h = harness();

    h.submit_limit(Side::SELL, 5_000, 10);
    h.submit_limit(Side::BUY, 5_000, 4);
    h.wait_processed(2);

    // BTC-USD is the first default symbol, index 0.
    let region_path = h.engine.region().path().to_path_buf();
    h.engine.region().flush().unwrap();
    let reader = MarketDataReader::open(&region_path).unwrap();

    let market = reader.market_data(0).unwrap();
    assert_eq!(market.symbol_fp, symbol_fingerprint("BTC-USD"));
    assert_eq!(market.last_price, 5_000);
    assert_eq!(market.last_quantity, 4);
    assert_eq!(market.volume_24h, 4);
    assert_eq!(market.best_ask, 5_000);
    assert_eq!(market.best_bid, 0);

    let level = reader.level(0, Side::SELL, 5_000).unwrap();
    assert_eq!(level.price, 5_000);
    assert_eq!(level.total_quantity, 6);
    assert_eq!(level.order_count, 1);

    // In-process view agrees with the mapped one.
    assert_eq!(h.engine.market_data("BTC-USD").unwrap(), market);
}
