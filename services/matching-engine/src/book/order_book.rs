//! Per-symbol order book and matching
//!
//! Bids and asks are sorted maps of price to level; each level owns the
//! FIFO queue of resting orders at that price, so the level aggregate
//! always equals the queue contents. Matching follows strict price-time
//! priority: best opposite price first, earliest resting order first
//! within a price. The book is owned by the single engine thread and
//! `process_order` is not re-entrant.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use types::level::LevelRecord;
use types::order::{OrderRecord, OrderType, Side};
use types::symbol::symbol_fingerprint;

use super::price_level::{PriceLevel, RestingOrder};
use crate::store::RestingOrderStore;

/// What happens to the unfilled remainder of a market order.
///
/// It never rests in the book either way; `Park` records it in the side
/// store at the last-seen execution price for operational visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarketRemainderPolicy {
    /// Discard the remainder
    #[default]
    Drop,
    /// Record the remainder in the resting-order store
    Park,
}

/// One execution against a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub buy_order_id: u64,
    pub sell_order_id: u64,
    /// The resting side's price
    pub price: u64,
    pub quantity: u64,
}

/// Result of processing one incoming order
#[derive(Debug, Default)]
pub struct MatchOutcome {
    /// Executions in matching order (best price first, FIFO within price)
    pub fills: Vec<Fill>,
    /// Price levels whose aggregates changed, including emptied ones
    pub touched: Vec<(Side, u64)>,
}

impl MatchOutcome {
    fn touch(&mut self, side: Side, price: u64) {
        self.touched.push((side, price));
    }
}

/// Order book for a single symbol
pub struct OrderBook {
    symbol: String,
    symbol_index: usize,
    fingerprint: u32,
    /// Best bid is the last key, best ask the first
    bids: BTreeMap<u64, PriceLevel>,
    asks: BTreeMap<u64, PriceLevel>,
    best_bid: u64,
    best_ask: u64,
    store: Arc<dyn RestingOrderStore>,
    remainder_policy: MarketRemainderPolicy,
}

impl OrderBook {
    pub fn new(
        symbol: impl Into<String>,
        symbol_index: usize,
        store: Arc<dyn RestingOrderStore>,
        remainder_policy: MarketRemainderPolicy,
    ) -> Self {
        let symbol = symbol.into();
        let fingerprint = symbol_fingerprint(&symbol);
        Self {
            symbol,
            symbol_index,
            fingerprint,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            best_bid: 0,
            best_ask: u64::MAX,
            store,
            remainder_policy,
        }
    }

    /// Match one incoming order against the book.
    ///
    /// Terminal within this call: the order ends fully filled, resting
    /// (limit remainder), or dropped (market remainder). The best-price
    /// cache is refreshed before returning.
    pub fn process_order(&mut self, order: &OrderRecord) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();

        match order.order_type {
            OrderType::Limit => self.process_limit(order, &mut outcome),
            OrderType::Market => self.process_market(order, None, &mut outcome),
            OrderType::MarketWithPrice => {
                self.process_market(order, Some(order.price), &mut outcome)
            }
        }

        self.refresh_best_prices();
        outcome
    }

    fn process_limit(&mut self, order: &OrderRecord, outcome: &mut MatchOutcome) {
        let remaining = self.sweep(order, Some(order.price), outcome);
        if remaining > 0 {
            self.rest(order, remaining, outcome);
        }
    }

    fn process_market(
        &mut self,
        order: &OrderRecord,
        cap: Option<u64>,
        outcome: &mut MatchOutcome,
    ) {
        let remaining = self.sweep(order, cap, outcome);
        if remaining == 0 {
            return;
        }

        match self.remainder_policy {
            MarketRemainderPolicy::Drop => {
                debug!(
                    symbol = %self.symbol,
                    order_id = order.order_id,
                    remaining,
                    "market order remainder dropped"
                );
            }
            MarketRemainderPolicy::Park => {
                // A capped order parks at its cap; an uncapped one is
                // keyed to the last execution price.
                let park_price = cap.or_else(|| outcome.fills.last().map(|f| f.price));
                if let Some(price) = park_price {
                    let mut parked = *order;
                    parked.price = price;
                    parked.quantity = remaining;
                    self.store.add(parked);
                    debug!(
                        symbol = %self.symbol,
                        order_id = order.order_id,
                        remaining,
                        price,
                        "market order remainder parked in store"
                    );
                }
            }
        }
    }

    /// Consume opposite-side liquidity from the best price inward.
    ///
    /// `cap` bounds how far the sweep may walk: a buy matches levels at
    /// or below it, a sell at or above it. Returns the unfilled
    /// remainder.
    fn sweep(&mut self, order: &OrderRecord, cap: Option<u64>, outcome: &mut MatchOutcome) -> u64 {
        let mut remaining = order.quantity;
        let maker_side = order.side.opposite();

        while remaining > 0 {
            let levels = match maker_side {
                Side::SELL => &mut self.asks,
                Side::BUY => &mut self.bids,
            };
            let entry = match maker_side {
                Side::SELL => levels.iter_mut().next(),
                Side::BUY => levels.iter_mut().next_back(),
            };
            let Some((&price, level)) = entry else { break };

            if let Some(cap) = cap {
                let crosses = match order.side {
                    Side::BUY => price <= cap,
                    Side::SELL => price >= cap,
                };
                if !crosses {
                    break;
                }
            }

            while remaining > 0 {
                let Some(front) = level.front().copied() else { break };
                let take = remaining.min(front.quantity);

                let (buy_order_id, sell_order_id) = match order.side {
                    Side::BUY => (order.order_id, front.order_id),
                    Side::SELL => (front.order_id, order.order_id),
                };
                outcome.fills.push(Fill {
                    buy_order_id,
                    sell_order_id,
                    price,
                    quantity: take,
                });
                remaining -= take;

                if level.consume_front(take) {
                    self.store.remove(front.order_id);
                } else {
                    self.store.update_quantity(front.order_id, front.quantity - take);
                }
            }

            outcome.touch(maker_side, price);
            if level.is_empty() {
                levels.remove(&price);
            }
        }

        remaining
    }

    /// Rest the remainder of a limit order on its own side.
    fn rest(&mut self, order: &OrderRecord, remaining: u64, outcome: &mut MatchOutcome) {
        let levels = match order.side {
            Side::BUY => &mut self.bids,
            Side::SELL => &mut self.asks,
        };
        let level = levels.entry(order.price).or_default();
        level.push(RestingOrder {
            order_id: order.order_id,
            quantity: remaining,
            timestamp: order.timestamp,
        });

        let mut stored = *order;
        stored.quantity = remaining;
        self.store.add(stored);

        outcome.touch(order.side, order.price);
    }

    fn refresh_best_prices(&mut self) {
        self.best_bid = self.bids.keys().next_back().copied().unwrap_or(0);
        self.best_ask = self.asks.keys().next().copied().unwrap_or(u64::MAX);
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Highest resting bid price; 0 when the bid side is empty.
    pub fn best_bid(&self) -> u64 {
        self.best_bid
    }

    /// Lowest resting ask price; `u64::MAX` when the ask side is empty.
    pub fn best_ask(&self) -> u64 {
        self.best_ask
    }

    /// Best ask minus best bid; `None` when either side is empty.
    pub fn spread(&self) -> Option<u64> {
        if self.best_bid == 0 || self.best_ask == u64::MAX {
            None
        } else {
            Some(self.best_ask - self.best_bid)
        }
    }

    /// Aggregate at one price on one side; zeroed when no level exists.
    pub fn level_snapshot(&self, side: Side, price: u64) -> LevelRecord {
        let levels = match side {
            Side::BUY => &self.bids,
            Side::SELL => &self.asks,
        };
        levels
            .get(&price)
            .map(|level| level.snapshot(price))
            .unwrap_or_else(|| LevelRecord::new(price, 0, 0))
    }

    /// Top bid levels, best (highest) price first.
    pub fn top_bid_levels(&self, count: usize) -> Vec<LevelRecord> {
        self.bids
            .iter()
            .rev()
            .take(count)
            .map(|(&price, level)| level.snapshot(price))
            .collect()
    }

    /// Top ask levels, best (lowest) price first.
    pub fn top_ask_levels(&self, count: usize) -> Vec<LevelRecord> {
        self.asks
            .iter()
            .take(count)
            .map(|(&price, level)| level.snapshot(price))
            .collect()
    }

    pub fn bid_level_count(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_level_count(&self) -> usize {
        self.asks.len()
    }

    /// Resting orders at a price, in queue order (test/diagnostic view).
    pub fn orders_at(&self, side: Side, price: u64) -> Vec<RestingOrder> {
        let levels = match side {
            Side::BUY => &self.bids,
            Side::SELL => &self.asks,
        };
        levels
            .get(&price)
            .map(|level| level.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn symbol_index(&self) -> usize {
        self.symbol_index
    }

    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }
}
