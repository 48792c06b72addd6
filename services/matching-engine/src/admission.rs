//! Order admission
//!
//! The thin layer submitters call instead of touching the ring: it
//! assigns the order id, stamps the submission time, resolves the
//! symbol fingerprint, validates the request, and offers to the order
//! ring. Producers are serialized by a mutex so the ring stays
//! single-producer; any number of submitter threads may share one
//! admission handle or clones of it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use types::errors::SubmitError;
use types::order::{OrderRecord, OrderType, Side};

use crate::clock;
use crate::queue::OrderRing;
use crate::registry::SymbolRegistry;

/// Submitter-facing entry point to the order ring.
#[derive(Clone)]
pub struct Admission {
    ring: Arc<OrderRing>,
    registry: Arc<SymbolRegistry>,
    running: Arc<AtomicBool>,
    next_order_id: Arc<AtomicU64>,
    producer: Arc<Mutex<()>>,
}

impl Admission {
    pub(crate) fn new(
        ring: Arc<OrderRing>,
        registry: Arc<SymbolRegistry>,
        running: Arc<AtomicBool>,
        next_order_id: Arc<AtomicU64>,
        producer: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            ring,
            registry,
            running,
            next_order_id,
            producer,
        }
    }

    /// Validate and enqueue an order, returning its assigned id.
    pub fn submit(
        &self,
        symbol: &str,
        side: Side,
        order_type: OrderType,
        price: u64,
        quantity: u64,
    ) -> Result<u64, SubmitError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(SubmitError::NotRunning);
        }
        if quantity == 0 {
            return Err(SubmitError::InvalidQuantity { quantity });
        }
        if order_type.is_priced() && price == 0 {
            return Err(SubmitError::InvalidPrice {
                price,
                order_type: format!("{order_type:?}"),
            });
        }
        let Some(info) = self.registry.info(symbol) else {
            return Err(SubmitError::UnknownSymbol {
                symbol: symbol.to_string(),
            });
        };

        let order = OrderRecord {
            order_id: self.next_order_id.fetch_add(1, Ordering::Relaxed),
            symbol_fp: info.fingerprint,
            side,
            order_type,
            price,
            quantity,
            timestamp: clock::monotonic_nanos(),
        };

        let _guard = match self.producer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.ring.offer(&order) {
            Ok(order.order_id)
        } else {
            Err(SubmitError::RingFull)
        }
    }

    pub fn submit_limit(
        &self,
        symbol: &str,
        side: Side,
        price: u64,
        quantity: u64,
    ) -> Result<u64, SubmitError> {
        self.submit(symbol, side, OrderType::Limit, price, quantity)
    }

    pub fn submit_market(&self, symbol: &str, side: Side, quantity: u64) -> Result<u64, SubmitError> {
        self.submit(symbol, side, OrderType::Market, 0, quantity)
    }

    pub fn submit_market_with_price(
        &self,
        symbol: &str,
        side: Side,
        price_cap: u64,
        quantity: u64,
    ) -> Result<u64, SubmitError> {
        self.submit(symbol, side, OrderType::MarketWithPrice, price_cap, quantity)
    }
}
