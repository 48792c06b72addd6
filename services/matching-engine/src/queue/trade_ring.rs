//! Trade output ring
//!
//! Single-producer circular buffer of trade slots; only the engine
//! thread writes. Trade ids are assigned monotonically from the region
//! header at offer time. A full ring is a fatal drop condition the
//! engine surfaces through its statistics.

use std::sync::Arc;

use types::trade::TradeRecord;

use crate::clock;
use crate::shm::layout;
use crate::shm::MappedRegion;

/// Engine-owned trade queue over the mapped region.
pub struct TradeRing {
    region: Arc<MappedRegion>,
}

impl TradeRing {
    pub fn new(region: Arc<MappedRegion>) -> Self {
        Self { region }
    }

    /// Assign a trade id, stamp the fill time, and publish the trade.
    ///
    /// Returns the assigned id, or `None` without advancing (and
    /// without consuming an id) when the ring is full.
    pub fn offer_trade(
        &self,
        buy_order_id: u64,
        sell_order_id: u64,
        price: u64,
        quantity: u64,
        symbol_fp: u32,
    ) -> Option<u64> {
        let tail = self.region.trade_ring_tail();
        let next = (tail + 1) % layout::TRADE_RING_CAPACITY;
        if next == self.region.trade_ring_head() {
            return None;
        }

        let trade_id = self.region.assign_trade_id();
        let trade = TradeRecord {
            trade_id,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            timestamp: clock::monotonic_nanos(),
            symbol_fp,
        };

        self.region
            .write_bytes(layout::trade_slot_offset(tail), &trade.to_bytes());
        self.region.set_trade_ring_tail(next);
        Some(trade_id)
    }

    /// Consume the next trade.
    pub fn poll(&self) -> Option<TradeRecord> {
        let head = self.region.trade_ring_head();
        if head == self.region.trade_ring_tail() {
            return None;
        }

        let trade = self.read_slot(head);
        self.region
            .set_trade_ring_head((head + 1) % layout::TRADE_RING_CAPACITY);
        Some(trade)
    }

    /// Read a slot without consuming it. The slot must have been
    /// published; reading past the tail returns stale bytes.
    pub fn trade_at(&self, index: u64) -> Option<TradeRecord> {
        if index >= layout::TRADE_RING_CAPACITY {
            return None;
        }
        Some(self.read_slot(index))
    }

    fn read_slot(&self, index: u64) -> TradeRecord {
        let mut buf = [0u8; TradeRecord::ENCODED_SIZE];
        self.region.read_bytes(layout::trade_slot_offset(index), &mut buf);
        TradeRecord::from_bytes(&buf)
    }

    pub fn is_empty(&self) -> bool {
        self.region.trade_ring_head() == self.region.trade_ring_tail()
    }

    pub fn is_full(&self) -> bool {
        (self.region.trade_ring_tail() + 1) % layout::TRADE_RING_CAPACITY
            == self.region.trade_ring_head()
    }

    /// Number of committed, unconsumed slots.
    pub fn size(&self) -> u64 {
        let head = self.region.trade_ring_head();
        let tail = self.region.trade_ring_tail();
        if tail >= head {
            tail - head
        } else {
            layout::TRADE_RING_CAPACITY - head + tail
        }
    }

    pub fn capacity(&self) -> u64 {
        layout::TRADE_RING_CAPACITY - 1
    }

    pub(crate) fn region(&self) -> &Arc<MappedRegion> {
        &self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use types::symbol::symbol_fingerprint;

    fn ring() -> (TempDir, TradeRing) {
        let tmp = TempDir::new().unwrap();
        let region = MappedRegion::open(tmp.path().join("exchange.bin")).unwrap();
        (tmp, TradeRing::new(Arc::new(region)))
    }

    #[test]
    fn test_offer_assigns_monotonic_ids() {
        let (_tmp, ring) = ring();
        let fp = symbol_fingerprint("BTC-USD");

        assert_eq!(ring.offer_trade(3, 1, 5_000, 1, fp), Some(1));
        assert_eq!(ring.offer_trade(4, 1, 5_000, 9, fp), Some(2));
        assert_eq!(ring.size(), 2);
    }

    #[test]
    fn test_poll_returns_published_trade() {
        let (_tmp, ring) = ring();
        let fp = symbol_fingerprint("ETH-USD");

        ring.offer_trade(10, 20, 3_000, 5, fp).unwrap();
        let trade = ring.poll().unwrap();

        assert_eq!(trade.trade_id, 1);
        assert_eq!(trade.buy_order_id, 10);
        assert_eq!(trade.sell_order_id, 20);
        assert_eq!(trade.price, 3_000);
        assert_eq!(trade.quantity, 5);
        assert_eq!(trade.symbol_fp, fp);
        assert!(trade.timestamp > 0);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_full_ring_returns_none_without_consuming_id() {
        let (_tmp, ring) = ring();

        // Park head two slots ahead of tail so one offer fills the ring.
        ring.region().set_trade_ring_head(3);
        ring.region().set_trade_ring_tail(1);

        assert_eq!(ring.offer_trade(1, 2, 100, 1, 7), Some(1));
        assert!(ring.is_full());
        assert_eq!(ring.offer_trade(3, 4, 100, 1, 7), None);
        // The failed offer must not burn a trade id.
        assert_eq!(ring.region().next_trade_id(), 2);
    }

    #[test]
    fn test_trade_at_reads_slot() {
        let (_tmp, ring) = ring();
        ring.offer_trade(1, 2, 100, 3, 9).unwrap();

        let trade = ring.trade_at(0).unwrap();
        assert_eq!(trade.trade_id, 1);
        assert!(ring.trade_at(layout::TRADE_RING_CAPACITY).is_none());
    }
}
