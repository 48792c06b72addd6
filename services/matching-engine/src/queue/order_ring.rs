//! Order intake ring
//!
//! Single-producer/single-consumer circular buffer of order slots over
//! the mapped region, with head and tail indices in the region header.
//! Submitters funnel through the admission layer, which serializes
//! producers, so the publication discipline is plain SPSC: the producer
//! finishes the slot payload before the release store of the tail, and
//! the consumer acquire-loads the tail before touching the slot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::warn;
use types::order::OrderRecord;

use crate::shm::layout;
use crate::shm::MappedRegion;

/// Upper bound on invalid slots skipped by a single `poll` call.
const MAX_CONSECUTIVE_DISCARDS: u32 = 100;

/// SPSC order queue over the mapped region.
pub struct OrderRing {
    region: Arc<MappedRegion>,
    discarded: AtomicU64,
}

impl OrderRing {
    pub fn new(region: Arc<MappedRegion>) -> Self {
        Self {
            region,
            discarded: AtomicU64::new(0),
        }
    }

    /// Serialize `order` into the tail slot and publish it.
    ///
    /// Returns false when the ring is full; the slot is left untouched.
    pub fn offer(&self, order: &OrderRecord) -> bool {
        let tail = self.region.order_ring_tail();
        let next = (tail + 1) % layout::ORDER_RING_CAPACITY;
        if next == self.region.order_ring_head() {
            return false;
        }

        self.region
            .write_bytes(layout::order_slot_offset(tail), &order.to_bytes());
        self.region.set_order_ring_tail(next);
        true
    }

    /// Consume the next order, skipping invalid slots.
    ///
    /// A slot failing the validity predicate is discarded with a
    /// warning and the head advances past it; at most
    /// `MAX_CONSECUTIVE_DISCARDS` slots are skipped per call so a
    /// corrupted ring cannot stall the engine in a single poll.
    pub fn poll(&self) -> Option<OrderRecord> {
        let mut skipped = 0u32;
        loop {
            let head = self.region.order_ring_head();
            if head == self.region.order_ring_tail() {
                return None;
            }

            let mut buf = [0u8; OrderRecord::ENCODED_SIZE];
            self.region.read_bytes(layout::order_slot_offset(head), &mut buf);
            let order = OrderRecord::from_bytes(&buf);

            self.region
                .set_order_ring_head((head + 1) % layout::ORDER_RING_CAPACITY);

            if order.is_valid() {
                return Some(order);
            }

            self.discarded.fetch_add(1, Ordering::Relaxed);
            warn!(slot = head, order_id = order.order_id, "discarding invalid order slot");
            skipped += 1;
            if skipped >= MAX_CONSECUTIVE_DISCARDS {
                return None;
            }
        }
    }

    /// Peek at the next order without consuming it.
    pub fn peek(&self) -> Option<OrderRecord> {
        let head = self.region.order_ring_head();
        if head == self.region.order_ring_tail() {
            return None;
        }
        let mut buf = [0u8; OrderRecord::ENCODED_SIZE];
        self.region.read_bytes(layout::order_slot_offset(head), &mut buf);
        Some(OrderRecord::from_bytes(&buf))
    }

    pub fn is_empty(&self) -> bool {
        self.region.order_ring_head() == self.region.order_ring_tail()
    }

    pub fn is_full(&self) -> bool {
        (self.region.order_ring_tail() + 1) % layout::ORDER_RING_CAPACITY
            == self.region.order_ring_head()
    }

    /// Number of committed, unconsumed slots.
    pub fn size(&self) -> u64 {
        let head = self.region.order_ring_head();
        let tail = self.region.order_ring_tail();
        if tail >= head {
            tail - head
        } else {
            layout::ORDER_RING_CAPACITY - head + tail
        }
    }

    /// One slot is sacrificed to distinguish full from empty.
    pub fn capacity(&self) -> u64 {
        layout::ORDER_RING_CAPACITY - 1
    }

    /// Total invalid slots discarded by this consumer.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    pub(crate) fn region(&self) -> &Arc<MappedRegion> {
        &self.region
    }
}
