//! Resting-order side store
//!
//! An observer index the engine keeps in sync as resting orders change.
//! It never participates in matching decisions, and the engine must not
//! block on it; the in-memory implementation only takes a map shard
//! lock. A persistent store is a deployment choice behind the same
//! trait.

use dashmap::DashMap;
use types::order::OrderRecord;

/// Side index of unfilled orders, keyed by order id.
pub trait RestingOrderStore: Send + Sync {
    /// Register an unfilled order. Ignored when the id is zero;
    /// last-write-wins on a duplicate id.
    fn add(&self, order: OrderRecord);

    /// Update the remaining quantity of an order. A zero quantity is
    /// equivalent to `remove`.
    fn update_quantity(&self, order_id: u64, new_quantity: u64);

    /// Remove an order, returning the stored record if present.
    fn remove(&self, order_id: u64) -> Option<OrderRecord>;

    /// Look up an order by id.
    fn get(&self, order_id: u64) -> Option<OrderRecord>;

    /// Number of stored orders.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// DashMap-backed store; the default when no persistent backend is wired.
#[derive(Debug, Default)]
pub struct InMemoryRestingStore {
    orders: DashMap<u64, OrderRecord>,
}

impl InMemoryRestingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RestingOrderStore for InMemoryRestingStore {
    fn add(&self, order: OrderRecord) {
        if order.order_id == 0 {
            return;
        }
        self.orders.insert(order.order_id, order);
    }

    fn update_quantity(&self, order_id: u64, new_quantity: u64) {
        if new_quantity == 0 {
            self.orders.remove(&order_id);
            return;
        }
        if let Some(mut entry) = self.orders.get_mut(&order_id) {
            entry.quantity = new_quantity;
        }
    }

    fn remove(&self, order_id: u64) -> Option<OrderRecord> {
        self.orders.remove(&order_id).map(|(_, order)| order)
    }

    fn get(&self, order_id: u64) -> Option<OrderRecord> {
        self.orders.get(&order_id).map(|entry| *entry)
    }

    fn len(&self) -> usize {
        self.orders.len()
    }
}
