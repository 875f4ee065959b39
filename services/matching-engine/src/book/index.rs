//! Order index
//!
//! Maps each resting order id to the coordinates of its record in a side
//! book. The side book owns the record; the index owns only what is needed
//! to find it again in O(log n).

use std::collections::HashMap;

use types::ids::OrderId;
use types::numeric::Price;
use types::order::Side;

use super::price_level::{RestingOrder, TimePriority};

/// Where a resting order lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub side: Side,
    pub price: Price,
    pub priority: TimePriority,
}

impl Locator {
    pub fn of(order: &RestingOrder) -> Self {
        Self {
            side: order.side,
            price: order.price,
            priority: order.priority,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderIndex {
    entries: HashMap<OrderId, Locator>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly resting order
    ///
    /// # Panics
    /// Panics if the id is already indexed; the book would otherwise hold
    /// two records for one identifier.
    pub fn insert(&mut self, order: &RestingOrder) {
        let previous = self.entries.insert(order.id.clone(), Locator::of(order));
        assert!(previous.is_none(), "order {} indexed twice", order.id);
    }

    /// Forget a resting order, returning where it lived
    pub fn remove(&mut self, id: &OrderId) -> Option<Locator> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &OrderId) -> Option<&Locator> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &OrderId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
