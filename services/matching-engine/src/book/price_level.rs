//! Price level implementation with FIFO queue
//!
//! A price level holds every resting order at one price. Orders are keyed
//! by their time priority, so the front of the level is always the earliest
//! arrival and any order can be unlinked in O(log n).

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use crate::order_book::InvariantViolation;

/// Tie-break key among orders at one price
///
/// Ordered by arrival timestamp, then by the book's arrival sequence so that
/// two orders stamped with the same nanosecond still have a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimePriority {
    pub timestamp: i64,
    pub sequence: u64,
}

/// An order resting in the book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    pub remaining: Quantity,
    pub priority: TimePriority,
}

impl RestingOrder {
    pub(crate) fn from_order(order: &Order, sequence: u64) -> Self {
        Self {
            id: order.id.clone(),
            side: order.side,
            price: order.price,
            remaining: order.amount,
            priority: TimePriority {
                timestamp: order.timestamp,
                sequence,
            },
        }
    }

    /// Arrival timestamp of the order
    pub fn timestamp(&self) -> i64 {
        self.priority.timestamp
    }

    /// Reduce the remaining amount by a fill
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining amount
    pub(crate) fn fill(&mut self, amount: Quantity) {
        self.remaining = match self.remaining.checked_sub(amount) {
            Some(rest) => rest,
            None => panic!(
                "fill of {} exceeds remaining {} on order {}",
                amount, self.remaining, self.id
            ),
        };
    }
}

/// A price level containing orders at a specific price
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Orders in time priority (earliest first)
    orders: BTreeMap<TimePriority, RestingOrder>,
    /// Total quantity available at this level
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: BTreeMap::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Insert an order; its priority must not already be present
    ///
    /// # Panics
    /// Panics with `InvariantViolation::LevelOverflow` if the level total
    /// would overflow. The level is left untouched in that case.
    pub fn insert(&mut self, order: RestingOrder) {
        assert!(
            !self.orders.contains_key(&order.priority),
            "time priority inserted twice at one level"
        );
        let Some(total) = self.total_quantity.checked_add(order.remaining) else {
            panic!("{}", InvariantViolation::LevelOverflow { price: order.price });
        };
        self.total_quantity = total;
        self.orders.insert(order.priority, order);
    }

    /// Remove an order by its time priority
    pub fn remove(&mut self, priority: &TimePriority) -> Option<RestingOrder> {
        let order = self.orders.remove(priority)?;
        self.subtract_total(order.remaining);
        Some(order)
    }

    /// Peek at the front order without removing it
    pub fn front(&self) -> Option<&RestingOrder> {
        self.orders.values().next()
    }

    /// Look up an order by its time priority
    pub fn get(&self, priority: &TimePriority) -> Option<&RestingOrder> {
        self.orders.get(priority)
    }

    /// Feed orders to `visit` from the front of the queue
    ///
    /// Orders the visitor drives to zero are unlinked and pushed to `filled`.
    /// Iteration cannot advance past an order that still has quantity, so it
    /// stops there even if the visitor asked to continue.
    pub(crate) fn match_front<F>(
        &mut self,
        visit: &mut F,
        filled: &mut Vec<RestingOrder>,
    ) -> ControlFlow<()>
    where
        F: FnMut(&mut RestingOrder) -> ControlFlow<()>,
    {
        loop {
            let (traded, exhausted, flow) = {
                let Some(mut entry) = self.orders.first_entry() else {
                    break;
                };
                let before = entry.get().remaining;
                let flow = visit(entry.get_mut());
                let after = entry.get().remaining;
                assert!(after <= before, "visitor increased a resting amount");

                let exhausted = after.is_zero();
                if exhausted {
                    filled.push(entry.remove());
                }
                (before.checked_sub(after), exhausted, flow)
            };

            if let Some(traded) = traded {
                self.subtract_total(traded);
            }
            if !exhausted {
                return ControlFlow::Break(());
            }
            if flow.is_break() {
                return flow;
            }
        }
        ControlFlow::Continue(())
    }

    /// Iterate orders in time priority
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &RestingOrder> {
        self.orders.values()
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the total quantity at this price level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Get the number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn subtract_total(&mut self, amount: Quantity) {
        self.total_quantity = match self.total_quantity.checked_sub(amount) {
            Some(total) => total,
            None => panic!(
                "level total {} would go negative removing {}",
                self.total_quantity, amount
            ),
        };
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}
