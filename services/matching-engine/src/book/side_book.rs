//! One side of the order book
//!
//! Resting orders for a single side, sorted by price and then by time
//! priority. Uses BTreeMap so iteration order is deterministic.
//!
//! Asks iterate ascending (lowest price first), bids descending (highest
//! price first). Within a price the earliest arrival comes first.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use types::numeric::{Price, Quantity};
use types::order::Side;

use super::price_level::{PriceLevel, RestingOrder, TimePriority};

/// Price-time priority structure for one side of the book
#[derive(Debug, Clone)]
pub struct SideBook {
    side: Side,
    /// Price levels keyed ascending; bids are read from the back
    levels: BTreeMap<Price, PriceLevel>,
    order_count: usize,
}

impl SideBook {
    /// Create an empty side. `Side::Buy` gives a bid book, `Side::Sell` an ask book.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            order_count: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Insert a resting order
    ///
    /// The caller guarantees the order is not already present.
    pub fn insert(&mut self, order: RestingOrder) {
        debug_assert_eq!(order.side, self.side, "order inserted on the wrong side");
        self.levels.entry(order.price).or_default().insert(order);
        self.order_count += 1;
    }

    /// Remove an order by its price and time priority
    ///
    /// Returns `None` if the order is not present. Empty levels are dropped.
    pub fn remove(&mut self, price: Price, priority: &TimePriority) -> Option<RestingOrder> {
        let level = self.levels.get_mut(&price)?;
        let order = level.remove(priority)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        self.order_count -= 1;
        Some(order)
    }

    /// Look up an order by its price and time priority
    pub fn get(&self, price: Price, priority: &TimePriority) -> Option<&RestingOrder> {
        self.levels.get(&price)?.get(priority)
    }

    /// Visit resting orders best-first, letting the visitor fill them
    ///
    /// The visitor may reduce an order's remaining amount and returns
    /// `ControlFlow::Break` to stop. Orders reduced to zero are removed before
    /// this returns and handed back so the caller can unlink them elsewhere.
    pub fn match_against<F>(&mut self, mut visit: F) -> Vec<RestingOrder>
    where
        F: FnMut(&mut RestingOrder) -> ControlFlow<()>,
    {
        let mut filled = Vec::new();

        loop {
            let entry = match self.side {
                Side::Buy => self.levels.last_entry(),
                Side::Sell => self.levels.first_entry(),
            };
            let Some(mut entry) = entry else {
                break;
            };

            let flow = entry.get_mut().match_front(&mut visit, &mut filled);
            if entry.get().is_empty() {
                entry.remove();
            }
            if flow.is_break() {
                break;
            }
        }

        self.order_count -= filled.len();
        filled
    }

    /// Iterate resting orders in priority order (best first)
    pub fn iter(&self) -> Box<dyn Iterator<Item = &RestingOrder> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev().flat_map(PriceLevel::iter)),
            Side::Sell => Box::new(self.levels.values().flat_map(PriceLevel::iter)),
        }
    }

    /// Iterate price levels best first
    pub fn levels(&self) -> Box<dyn Iterator<Item = (&Price, &PriceLevel)> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.iter().rev()),
            Side::Sell => Box::new(self.levels.iter()),
        }
    }

    /// Best price and the total quantity resting there
    pub fn best(&self) -> Option<(Price, Quantity)> {
        self.levels()
            .next()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Best price on this side
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Get depth snapshot (top N price levels, best first)
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of resting orders on this side
    pub fn order_count(&self) -> usize {
        self.order_count
    }

    /// Get the total number of price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use types::ids::OrderId;

    fn resting(side: Side, id: &str, price: u64, qty: &str, timestamp: i64) -> RestingOrder {
        RestingOrder {
            id: OrderId::new(id),
            side,
            price: Price::from_u64(price),
            remaining: Quantity::from_str(qty).unwrap(),
            priority: TimePriority {
                timestamp,
                sequence: timestamp as u64,
            },
        }
    }

    fn ids(book: &SideBook) -> Vec<String> {
        book.iter().map(|o| o.id.to_string()).collect()
    }

    #[test]
    fn test_ask_book_priority_order() {
        let mut book = SideBook::new(Side::Sell);
        book.insert(resting(Side::Sell, "a", 50000, "1.0", 1));
        book.insert(resting(Side::Sell, "b", 51000, "2.0", 2));
        book.insert(resting(Side::Sell, "c", 49000, "1.5", 3));
        book.insert(resting(Side::Sell, "d", 49000, "0.5", 4));

        assert_eq!(ids(&book), vec!["c", "d", "a", "b"]);
        let (best_price, best_qty) = book.best().unwrap();
        assert_eq!(best_price, Price::from_u64(49000));
        assert_eq!(best_qty, Quantity::from_str("2.0").unwrap());
        assert_eq!(book.order_count(), 4);
        assert_eq!(book.level_count(), 3);
    }

    #[test]
    fn test_bid_book_priority_order() {
        let mut book = SideBook::new(Side::Buy);
        book.insert(resting(Side::Buy, "a", 50000, "1.0", 1));
        book.insert(resting(Side::Buy, "b", 51000, "2.0", 2));
        book.insert(resting(Side::Buy, "c", 49000, "1.5", 3));
        book.insert(resting(Side::Buy, "d", 51000, "0.5", 4));

        assert_eq!(ids(&book), vec!["b", "d", "a", "c"]);
        assert_eq!(book.best_price(), Some(Price::from_u64(51000)));
    }

    #[test]
    fn test_remove_drops_empty_level() {
        let mut book = SideBook::new(Side::Sell);
        let order = resting(Side::Sell, "a", 50000, "1.0", 1);
        let priority = order.priority;
        book.insert(order);

        let removed = book.remove(Price::from_u64(50000), &priority).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert!(book.is_empty());
        assert_eq!(book.order_count(), 0);
        assert!(book.remove(Price::from_u64(50000), &priority).is_none());
    }

    #[test]
    fn test_depth_snapshot() {
        let mut book = SideBook::new(Side::Buy);
        book.insert(resting(Side::Buy, "a", 50000, "1.0", 1));
        book.insert(resting(Side::Buy, "b", 51000, "2.0", 2));
        book.insert(resting(Side::Buy, "c", 49000, "1.5", 3));
        book.insert(resting(Side::Buy, "d", 52000, "0.5", 4));

        let depth = book.depth_snapshot(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].0, Price::from_u64(52000));
        assert_eq!(depth[1].0, Price::from_u64(51000));
    }

    #[test]
    fn test_match_against_crosses_levels_and_stops() {
        let mut book = SideBook::new(Side::Sell);
        book.insert(resting(Side::Sell, "a", 99, "1.0", 1));
        book.insert(resting(Side::Sell, "b", 100, "1.0", 2));
        book.insert(resting(Side::Sell, "c", 101, "1.0", 3));

        let limit = Price::from_u64(100);
        let mut visited = Vec::new();
        let filled = book.match_against(|order| {
            if order.price > limit {
                return ControlFlow::Break(());
            }
            visited.push(order.id.to_string());
            let all = order.remaining;
            order.fill(all);
            ControlFlow::Continue(())
        });

        assert_eq!(visited, vec!["a", "b"]);
        assert_eq!(filled.len(), 2);
        assert_eq!(ids(&book), vec!["c"]);
        assert_eq!(book.order_count(), 1);
        assert_eq!(book.level_count(), 1);
    }

    #[test]
    fn test_match_against_empty_book() {
        let mut book = SideBook::new(Side::Buy);
        let filled = book.match_against(|_| ControlFlow::Continue(()));
        assert!(filled.is_empty());
    }
}
