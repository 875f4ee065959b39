//! Order book for one instrument
//!
//! Composes the two side books and the order index, and runs the
//! price-time priority walk for each incoming order.
//!
//! The book does no locking. Every mutating call must come from a single
//! ordered stream of calls per instrument (see `sequencer`).

use std::ops::ControlFlow;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};
use types::ids::{OrderId, Pair};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side};
use types::trade::Trade;

use crate::book::{Locator, OrderIndex, RestingOrder, SideBook};
use crate::matching::{crossing, MatchExecutor};

/// Result of submitting an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    /// No match; the whole order now rests
    Resting { remaining: Quantity },
    /// Some fills; the remainder now rests
    PartiallyFilled { trades: Vec<Trade>, remaining: Quantity },
    /// Completely filled; nothing rests
    Filled { trades: Vec<Trade> },
    /// Market order ran out of liquidity; the remainder is dropped
    Unfilled { trades: Vec<Trade>, unfilled: Quantity },
}

impl SubmitResult {
    pub fn trades(&self) -> &[Trade] {
        match self {
            SubmitResult::Resting { .. } => &[],
            SubmitResult::PartiallyFilled { trades, .. }
            | SubmitResult::Filled { trades }
            | SubmitResult::Unfilled { trades, .. } => trades,
        }
    }

    pub fn into_trades(self) -> Vec<Trade> {
        match self {
            SubmitResult::Resting { .. } => Vec::new(),
            SubmitResult::PartiallyFilled { trades, .. }
            | SubmitResult::Filled { trades }
            | SubmitResult::Unfilled { trades, .. } => trades,
        }
    }

    /// Amount of the incoming order left after matching
    pub fn remaining(&self) -> Quantity {
        match self {
            SubmitResult::Resting { remaining } | SubmitResult::PartiallyFilled { remaining, .. } => {
                *remaining
            }
            SubmitResult::Filled { .. } => Quantity::zero(),
            SubmitResult::Unfilled { unfilled, .. } => *unfilled,
        }
    }

    /// Whether the incoming order came to rest in the book
    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            SubmitResult::Resting { .. } | SubmitResult::PartiallyFilled { .. }
        )
    }
}

/// Order book snapshot for market data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSnapshot {
    pub pair: Pair,
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
    pub resting_orders: usize,
}

/// A broken structural invariant, found by `OrderBook::check_invariants`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("order {0} rests in a side book but is not indexed")]
    NotIndexed(OrderId),

    #[error("order {0} is indexed at a different location than it rests")]
    Misplaced(OrderId),

    #[error("index holds {index} orders but side books hold {sides}")]
    CountMismatch { index: usize, sides: usize },

    #[error("order {0} rests with a zero amount")]
    ZeroRemaining(OrderId),

    #[error("level {price} records total {recorded} but holds {actual}")]
    LevelTotal {
        price: Price,
        recorded: Quantity,
        actual: Quantity,
    },

    #[error("level {price} total overflowed")]
    LevelOverflow { price: Price },

    #[error("book is crossed: best bid {bid} >= best ask {ask}")]
    Crossed { bid: Price, ask: Price },
}

/// Order book for a single instrument
#[derive(Debug, Clone)]
pub struct OrderBook {
    pair: Pair,
    bids: SideBook,
    asks: SideBook,
    index: OrderIndex,
    /// Trade numbering
    executor: MatchExecutor,
    /// Tie-break for equal arrival timestamps
    arrival_sequence: u64,
}

impl OrderBook {
    pub fn new(pair: Pair) -> Self {
        Self {
            pair,
            bids: SideBook::new(Side::Buy),
            asks: SideBook::new(Side::Sell),
            index: OrderIndex::new(),
            executor: MatchExecutor::default(),
            arrival_sequence: 0,
        }
    }

    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    /// Match a limit order and return the trades it produced
    ///
    /// The order must already be validated: `price > 0`, `amount > 0`, an id
    /// not resting in this book, and this book's pair. Trades come back in
    /// the order they were executed. Any remainder rests in the book.
    pub fn process_limit_order(&mut self, order: Order) -> Vec<Trade> {
        let order = Order {
            order_type: OrderType::Limit,
            ..order
        };
        self.process_order(order).into_trades()
    }

    /// Match a market order against the opposite side regardless of price
    ///
    /// Whatever is left once the opposite side runs dry is dropped.
    pub fn process_market_order(&mut self, order: Order) -> SubmitResult {
        let order = Order {
            order_type: OrderType::Market,
            ..order
        };
        self.process_order(order)
    }

    /// Submit an order to the book, dispatching on its type
    ///
    /// # Panics
    /// Panics if the order belongs to another pair or its id already rests
    /// here. Both mean the sequencing layer is broken.
    pub fn process_order(&mut self, mut order: Order) -> SubmitResult {
        assert_eq!(
            order.pair, self.pair,
            "order {} routed to the {} book",
            order.id, self.pair
        );
        assert!(
            !self.index.contains(&order.id),
            "order {} is already resting in the {} book",
            order.id,
            self.pair
        );
        debug_assert!(!order.amount.is_zero(), "zero-amount order reached the book");

        trace!(
            order_id = %order.id,
            side = %order.side,
            price = %order.price,
            amount = %order.amount,
            "processing order"
        );

        let trades = self.match_incoming(&mut order);

        if order.is_filled() {
            return SubmitResult::Filled { trades };
        }

        match order.order_type {
            OrderType::Market => SubmitResult::Unfilled {
                trades,
                unfilled: order.amount,
            },
            OrderType::Limit => {
                let remaining = order.amount;
                self.rest(&order);
                if trades.is_empty() {
                    SubmitResult::Resting { remaining }
                } else {
                    SubmitResult::PartiallyFilled { trades, remaining }
                }
            }
        }
    }

    /// Walk the opposite side best-first, filling the incoming order
    fn match_incoming(&mut self, taker: &mut Order) -> Vec<Trade> {
        let mut trades = Vec::new();

        let opposite = match taker.side {
            Side::Buy => &mut self.asks,
            Side::Sell => &mut self.bids,
        };
        let executor = &mut self.executor;
        let pair = &self.pair;

        let filled = opposite.match_against(|maker| {
            if crossing::price_stops(taker.order_type, taker.side, taker.price, maker.price) {
                return ControlFlow::Break(());
            }

            let amount = taker.amount.min(maker.remaining);
            trades.push(executor.execute_trade(
                pair,
                &maker.id,
                &taker.id,
                maker.price,
                amount,
                taker.timestamp,
            ));
            maker.fill(amount);
            taker.fill(amount);

            if taker.is_filled() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        for maker in filled {
            if self.index.remove(&maker.id).is_none() {
                panic!("filled order {} was not indexed", maker.id);
            }
            debug!(order_id = %maker.id, price = %maker.price, "resting order filled");
        }

        trades
    }

    fn rest(&mut self, order: &Order) {
        self.arrival_sequence += 1;
        let resting = RestingOrder::from_order(order, self.arrival_sequence);
        debug!(
            order_id = %resting.id,
            side = %resting.side,
            price = %resting.price,
            remaining = %resting.remaining,
            "order resting"
        );
        // A refused insert must leave the index untouched
        self.side_mut(order.side).insert(resting.clone());
        self.index.insert(&resting);
    }

    /// Remove a resting order by id
    ///
    /// Returns `None` if the id is not resting (never seen, already filled
    /// or already canceled).
    pub fn cancel_order(&mut self, id: &OrderId) -> Option<RestingOrder> {
        let locator = self.index.remove(id)?;
        let removed = self
            .side_mut(locator.side)
            .remove(locator.price, &locator.priority);
        match removed {
            Some(order) => {
                debug!(order_id = %id, remaining = %order.remaining, "order canceled");
                Some(order)
            }
            None => panic!(
                "order {} indexed but missing from the {} side",
                id, locator.side
            ),
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    fn side(&self, side: Side) -> &SideBook {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Look up a resting order by id
    pub fn order(&self, id: &OrderId) -> Option<&RestingOrder> {
        let locator = self.index.get(id)?;
        self.side(locator.side).get(locator.price, &locator.priority)
    }

    pub fn contains(&self, id: &OrderId) -> bool {
        self.index.contains(id)
    }

    /// Number of resting orders
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn bids(&self) -> &SideBook {
        &self.bids
    }

    pub fn asks(&self) -> &SideBook {
        &self.asks
    }

    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.best()
    }

    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.best()
    }

    /// Best ask minus best bid, if both sides are populated
    pub fn spread(&self) -> Option<Decimal> {
        let bid = self.bids.best_price()?;
        let ask = self.asks.best_price()?;
        Some(ask.as_decimal() - bid.as_decimal())
    }

    /// Sequence number the next trade will carry
    pub fn next_trade_sequence(&self) -> u64 {
        self.executor.peek_sequence()
    }

    /// Aggregated depth for the top `depth` levels of each side
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot {
            pair: self.pair.clone(),
            bids: self.bids.depth_snapshot(depth),
            asks: self.asks.depth_snapshot(depth),
            resting_orders: self.len(),
        }
    }

    /// Verify index/side consistency, level totals and the no-crossing rule
    ///
    /// O(n) in resting orders.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut sides = 0;

        for book in [&self.bids, &self.asks] {
            for (price, level) in book.levels() {
                let actual: Quantity = level.iter().map(|o| o.remaining).sum();
                if actual != level.total_quantity() {
                    return Err(InvariantViolation::LevelTotal {
                        price: *price,
                        recorded: level.total_quantity(),
                        actual,
                    });
                }

                for order in level.iter() {
                    if order.remaining.is_zero() {
                        return Err(InvariantViolation::ZeroRemaining(order.id.clone()));
                    }
                    match self.index.get(&order.id) {
                        None => return Err(InvariantViolation::NotIndexed(order.id.clone())),
                        Some(locator) if *locator != Locator::of(order) || order.price != *price => {
                            return Err(InvariantViolation::Misplaced(order.id.clone()));
                        }
                        Some(_) => {}
                    }
                    sides += 1;
                }
            }
        }

        if sides != self.index.len() {
            return Err(InvariantViolation::CountMismatch {
                index: self.index.len(),
                sides,
            });
        }

        if let (Some(bid), Some(ask)) = (self.bids.best_price(), self.asks.best_price()) {
            if bid >= ask {
                return Err(InvariantViolation::Crossed { bid, ask });
            }
        }

        Ok(())
    }
}
