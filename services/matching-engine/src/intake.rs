//! Submission boundary
//!
//! Turns raw client requests into validated, identified and timestamped
//! orders. Nothing that fails here ever reaches an order book.

use rust_decimal::Decimal;
use tracing::warn;
use types::clock::ArrivalClock;
use types::errors::ValidationError;
use types::ids::{OrderId, Pair};
use types::numeric::{Price, Quantity};
use types::order::Order;

use crate::events::OrderRequest;

/// Validates requests for a single instrument
#[derive(Debug, Clone)]
pub struct Intake {
    pair: Pair,
    clock: ArrivalClock,
}

impl Intake {
    pub fn new(pair: Pair) -> Self {
        Self {
            pair,
            clock: ArrivalClock::new(),
        }
    }

    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    /// Validate a new-order request and stamp it
    ///
    /// A missing id is generated; a client timestamp is discarded in favour
    /// of the arrival clock. A missing type means `LIMIT`.
    ///
    /// Every order needs a positive `price` up to `MAX_PRICE`, `MARKET`
    /// included, although matching never looks at a market order's price.
    /// The amount must be positive and at most `MAX_AMOUNT`.
    pub fn accept(&mut self, request: OrderRequest) -> Result<Order, ValidationError> {
        self.validate(request).inspect_err(|err| {
            warn!(error = %err, "order rejected at intake");
        })
    }

    fn validate(&mut self, request: OrderRequest) -> Result<Order, ValidationError> {
        let pair = self.check_pair(&request.pair)?;
        let side = request.side.ok_or(ValidationError::MissingField("side"))?;

        let price = request.price.ok_or(ValidationError::MissingField("price"))?;
        let price = Price::try_new(price)?;

        let amount = request.amount.ok_or(ValidationError::MissingField("amount"))?;
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(amount.to_string()));
        }
        let amount = Quantity::try_new(amount)?;

        let id = match request.id {
            Some(id) => OrderId::try_new(id)?,
            None => OrderId::generate(),
        };

        let order = Order {
            id,
            pair,
            side,
            order_type: request.order_type.unwrap_or_default(),
            price,
            amount,
            timestamp: self.clock.next(),
        };
        order.check_bounds()?;
        Ok(order)
    }

    /// Extract the id to cancel from a cancel request
    ///
    /// The pair is optional on cancel, but must match when present.
    pub fn cancel_target(&self, request: &OrderRequest) -> Result<OrderId, ValidationError> {
        if !request.pair.is_empty() {
            self.check_pair(&request.pair)?;
        }
        let id = request
            .id
            .clone()
            .ok_or(ValidationError::MissingField("id"))?;
        OrderId::try_new(id)
    }

    fn check_pair(&self, raw: &str) -> Result<Pair, ValidationError> {
        let pair = Pair::try_new(raw)?;
        if pair != self.pair {
            return Err(ValidationError::UnknownPair {
                expected: self.pair.to_string(),
                actual: pair.to_string(),
            });
        }
        Ok(pair)
    }
}
