//! Types library for the matching engine
//!
//! Record shapes shared by the matching core and the adapters around it.
//! Every price and amount is an exact decimal; nothing here uses binary
//! floating point.
//!
//! # Modules
//! - `ids`: Identifiers (OrderId, Pair)
//! - `numeric`: Exact decimal types (Price, Quantity)
//! - `order`: Order, Side, OrderType
//! - `trade`: Trade records produced by matching
//! - `clock`: Monotonic arrival timestamps for the submission boundary
//! - `errors`: Validation error taxonomy

pub mod clock;
pub mod errors;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;
