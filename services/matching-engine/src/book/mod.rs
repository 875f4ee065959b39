//! Order book infrastructure module
//!
//! Contains price levels, the per-side priority structure and the order index.

pub mod index;
pub mod price_level;
pub mod side_book;

pub use index::{Locator, OrderIndex};
pub use price_level::{PriceLevel, RestingOrder, TimePriority};
pub use side_book::SideBook;
