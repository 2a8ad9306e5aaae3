//! Business logic services for the storefront.
//!
//! - `cart` - the session-backed cart and its JSON view
//! - `orders` - shipping validation and the order sink

pub mod cart;
pub mod orders;

pub use cart::{CartView, SessionCart};
pub use orders::{LogOrderSink, Order, OrderSink, ShippingForm};
