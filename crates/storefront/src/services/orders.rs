//! Checkout orders.
//!
//! Orders are not persisted: a placed order is handed to an [`OrderSink`]
//! (fire-and-forget) and the cart is cleared. The default sink writes a
//! structured log line.

use chrono::{DateTime, Utc};
use hello_shop_core::{CartLine, Email, Price, UserId};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Shipping form as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, alias = "postalCode")]
    pub postal_code: String,
}

/// Validated shipping details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingDetails {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl ShippingForm {
    /// Validate the form: every field is required and the email must parse.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message naming the first problem found.
    pub fn validate(self) -> Result<ShippingDetails, String> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(format!("{field} is required"));
        }

        let email = Email::parse(self.email.trim()).map_err(|e| format!("Invalid email: {e}"))?;

        Ok(ShippingDetails {
            name: self.name.trim().to_string(),
            email,
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
        })
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub placed_at: DateTime<Utc>,
    pub customer_id: UserId,
    pub shipping: ShippingDetails,
    pub lines: Vec<CartLine>,
    pub total_items: u64,
    pub total_price: Price,
}

impl Order {
    /// Build an order from the cart contents at checkout time.
    #[must_use]
    pub fn new(customer_id: UserId, shipping: ShippingDetails, lines: Vec<CartLine>) -> Self {
        let total_items = lines.iter().map(|line| u64::from(line.quantity)).sum();
        let total_price = lines.iter().map(CartLine::line_total).sum();
        Self {
            id: Uuid::new_v4(),
            placed_at: Utc::now(),
            customer_id,
            shipping,
            lines,
            total_items,
            total_price,
        }
    }
}

/// Destination for placed orders.
pub trait OrderSink: Send + Sync {
    /// Accept an order. Must not block and must not fail the checkout.
    fn submit(&self, order: &Order);
}

/// Sink that records orders as structured log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOrderSink;

impl OrderSink for LogOrderSink {
    fn submit(&self, order: &Order) {
        info!(
            order_id = %order.id,
            customer_id = %order.customer_id,
            total_items = order.total_items,
            total_price = %order.total_price,
            city = %order.shipping.city,
            "order placed"
        );
    }
}
