//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::{Order, SessionCart, ShippingForm};
use crate::state::AppState;

/// Place an order for the current cart and clear it.
#[instrument(skip(state, user, session, form), fields(user_id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(form): Json<ShippingForm>,
) -> Result<(StatusCode, Json<Value>)> {
    let shipping = form.validate().map_err(AppError::BadRequest)?;

    let mut cart = SessionCart::load(&session).await?;
    if cart.cart().is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    let order = Order::new(user.id, shipping, cart.cart().lines().to_vec());
    state.orders().submit(&order);

    cart.cart_mut().clear_cart();
    cart.commit().await?;

    add_breadcrumb("checkout", "Order placed", &[("order_id", order.id.to_string())]);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "order_id": order.id,
            "total_items": order.total_items,
            "total_price": order.total_price,
        })),
    ))
}
