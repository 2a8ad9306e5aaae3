//! Cart route handlers.
//!
//! The cart lives in the session (see [`SessionCart`]). Every handler loads
//! it, applies at most one mutation and commits before responding.

use axum::{Json, extract::State};
use hello_shop_core::ProductId;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::services::{CartView, SessionCart};
use crate::state::AppState;

/// Body for add and remove.
#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
}

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = SessionCart::load(&session).await?.commit().await?;
    Ok(Json(CartView::from(&cart)))
}

/// Total item count for the cart badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<Value>> {
    let cart = SessionCart::load(&session).await?.commit().await?;
    Ok(Json(json!({ "count": cart.total_items() })))
}

/// Add one unit of a product. The product is snapshotted from the catalog.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let product = state.catalog().get_product(request.product_id).await?;

    let mut cart = SessionCart::load(&session).await?;
    cart.cart_mut().add_to_cart(product)?;
    let cart = cart.commit().await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[("product_id", request.product_id.to_string())],
    );
    Ok(Json(CartView::from(&cart)))
}

/// Remove one unit of a product. Unknown products are ignored.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let mut cart = SessionCart::load(&session).await?;
    cart.cart_mut().remove_from_cart(request.product_id);
    let cart = cart.commit().await?;
    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = SessionCart::load(&session).await?;
    cart.cart_mut().clear_cart();
    let cart = cart.commit().await?;
    Ok(Json(CartView::from(&cart)))
}
