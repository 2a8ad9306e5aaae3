//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness check
//!
//! # Products
//! GET    /api/products?search=      - Listing (cached), optional title filter
//! GET    /api/products/{id}         - Product detail
//!
//! # Cart
//! GET    /api/cart                  - Cart lines and totals
//! GET    /api/cart/count            - Total item count
//! POST   /api/cart/add              - Add one unit {product_id}
//! POST   /api/cart/remove           - Remove one unit {product_id}
//! POST   /api/cart/clear            - Empty the cart
//!
//! # Auth
//! POST   /api/auth/login            - Login (rate limited)
//! POST   /api/auth/logout           - Logout
//! GET    /api/auth/me               - Current user
//!
//! # Checkout (requires auth)
//! POST   /api/checkout              - Place order for the cart
//!
//! # Admin (requires admin role)
//! POST   /api/admin/products        - Create product
//! PUT    /api/admin/products/{id}   - Update product
//! DELETE /api/admin/products/{id}   - Delete product
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::config::StorefrontConfig;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the auth routes router.
///
/// `trust_proxy_headers` decides how the login rate limit identifies clients.
pub fn auth_routes(trust_proxy_headers: bool) -> Router<AppState> {
    let login = Router::new()
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter(trust_proxy_headers));

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(login)
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(admin::create))
        .route("/products/{id}", put(admin::update).delete(admin::delete))
}

/// Create all routes for the storefront.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/auth", auth_routes(config.trust_proxy_headers))
        .route("/api/checkout", post(checkout::place_order))
        .nest("/api/admin", admin_routes())
}
