//! Integration test harness for Hello Shop.
//!
//! Every test gets its own storefront wired to its own in-process mock of the
//! upstream catalog API, both bound to ephemeral ports on 127.0.0.1. Nothing
//! outside the test process is contacted.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hello-shop-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let shop = TestStorefront::start().await;
//! let resp = shop.client.get(shop.url("/health")).send().await?;
//! assert_eq!(resp.status(), 200);
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use hello_shop_core::{Category, CategoryId, LISTING_TTL, Price, Product, ProductId};
use hello_shop_storefront::{
    app,
    config::{AdminAccount, CatalogConfig, StorefrontConfig},
    services::{Order, OrderSink},
    state::AppState,
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Email of the built-in admin account used by the test storefront.
pub const ADMIN_EMAIL: &str = "owner@shop.test";
/// Password of the built-in admin account used by the test storefront.
pub const ADMIN_PASSWORD: &str = "Xk9#mQ2$vL7@pR4!";

/// Customer the mock catalog accepts at `auth/login`.
pub const CUSTOMER_EMAIL: &str = "jane@shop.test";
pub const CUSTOMER_PASSWORD: &str = "jane-secret-pass";
const CUSTOMER_TOKEN: &str = "token-jane";
const CUSTOMER_ID: i64 = 7;

/// A server task that is aborted when the handle is dropped.
struct ServerHandle {
    base_url: String,
    join: JoinHandle<()>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}

async fn bind_local() -> (TcpListener, String) {
    let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    (listener, format!("http://{addr}"))
}

// =============================================================================
// Mock catalog
// =============================================================================

/// Build a catalog product the way the upstream API would return it.
#[must_use]
pub fn catalog_product(id: i64, title: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        price: Price::from_cents(cents),
        description: format!("{title} description"),
        category: Category {
            id: CategoryId::new(1),
            name: "Clothes".to_string(),
            image: String::new(),
        },
        images: vec![format!("https://cdn.shop.test/{id}.jpg")],
    }
}

/// Products seeded into every mock catalog.
#[must_use]
pub fn seed_products() -> Vec<Product> {
    vec![
        catalog_product(1, "Classic Red Tee", 1250),
        catalog_product(2, "Blue Denim Jacket", 3000),
        catalog_product(3, "Leather Boots", 8999),
    ]
}

struct CatalogState {
    products: Mutex<Vec<Product>>,
    next_id: AtomicI64,
}

impl CatalogState {
    fn products(&self) -> std::sync::MutexGuard<'_, Vec<Product>> {
        self.products.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found() -> Response {
    // Upstream answers unknown ids with a 400, not a 404
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "Could not find any entity of type \"Product\"" })),
    )
        .into_response()
}

async fn list_products(State(state): State<Arc<CatalogState>>) -> Json<Vec<Product>> {
    Json(state.products().clone())
}

async fn get_product(State(state): State<Arc<CatalogState>>, Path(id): Path<i64>) -> Response {
    state
        .products()
        .iter()
        .find(|p| p.id.as_i64() == id)
        .cloned()
        .map_or_else(not_found, |p| Json(p).into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody {
    title: String,
    price: Price,
    description: String,
    category_id: CategoryId,
    images: Vec<String>,
}

async fn create_product(
    State(state): State<Arc<CatalogState>>,
    Json(body): Json<CreateBody>,
) -> (StatusCode, Json<Product>) {
    let product = Product {
        id: ProductId::new(state.next_id.fetch_add(1, Ordering::SeqCst)),
        title: body.title,
        price: body.price,
        description: body.description,
        category: Category {
            id: body.category_id,
            name: "Clothes".to_string(),
            image: String::new(),
        },
        images: body.images,
    };
    state.products().push(product.clone());
    (StatusCode::CREATED, Json(product))
}

#[derive(Deserialize)]
struct UpdateBody {
    title: Option<String>,
    price: Option<Price>,
    description: Option<String>,
}

async fn update_product(
    State(state): State<Arc<CatalogState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBody>,
) -> Response {
    let mut products = state.products();
    let Some(product) = products.iter_mut().find(|p| p.id.as_i64() == id) else {
        return not_found();
    };
    if let Some(title) = body.title {
        product.title = title;
    }
    if let Some(price) = body.price {
        product.price = price;
    }
    if let Some(description) = body.description {
        product.description = description;
    }
    Json(product.clone()).into_response()
}

async fn delete_product(State(state): State<Arc<CatalogState>>, Path(id): Path<i64>) -> Response {
    let mut products = state.products();
    let before = products.len();
    products.retain(|p| p.id.as_i64() != id);
    if products.len() == before {
        return not_found();
    }
    Json(json!(true)).into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    if body.email == CUSTOMER_EMAIL && body.password == CUSTOMER_PASSWORD {
        Json(json!({
            "access_token": CUSTOMER_TOKEN,
            "refresh_token": "refresh-jane",
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Unauthorized", "statusCode": 401 })),
        )
            .into_response()
    }
}

async fn profile(headers: HeaderMap) -> Response {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if bearer != Some(CUSTOMER_TOKEN) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "id": CUSTOMER_ID,
        "email": CUSTOMER_EMAIL,
        "password": "not-for-display",
        "name": "Jane",
        "role": "customer",
        "avatar": "https://cdn.shop.test/jane.png",
    }))
    .into_response()
}

/// An in-process stand-in for the upstream catalog API.
pub struct MockCatalog {
    state: Arc<CatalogState>,
    server: ServerHandle,
}

impl MockCatalog {
    /// Start a mock catalog serving the given products.
    pub async fn start(products: Vec<Product>) -> Self {
        let next_id = products.iter().map(|p| p.id.as_i64()).max().unwrap_or(0) + 1;
        let state = Arc::new(CatalogState {
            products: Mutex::new(products),
            next_id: AtomicI64::new(next_id),
        });

        let router = Router::new()
            .route("/products", get(list_products).post(create_product))
            .route(
                "/products/{id}",
                get(get_product).put(update_product).delete(delete_product),
            )
            .route("/auth/login", post(login))
            .route("/auth/profile", get(profile))
            .with_state(Arc::clone(&state));

        let (listener, base_url) = bind_local().await;
        let join = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            state,
            server: ServerHandle { base_url, join },
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.server.base_url
    }

    /// Products the catalog currently holds.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.state.products().clone()
    }

    /// Drop a product upstream without going through the storefront.
    pub fn remove(&self, id: i64) {
        self.state.products().retain(|p| p.id.as_i64() != id);
    }
}

// =============================================================================
// Storefront
// =============================================================================

/// Order sink that keeps every submitted order for inspection.
#[derive(Default)]
pub struct RecordingOrderSink {
    orders: Mutex<Vec<Order>>,
}

impl OrderSink for RecordingOrderSink {
    fn submit(&self, order: &Order) {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(order.clone());
    }
}

/// Storefront configuration pointing at a mock catalog.
#[must_use]
pub fn test_config(catalog_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        catalog: CatalogConfig {
            api_url: catalog_url.parse().expect("catalog url"),
            page_size: 20,
            listing_ttl: LISTING_TTL,
        },
        admin: AdminAccount {
            email: ADMIN_EMAIL.parse().expect("admin email"),
            password: SecretString::from(ADMIN_PASSWORD),
        },
        trust_proxy_headers: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A running storefront plus its mock catalog and a cookie-keeping client.
pub struct TestStorefront {
    /// Client with a cookie store, so it behaves like one browser.
    pub client: reqwest::Client,
    pub catalog: MockCatalog,
    orders: Arc<RecordingOrderSink>,
    state: AppState,
    server: ServerHandle,
}

impl TestStorefront {
    /// Start a storefront over a catalog seeded with [`seed_products`].
    pub async fn start() -> Self {
        Self::start_with(seed_products()).await
    }

    /// Start a storefront over a catalog holding `products`.
    pub async fn start_with(products: Vec<Product>) -> Self {
        Self::start_configured(products, |_| {}).await
    }

    /// Start a storefront whose [`test_config`] is adjusted by `configure`.
    pub async fn start_configured(
        products: Vec<Product>,
        configure: impl FnOnce(&mut StorefrontConfig),
    ) -> Self {
        let catalog = MockCatalog::start(products).await;
        let orders = Arc::new(RecordingOrderSink::default());
        let mut config = test_config(catalog.base_url());
        configure(&mut config);
        let state =
            AppState::with_order_sink(config, Arc::clone(&orders) as Arc<dyn OrderSink>);
        state
            .listing()
            .refresh_if_stale()
            .await
            .expect("initial listing fetch");

        let (listener, base_url) = bind_local().await;
        let service = app(state.clone()).into_make_service_with_connect_info::<SocketAddr>();
        let join = tokio::spawn(async move {
            let _ = axum::serve(listener, service).await;
        });

        Self {
            client: Self::new_client(),
            catalog,
            orders,
            state,
            server: ServerHandle { base_url, join },
        }
    }

    /// A fresh client with its own cookie jar (a second browser).
    #[must_use]
    pub fn new_client() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("build http client")
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server.base_url)
    }

    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.expect("GET");
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        self.send_json(reqwest::Method::POST, path, body).await
    }

    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .expect("send request");
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    /// Log in through the storefront API.
    pub async fn login(&self, email: &str, password: &str) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request");
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    pub async fn login_admin(&self) {
        let (status, _) = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(status, reqwest::StatusCode::OK, "admin login failed");
    }

    pub async fn login_customer(&self) {
        let (status, _) = self.login(CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;
        assert_eq!(status, reqwest::StatusCode::OK, "customer login failed");
    }

    /// Run one tick of the background listing refresher.
    ///
    /// Returns whether the catalog was refetched.
    pub async fn refresh_listing(&self) -> bool {
        self.state
            .listing()
            .refresh_if_stale()
            .await
            .expect("listing refresh")
    }

    /// Orders submitted so far.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.orders
            .orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
