//! Upstream catalog API client.
//!
//! # Architecture
//!
//! - The upstream REST API is the source of truth for products and customer
//!   identities. There is no local copy beyond caches.
//! - Single products are cached in-process via `moka` (60 second TTL). The
//!   listing is cached separately by [`crate::listing::ListingService`].
//!
//! # Example
//!
//! ```rust,ignore
//! use hello_shop_storefront::catalog::CatalogClient;
//!
//! let client = CatalogClient::new(&config.catalog);
//! let page = client.list_products(0).await?;
//! let product = client.get_product(page[0].id).await?;
//! ```

mod types;

pub use types::{AccessToken, NewProduct, ProductUpdate, Profile};

use std::sync::Arc;
use std::time::Duration;

use hello_shop_core::{Product, ProductId};
use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::CatalogConfig;

const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(60);
const PRODUCT_CACHE_CAPACITY: u64 = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status.
    #[error("Catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials or token rejected by upstream.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by upstream.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// Client for the upstream catalog API.
///
/// Cheap to clone; clones share the HTTP connection pool and product cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
    cache: Cache<ProductId, Product>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(PRODUCT_CACHE_CAPACITY)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                page_size: config.page_size,
                cache,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<String, CatalogError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(what.to_string())),
            StatusCode::UNAUTHORIZED => Err(CatalogError::Unauthorized),
            // Upstream answers unknown ids with 400 "Could not find any entity"
            StatusCode::BAD_REQUEST if body.contains("Could not find") => {
                Err(CatalogError::NotFound(what.to_string()))
            }
            _ => {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Catalog API returned non-success status"
                );
                Err(CatalogError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                })
            }
        }
    }

    /// Send a request and parse the JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, CatalogError> {
        let body = self.send(request, what).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Number of products requested per page.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }

    /// Fetch one page of the product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, offset: u32) -> Result<Vec<Product>, CatalogError> {
        let url = format!(
            "{}?offset={offset}&limit={}",
            self.endpoint("products"),
            self.inner.page_size
        );
        let products: Vec<Product> = self
            .execute(self.inner.client.get(url), "products")
            .await?;
        debug!(count = products.len(), "Fetched product page");
        Ok(products)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown ids, or an error if the API
    /// request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(product) = self.inner.cache.get(&id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: Product = self
            .execute(
                self.inner.client.get(self.endpoint(&format!("products/{id}"))),
                &format!("product {id}"),
            )
            .await?;

        self.inner.cache.insert(id, product.clone()).await;
        Ok(product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or upstream rejects the input.
    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, CatalogError> {
        let created: Product = self
            .execute(
                self.inner.client.post(self.endpoint("products")).json(product),
                "products",
            )
            .await?;
        self.inner.cache.insert(created.id, created.clone()).await;
        Ok(created)
    }

    /// Update a product's title, price or description.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown ids, or an error if the API
    /// request fails.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, CatalogError> {
        self.inner.cache.invalidate(&id).await;
        let updated: Product = self
            .execute(
                self.inner
                    .client
                    .put(self.endpoint(&format!("products/{id}")))
                    .json(update),
                &format!("product {id}"),
            )
            .await?;
        self.inner.cache.insert(id, updated.clone()).await;
        Ok(updated)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown ids, or an error if the API
    /// request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.inner.cache.invalidate(&id).await;
        self.send(
            self.inner
                .client
                .delete(self.endpoint(&format!("products/{id}"))),
            &format!("product {id}"),
        )
        .await?;
        Ok(())
    }

    // =========================================================================
    // Customer Methods
    // =========================================================================

    /// Exchange credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Unauthorized` for rejected credentials, or an
    /// error if the API request fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, CatalogError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.execute(
            self.inner.client.post(self.endpoint("auth/login")).json(&body),
            "auth/login",
        )
        .await
    }

    /// Fetch the profile belonging to an access token.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Unauthorized` if the token is rejected, or an
    /// error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &AccessToken) -> Result<Profile, CatalogError> {
        self.execute(
            self.inner
                .client
                .get(self.endpoint("auth/profile"))
                .bearer_auth(&token.access_token),
            "auth/profile",
        )
        .await
    }
}
