//! Application state shared across handlers.

use std::sync::Arc;

use hello_shop_core::{ListingCache, MemoryStore};

use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::listing::ListingService;
use crate::services::{LogOrderSink, OrderSink};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    listing: ListingService,
    orders: Arc<dyn OrderSink>,
}

impl AppState {
    /// Create the application state with the logging order sink.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        Self::with_order_sink(config, Arc::new(LogOrderSink))
    }

    /// Create the application state with a custom order sink.
    #[must_use]
    pub fn with_order_sink(config: StorefrontConfig, orders: Arc<dyn OrderSink>) -> Self {
        let catalog = CatalogClient::new(&config.catalog);
        let listing = ListingService::with_cache(
            catalog.clone(),
            ListingCache::with_ttl(MemoryStore::new(), config.catalog.listing_ttl),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                listing,
                orders,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    #[must_use]
    pub fn listing(&self) -> &ListingService {
        &self.inner.listing
    }

    #[must_use]
    pub fn orders(&self) -> &dyn OrderSink {
        self.inner.orders.as_ref()
    }
}
