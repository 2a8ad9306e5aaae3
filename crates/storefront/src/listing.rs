//! Process-wide product listing.
//!
//! Wraps the core [`ListingCache`] with the catalog client, the most recent
//! server payload and products created through the admin API. A background
//! task re-checks freshness every [`REFRESH_INTERVAL`] and refetches only
//! when the cache has expired. A failed refetch keeps the current listing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use hello_shop_core::{ListingCache, MemoryStore, Product, ProductId, REFRESH_INTERVAL};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{CatalogClient, CatalogError};

/// Shared listing state. Cheap to clone.
#[derive(Clone)]
pub struct ListingService {
    inner: Arc<ListingInner>,
}

struct ListingInner {
    catalog: CatalogClient,
    state: Mutex<ListingState>,
}

struct ListingState {
    cache: ListingCache<MemoryStore>,
    /// Latest listing fetched from the catalog.
    server_payload: Vec<Product>,
    /// When `server_payload` was fetched. The epoch until the first fetch.
    fetched_at: DateTime<Utc>,
    /// Products created through the admin API, newest first.
    created: Vec<Product>,
}

impl ListingService {
    #[must_use]
    pub fn new(catalog: CatalogClient) -> Self {
        Self::with_cache(catalog, ListingCache::new(MemoryStore::new()))
    }

    /// Build a service over a specific cache, e.g. one with a short TTL.
    #[must_use]
    pub fn with_cache(catalog: CatalogClient, cache: ListingCache<MemoryStore>) -> Self {
        Self {
            inner: Arc::new(ListingInner {
                catalog,
                state: Mutex::new(ListingState {
                    cache,
                    server_payload: Vec::new(),
                    fetched_at: DateTime::<Utc>::UNIX_EPOCH,
                    created: Vec::new(),
                }),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ListingState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The listing to serve right now.
    ///
    /// A fresh cache wins; otherwise the latest server payload is served and
    /// written back with its fetch time, so serving it never postpones the
    /// next refetch. Admin-created products come first.
    #[must_use]
    pub fn mount(&self) -> Vec<Product> {
        let mut state = self.state();
        let server_payload = state.server_payload.clone();
        let fetched_at = state.fetched_at;
        let listing = state.cache.mount(server_payload, fetched_at, Utc::now());

        let mut merged = state.created.clone();
        merged.extend(
            listing
                .into_iter()
                .filter(|product| !state.created.iter().any(|c| c.id == product.id)),
        );
        merged
    }

    /// Refetch the listing if the cache has expired.
    ///
    /// Returns `Ok(true)` when a refetch happened.
    ///
    /// # Errors
    ///
    /// Returns the catalog error when the refetch fails; the current listing
    /// is kept.
    #[instrument(skip(self))]
    pub async fn refresh_if_stale(&self) -> Result<bool, CatalogError> {
        if self.state().cache.is_fresh(Utc::now()) {
            debug!("listing cache still fresh");
            return Ok(false);
        }

        let products = self.inner.catalog.list_products(0).await?;

        let fetched_at = Utc::now();
        let mut state = self.state();
        state.cache.write(&products, fetched_at);
        info!(count = products.len(), "listing refreshed");
        state.server_payload = products;
        state.fetched_at = fetched_at;
        Ok(true)
    }

    /// Start the periodic freshness check on the current tokio runtime.
    #[must_use]
    pub fn spawn_refresher(&self) -> RefreshHandle {
        self.spawn_refresher_every(REFRESH_INTERVAL)
    }

    /// Start the periodic freshness check with a custom period.
    #[must_use]
    pub fn spawn_refresher_every(&self, period: Duration) -> RefreshHandle {
        let service = self.clone();
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = service.refresh_if_stale().await {
                    warn!(error = %e, "listing refresh failed, keeping current listing");
                }
            }
        });
        RefreshHandle { join }
    }

    /// Record a product created through the admin API.
    pub fn record_created(&self, product: Product) {
        let mut state = self.state();
        state.created.retain(|p| p.id != product.id);
        state.created.insert(0, product);
    }

    /// Record an updated product wherever it is listed.
    pub fn record_updated(&self, product: &Product) {
        let mut guard = self.state();
        let state = &mut *guard;
        let mut touched = false;
        for slot in state
            .created
            .iter_mut()
            .chain(state.server_payload.iter_mut())
            .filter(|p| p.id == product.id)
        {
            slot.clone_from(product);
            touched = true;
        }
        if touched {
            state.cache.invalidate();
        }
    }

    /// Drop a deleted product from the listing.
    pub fn record_deleted(&self, id: ProductId) {
        let mut state = self.state();
        state.created.retain(|p| p.id != id);
        state.server_payload.retain(|p| p.id != id);
        state.cache.invalidate();
    }
}

/// Handle owning the refresher task. Dropping it stops the task.
#[derive(Debug)]
pub struct RefreshHandle {
    join: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop the refresher now.
    pub fn stop(self) {
        drop(self);
    }

    /// Whether the task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hello_shop_core::{Category, CategoryId, LISTING_TTL, Price};

    use super::*;
    use crate::config::CatalogConfig;

    fn product(id: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::from_cents(1000),
            description: String::new(),
            category: Category {
                id: CategoryId::new(1),
                name: "Test".to_string(),
                image: String::new(),
            },
            images: Vec::new(),
        }
    }

    fn unreachable_catalog() -> CatalogClient {
        // Port 9 (discard) is never listening; fetches fail fast
        CatalogClient::new(&CatalogConfig {
            api_url: "http://127.0.0.1:9".parse().unwrap(),
            page_size: 20,
            listing_ttl: LISTING_TTL,
        })
    }

    fn service() -> ListingService {
        ListingService::new(unreachable_catalog())
    }

    /// Install `products` as if they had just been fetched.
    fn seed(service: &ListingService, products: Vec<Product>) {
        let mut state = service.state();
        state.server_payload = products;
        state.fetched_at = Utc::now();
    }

    #[test]
    fn test_mount_serves_server_payload_then_cache() {
        let service = service();
        seed(&service, vec![product(1), product(2)]);
        assert_eq!(service.mount(), vec![product(1), product(2)]);

        // Cache is now fresh and wins over a newer payload
        seed(&service, vec![product(3)]);
        assert_eq!(service.mount(), vec![product(1), product(2)]);
    }

    #[test]
    fn test_created_products_come_first() {
        let service = service();
        seed(&service, vec![product(1), product(2)]);
        service.record_created(product(50));
        service.record_created(product(51));

        let ids: Vec<i64> = service.mount().iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, vec![51, 50, 1, 2]);
    }

    #[test]
    fn test_update_and_delete() {
        let service = service();
        seed(&service, vec![product(1), product(2)]);
        let _ = service.mount();

        let mut renamed = product(2);
        renamed.title = "Renamed".to_string();
        service.record_updated(&renamed);
        assert_eq!(service.mount()[1].title, "Renamed");

        service.record_deleted(ProductId::new(1));
        assert_eq!(service.mount(), vec![renamed]);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_refetch() {
        let service = service();
        seed(&service, vec![product(1)]);
        let _ = service.mount();
        assert!(!service.refresh_if_stale().await.unwrap());
    }

    #[tokio::test]
    async fn test_serving_expired_payload_does_not_postpone_refetch() {
        let ttl = Duration::from_millis(50);
        let service = ListingService::with_cache(
            unreachable_catalog(),
            ListingCache::with_ttl(MemoryStore::new(), ttl),
        );
        seed(&service, vec![product(1)]);

        for _ in 0..3 {
            tokio::time::sleep(ttl + Duration::from_millis(30)).await;
            assert_eq!(service.mount(), vec![product(1)]);
            // Still expired, so the refresher tries the catalog again
            assert!(service.refresh_if_stale().await.is_err());
        }
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_listing() {
        let service = service();
        seed(&service, vec![product(1)]);
        service.state().cache.invalidate();

        assert!(service.refresh_if_stale().await.is_err());
        assert_eq!(service.mount(), vec![product(1)]);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_refresher() {
        let service = service();
        let handle = service.spawn_refresher_every(Duration::from_secs(3600));
        assert!(!handle.is_finished());

        let join = {
            let RefreshHandle { join } = &handle;
            join.abort_handle()
        };
        handle.stop();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(join.is_finished());
    }
}
