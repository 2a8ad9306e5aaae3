//! Time-boxed product listing cache.
//!
//! The listing is cached in a slot as `{ "data": [...], "timestamp": <unix ms> }`.
//! A cached payload whose age is within [`LISTING_TTL`] is served without a
//! refetch. Anything older, or anything unreadable, is a miss and the slot
//! is cleared.
//!
//! Refetch scheduling lives with the caller: the storefront runs a check
//! every [`REFRESH_INTERVAL`] and refetches only when [`ListingCache::is_fresh`]
//! says the cache has expired.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::product::Product;
use crate::storage::KeyValueStore;

/// Slot key holding the cached listing.
pub const LISTING_SLOT_KEY: &str = "products_cache";

/// How long a cached listing may be served without a refetch.
pub const LISTING_TTL: Duration = Duration::from_secs(3 * 60);

/// How often freshness is re-checked.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// The cached payload as stored in the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedListing {
    pub data: Vec<Product>,
    /// Unix timestamp in milliseconds when `data` was cached.
    pub timestamp: i64,
}

impl CachedListing {
    /// Age of the payload at `now`. Timestamps from the future count as age zero.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        let millis = now.timestamp_millis().saturating_sub(self.timestamp);
        Duration::from_millis(u64::try_from(millis).unwrap_or(0))
    }
}

/// Read-through cache for the product listing.
#[derive(Debug)]
pub struct ListingCache<S> {
    storage: S,
    ttl: Duration,
}

impl<S: KeyValueStore> ListingCache<S> {
    /// Create a cache with the default [`LISTING_TTL`].
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self::with_ttl(storage, LISTING_TTL)
    }

    #[must_use]
    pub const fn with_ttl(storage: S, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether the slot holds a readable payload no older than the TTL.
    ///
    /// Does not touch the slot.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.peek()
            .is_some_and(|cached| cached.age_at(now) <= self.ttl)
    }

    /// Return the cached listing if it is still fresh.
    ///
    /// Expired or unreadable payloads are removed from the slot.
    pub fn read_fresh(&mut self, now: DateTime<Utc>) -> Option<Vec<Product>> {
        let raw = self.storage.get(LISTING_SLOT_KEY)?;

        let cached = match serde_json::from_str::<CachedListing>(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "discarding unreadable listing cache");
                self.storage.remove(LISTING_SLOT_KEY);
                return None;
            }
        };

        if cached.age_at(now) > self.ttl {
            debug!(age_ms = cached.age_at(now).as_millis(), "listing cache expired");
            self.storage.remove(LISTING_SLOT_KEY);
            return None;
        }

        Some(cached.data)
    }

    /// Store `data` as the cached listing, stamped with `now`.
    pub fn write(&mut self, data: &[Product], now: DateTime<Utc>) {
        let cached = CachedListing {
            data: data.to_vec(),
            timestamp: now.timestamp_millis(),
        };
        match serde_json::to_string(&cached) {
            Ok(raw) => self.storage.set(LISTING_SLOT_KEY, raw),
            Err(e) => warn!(error = %e, "failed to serialize listing cache"),
        }
    }

    /// Pick the listing to show when a view mounts.
    ///
    /// A fresh cached listing is served as is. Otherwise the most recent
    /// server-provided payload is served and written back, stamped with
    /// `fetched_at` so that an old payload never passes for a fresh one.
    pub fn mount(
        &mut self,
        server_payload: Vec<Product>,
        fetched_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Vec<Product> {
        if let Some(cached) = self.read_fresh(now) {
            debug!(count = cached.len(), "serving cached listing");
            return cached;
        }

        debug!(count = server_payload.len(), "cache miss, serving server payload");
        self.write(&server_payload, fetched_at);
        server_payload
    }

    /// Drop the cached listing.
    pub fn invalidate(&mut self) {
        self.storage.remove(LISTING_SLOT_KEY);
    }

    fn peek(&self) -> Option<CachedListing> {
        let raw = self.storage.get(LISTING_SLOT_KEY)?;
        serde_json::from_str(&raw).ok()
    }
}
