//! Hello Shop Core - cart state, listing cache and catalog types.
//!
//! This crate provides the pieces of the storefront that carry real
//! invariants:
//! - `cart` - the per-session cart store and its persistence protocol
//! - `listing` - the time-boxed product listing cache
//! - `image` - normalization of loose catalog image references
//!
//! # Architecture
//!
//! The core crate contains only types and algorithms - no HTTP clients, no
//! sessions, no runtime. Persistence goes through the [`KeyValueStore`]
//! trait so the storefront can back it with request sessions and tests can
//! back it with in-memory maps.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails and roles
//! - [`product`] - Catalog product records
//! - [`storage`] - Durable slot trait and in-memory implementations
//! - [`cart`] - Cart store
//! - [`listing`] - Listing cache
//! - [`image`] - Image reference normalization

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod image;
pub mod listing;
pub mod product;
pub mod storage;
pub mod types;

pub use cart::{CART_SLOT_KEY, CartError, CartLine, CartStore, Lifecycle};
pub use image::{ImageRef, PLACEHOLDER_IMAGE, normalize_images};
pub use listing::{CachedListing, LISTING_SLOT_KEY, LISTING_TTL, ListingCache, REFRESH_INTERVAL};
pub use product::{Category, Product};
pub use storage::{JournaledStore, KeyValueStore, MemoryStore, SlotOp};
pub use types::*;
