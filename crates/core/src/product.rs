//! Catalog product types.
//!
//! These mirror the records served by the upstream catalog API. Only the
//! fields the storefront uses are modelled; anything else the API sends
//! (slugs, audit timestamps) is ignored on deserialization.

use serde::{Deserialize, Serialize};

use crate::image;
use crate::types::{CategoryId, Price, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    /// Raw image references exactly as the catalog sent them.
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    /// Image URLs safe to hand to a renderer.
    ///
    /// Never empty: falls back to a single placeholder.
    #[must_use]
    pub fn display_images(&self) -> Vec<String> {
        image::normalize_images(&self.images)
    }

    /// Case-insensitive title match used by the listing search box.
    #[must_use]
    pub fn title_matches(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(&term.to_lowercase())
    }
}
