//! Integration tests for the product listing and detail endpoints.
//!
//! Run with: cargo test -p hello-shop-integration-tests

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use hello_shop_integration_tests::{TestStorefront, catalog_product, seed_products};
use reqwest::StatusCode;
use serde_json::Value;

fn titles(listing: &Value) -> Vec<&str> {
    listing
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let shop = TestStorefront::start().await;

    let resp = shop.client.get(shop.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_listing() {
    let shop = TestStorefront::start().await;

    let (status, listing) = shop.get_json("/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        titles(&listing),
        vec!["Classic Red Tee", "Blue Denim Jacket", "Leather Boots"]
    );
    assert_eq!(listing[0]["price"].as_f64(), Some(12.5));
}

#[tokio::test]
async fn test_listing_search_is_case_insensitive() {
    let shop = TestStorefront::start().await;

    let (_, listing) = shop.get_json("/api/products?search=DENIM").await;
    assert_eq!(titles(&listing), vec!["Blue Denim Jacket"]);

    let (_, listing) = shop.get_json("/api/products?search=%20%20").await;
    assert_eq!(listing.as_array().unwrap().len(), 3);

    let (_, listing) = shop.get_json("/api/products?search=sofa").await;
    assert_eq!(listing.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_listing_normalizes_images() {
    let mut broken = catalog_product(5, "Odd Images", 500);
    broken.images = vec![r#"["https://cdn.shop.test/odd.jpg"]"#.to_string()];
    let mut missing = catalog_product(6, "No Images", 500);
    missing.images = Vec::new();

    let shop = TestStorefront::start_with(vec![broken, missing]).await;

    let (_, listing) = shop.get_json("/api/products").await;
    assert_eq!(listing[0]["images"][0], "https://cdn.shop.test/odd.jpg");
    assert_eq!(
        listing[1]["images"][0],
        hello_shop_core::PLACEHOLDER_IMAGE
    );
}

#[tokio::test]
async fn test_listing_is_cached_between_requests() {
    let shop = TestStorefront::start().await;

    // An upstream change made behind the storefront's back stays invisible
    // until the listing expires
    shop.catalog.remove(1);

    let (_, listing) = shop.get_json("/api/products").await;
    assert_eq!(listing.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_expired_listing_is_refetched_from_catalog() {
    let shop = TestStorefront::start_configured(seed_products(), |config| {
        config.catalog.listing_ttl = Duration::from_millis(200);
    })
    .await;

    shop.catalog.remove(1);
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Traffic on an expired listing still serves the last payload
    let (_, listing) = shop.get_json("/api/products").await;
    assert_eq!(listing.as_array().unwrap().len(), 3);

    assert!(shop.refresh_listing().await);

    let (status, listing) = shop.get_json("/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&listing), ["Blue Denim Jacket", "Leather Boots"]);

    // Fresh again, so the next tick leaves the catalog alone
    assert!(!shop.refresh_listing().await);
}

#[tokio::test]
async fn test_product_detail() {
    let shop = TestStorefront::start().await;

    let (status, product) = shop.get_json("/api/products/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["title"], "Blue Denim Jacket");
    assert_eq!(product["category"]["name"], "Clothes");
}

#[tokio::test]
async fn test_product_detail_unknown_id() {
    let shop = TestStorefront::start().await;

    let (status, body) = shop.get_json("/api/products/12345").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("Not found"));
}
