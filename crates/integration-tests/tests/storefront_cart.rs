//! Integration tests for the session cart.
//!
//! Run with: cargo test -p hello-shop-integration-tests

#![allow(clippy::unwrap_used)]

use hello_shop_integration_tests::TestStorefront;
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn add(shop: &TestStorefront, id: i64) -> (StatusCode, Value) {
    shop.post_json("/api/cart/add", &json!({ "product_id": id })).await
}

// ============================================================================
// Add / Remove / Clear
// ============================================================================

#[tokio::test]
async fn test_empty_cart() {
    let shop = TestStorefront::start().await;

    let (status, cart) = shop.get_json("/api/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["total_items"], 0);
    assert_eq!(cart["total_price"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_add_merges_quantities_and_totals() {
    let shop = TestStorefront::start().await;

    add(&shop, 1).await;
    add(&shop, 2).await;
    let (status, cart) = add(&shop, 1).await;
    assert_eq!(status, StatusCode::OK);

    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // First-add order is kept
    assert_eq!(items[0]["id"], 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["line_total"].as_f64(), Some(25.0));
    assert_eq!(items[0]["image"], "https://cdn.shop.test/1.jpg");
    assert_eq!(items[1]["id"], 2);
    assert_eq!(items[1]["quantity"], 1);

    assert_eq!(cart["total_items"], 3);
    assert_eq!(cart["total_price"].as_f64(), Some(55.0));

    let (_, count) = shop.get_json("/api/cart/count").await;
    assert_eq!(count["count"], 3);
}

#[tokio::test]
async fn test_add_accepts_camel_case_body() {
    let shop = TestStorefront::start().await;

    let (status, cart) = shop
        .post_json("/api/cart/add", &json!({ "productId": 3 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["title"], "Leather Boots");
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let shop = TestStorefront::start().await;

    let (status, body) = add(&shop, 404).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (_, count) = shop.get_json("/api/cart/count").await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_remove_decrements_then_drops_line() {
    let shop = TestStorefront::start().await;
    add(&shop, 1).await;
    add(&shop, 1).await;

    let (_, cart) = shop
        .post_json("/api/cart/remove", &json!({ "product_id": 1 }))
        .await;
    assert_eq!(cart["items"][0]["quantity"], 1);

    let (_, cart) = shop
        .post_json("/api/cart/remove", &json!({ "product_id": 1 }))
        .await;
    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["total_items"], 0);
}

#[tokio::test]
async fn test_remove_unknown_product_is_ignored() {
    let shop = TestStorefront::start().await;
    add(&shop, 2).await;

    let (status, cart) = shop
        .post_json("/api/cart/remove", &json!({ "product_id": 99 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_items"], 1);
}

#[tokio::test]
async fn test_clear() {
    let shop = TestStorefront::start().await;
    add(&shop, 1).await;
    add(&shop, 3).await;

    let (status, cart) = shop.post_json("/api/cart/clear", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"], json!([]));

    let (_, count) = shop.get_json("/api/cart/count").await;
    assert_eq!(count["count"], 0);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_cart_is_per_session() {
    let shop = TestStorefront::start().await;
    add(&shop, 1).await;

    let other = TestStorefront::new_client();
    let cart: Value = other
        .get(shop.url("/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["total_items"], 0);

    let (_, count) = shop.get_json("/api/cart/count").await;
    assert_eq!(count["count"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_on_one_session_are_all_kept() {
    let shop = TestStorefront::start().await;

    // Establish the session cookie first
    add(&shop, 1).await;

    for round in 1..=3 {
        let results = tokio::join!(
            add(&shop, 1),
            add(&shop, 1),
            add(&shop, 2),
            add(&shop, 1),
            add(&shop, 3),
            add(&shop, 1),
        );
        for (status, _) in [results.0, results.1, results.2, results.3, results.4, results.5] {
            assert_eq!(status, StatusCode::OK);
        }

        let (_, count) = shop.get_json("/api/cart/count").await;
        assert_eq!(count["count"], 1 + 6 * round, "round {round}");
    }

    let (_, cart) = shop.get_json("/api/cart").await;
    let quantities: Vec<(i64, i64)> = cart["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| (line["id"].as_i64().unwrap(), line["quantity"].as_i64().unwrap()))
        .collect();
    assert!(quantities.contains(&(1, 13)));
    assert!(quantities.contains(&(2, 3)));
    assert!(quantities.contains(&(3, 3)));
}

#[tokio::test]
async fn test_cart_snapshot_survives_catalog_change() {
    let shop = TestStorefront::start().await;
    add(&shop, 1).await;

    // Rename upstream via the admin API; the cart keeps its add-time snapshot
    shop.login_admin().await;
    shop.send_json(
        reqwest::Method::PUT,
        "/api/admin/products/1",
        &json!({ "title": "Renamed Tee" }),
    )
    .await;

    let (_, cart) = shop.get_json("/api/cart").await;
    assert_eq!(cart["items"][0]["title"], "Classic Red Tee");
}

#[tokio::test]
async fn test_cart_survives_logout() {
    let shop = TestStorefront::start().await;
    shop.login_customer().await;
    add(&shop, 2).await;

    shop.post_json("/api/auth/logout", &json!({})).await;

    let (_, count) = shop.get_json("/api/cart/count").await;
    assert_eq!(count["count"], 1);
}
