//! Integration tests for checkout.
//!
//! Run with: cargo test -p hello-shop-integration-tests

#![allow(clippy::unwrap_used)]

use hello_shop_integration_tests::{CUSTOMER_EMAIL, TestStorefront};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn shipping() -> Value {
    json!({
        "name": "Jane Doe",
        "email": CUSTOMER_EMAIL,
        "phone": "555-0100",
        "address": "1 Main St",
        "city": "Springfield",
        "postalCode": "12345",
    })
}

#[tokio::test]
async fn test_checkout_requires_login() {
    let shop = TestStorefront::start().await;
    shop.post_json("/api/cart/add", &json!({ "product_id": 1 }))
        .await;

    let (status, _) = shop.post_json("/api/checkout", &shipping()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(shop.orders().is_empty());
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let shop = TestStorefront::start().await;
    shop.login_customer().await;

    let (status, body) = shop.post_json("/api/checkout", &shipping()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");
}

#[tokio::test]
async fn test_checkout_validates_shipping() {
    let shop = TestStorefront::start().await;
    shop.login_customer().await;
    shop.post_json("/api/cart/add", &json!({ "product_id": 1 }))
        .await;

    let mut form = shipping();
    form["city"] = json!("   ");
    let (status, body) = shop.post_json("/api/checkout", &form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "city is required");

    let mut form = shipping();
    form["email"] = json!("not-an-email");
    let (status, _) = shop.post_json("/api/checkout", &form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A rejected form leaves the cart alone
    let (_, count) = shop.get_json("/api/cart/count").await;
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let shop = TestStorefront::start().await;
    shop.login_customer().await;
    shop.post_json("/api/cart/add", &json!({ "product_id": 1 }))
        .await;
    shop.post_json("/api/cart/add", &json!({ "product_id": 1 }))
        .await;
    shop.post_json("/api/cart/add", &json!({ "product_id": 2 }))
        .await;

    let (status, body) = shop.post_json("/api/checkout", &shipping()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["total_price"].as_f64(), Some(55.0));
    assert!(body["order_id"].is_string());

    let orders = shop.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id.to_string(), body["order_id"].as_str().unwrap());
    assert_eq!(orders[0].customer_id.as_i64(), 7);
    assert_eq!(orders[0].lines.len(), 2);
    assert_eq!(orders[0].shipping.postal_code, "12345");

    let (_, cart) = shop.get_json("/api/cart").await;
    assert_eq!(cart["items"], json!([]));
}
