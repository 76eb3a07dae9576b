//! Products, customers and the unauthenticated operational endpoints.

mod common;

use axum::http::Method;
use common::{message, order_line, response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn product_codes_are_unique_per_owner() {
    let app = TestApp::new().await;
    app.seed_product("mug", 5, "3").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/products",
            Some(json!({ "code": " MUG ", "name": "Mug", "price": "3", "cost": "1", "quantity": 1 })),
        )
        .await;
    assert_eq!(response.status(), 409);
    assert_eq!(
        message(&response_json(response).await),
        "A product with this code already exists!"
    );

    // another store may use the same code
    let other = app.token_for(uuid::Uuid::new_v4());
    let response = app
        .request(
            Method::POST,
            "/api/products",
            Some(json!({ "code": "MUG", "name": "Mug", "price": "3", "cost": "1", "quantity": 1 })),
            Some(&other),
        )
        .await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn restock_sets_the_on_hand_quantity() {
    let app = TestApp::new().await;
    let id = app.seed_product("A", 5, "3").await;

    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/products/{}/restock", id),
            Some(json!({ "quantity": 25 })),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["quantity"], 25);
    assert_eq!(app.stock_of("A").await, 25);

    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/products/{}/restock", id),
            Some(json!({ "quantity": -1 })),
        )
        .await;
    assert_eq!(response.status(), 422);
    assert_eq!(app.stock_of("A").await, 25);
}

#[tokio::test]
async fn other_owners_cannot_restock() {
    let app = TestApp::new().await;
    let id = app.seed_product("A", 5, "3").await;
    let other = app.token_for(uuid::Uuid::new_v4());

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/products/{}/restock", id),
            Some(json!({ "quantity": 99 })),
            Some(&other),
        )
        .await;

    assert_eq!(response.status(), 401);
    assert_eq!(message(&response_json(response).await), "Unauthorized access!");
    assert_eq!(app.stock_of("A").await, 5);
}

#[tokio::test]
async fn products_on_orders_cannot_be_deleted() {
    let app = TestApp::new().await;
    let used = app.seed_product("A", 5, "3").await;
    let unused = app.seed_product("B", 5, "3").await;
    let customer = app.seed_customer().await;
    app.create_order(json!({ "customer": customer, "products": [order_line("A", 1, "3")] }))
        .await;

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/products/{}", used), None)
        .await;
    assert_eq!(response.status(), 422);
    assert_eq!(
        message(&response_json(response).await),
        "Cannot delete this product since there are order/s using this"
    );

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/products/{}", unused), None)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        message(&response_json(response).await),
        "Successfully deleted product!"
    );

    // deleted products no longer resolve on new orders
    let (status, body) = app
        .create_order(json!({ "customer": customer, "products": [order_line("B", 1, "3")] }))
        .await;
    assert_eq!(status, 422);
    assert_eq!(
        message(&body),
        "Some products entered have not been created yet!"
    );
}

#[tokio::test]
async fn blacklisting_is_toggled_per_customer() {
    let app = TestApp::new().await;
    let customer = app.seed_customer().await;

    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/customers/{}/blacklist", customer),
            Some(json!({ "isBlacklisted": true })),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["isBlacklisted"], true);
}

#[tokio::test]
async fn health_and_metrics_need_no_token() {
    let app = TestApp::new().await;
    app.seed_product("A", 5, "3").await;
    let customer = app.seed_customer().await;
    app.create_order(json!({ "customer": customer, "products": [order_line("A", 1, "3")] }))
        .await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), 200);

    let response = app.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(response.status(), 200);

    let response = app.request(Method::GET, "/metrics", None, None).await;
    assert_eq!(response.status(), 200);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("orders_created_total"));
}
