//! Order creation, edits and cancellation through the HTTP surface.

mod common;

use axum::http::Method;
use common::{decimal, message, order_line, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn submitted_order_takes_stock() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;

    let (status, body) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("a", 4, "5")],
            "credit": "0",
            "status": "SUBMIT",
        }))
        .await;

    assert_eq!(status, 201, "{}", body);
    assert_eq!(body["status"], "SUBMIT");
    assert_eq!(body["products"][0]["code"], "A");
    assert_eq!(body["prtIds"], json!([]));
    assert_eq!(app.stock_of("A").await, 6);
}

#[tokio::test]
async fn draft_order_leaves_stock_alone() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;

    let (status, body) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 4, "5")],
        }))
        .await;

    assert_eq!(status, 201);
    assert_eq!(body["status"], "DRAFT");
    assert_eq!(app.stock_of("A").await, 10);
}

#[tokio::test]
async fn ordering_the_whole_stock_is_allowed() {
    let app = TestApp::new().await;
    app.seed_product("A", 3, "5").await;
    let customer = app.seed_customer().await;

    let (status, _) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 3, "5")],
            "status": "SUBMIT",
        }))
        .await;

    assert_eq!(status, 201);
    assert_eq!(app.stock_of("A").await, 0);
}

#[tokio::test]
async fn stock_exceeded_names_first_offender_and_changes_nothing() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    app.seed_product("B", 1, "5").await;
    app.seed_product("C", 1, "5").await;
    let customer = app.seed_customer().await;

    let (status, body) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 2, "5"), order_line("B", 2, "5"), order_line("C", 9, "5")],
            "status": "SUBMIT",
        }))
        .await;

    assert_eq!(status, 422);
    assert_eq!(
        message(&body),
        "The order quantity for B has exceeded its stock quantity."
    );
    assert_eq!(app.stock_of("A").await, 10);
    assert_eq!(app.stock_of("B").await, 1);
}

#[tokio::test]
async fn blacklisted_customer_cannot_order() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;

    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/customers/{}/blacklist", customer),
            Some(json!({ "isBlacklisted": true })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let (status, body) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 1, "5")],
            "status": "SUBMIT",
        }))
        .await;

    assert_eq!(status, 422);
    assert!(message(&body).starts_with("This customer is blacklisted"));
    assert_eq!(app.stock_of("A").await, 10);
}

#[tokio::test]
async fn unknown_product_code_is_rejected() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;

    let (status, body) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 1, "5"), order_line("GHOST", 1, "5")],
        }))
        .await;

    assert_eq!(status, 422);
    assert_eq!(message(&body), "Some products entered have not been created yet!");
}

#[tokio::test]
async fn credit_cannot_exceed_order_total() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;

    let (status, body) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 2, "5")],
            "credit": "10.01",
        }))
        .await;

    assert_eq!(status, 422);
    assert_eq!(
        message(&body),
        "The credit entered exceeds the total purchase amount!"
    );
}

#[tokio::test]
async fn cancelled_is_not_an_entry_status() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;

    let (status, body) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 1, "5")],
            "status": "CANCELLED",
        }))
        .await;

    assert_eq!(status, 422);
    assert_eq!(message(&body), "'Status' must be one of [DRAFT, SUBMIT]!");
}

#[tokio::test]
async fn submitting_a_draft_takes_stock_exactly_once() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;
    let (_, order) = app
        .create_order(json!({ "customer": customer, "products": [order_line("A", 4, "5")] }))
        .await;
    let uri = format!("/api/orders/{}", order["id"].as_str().unwrap());

    let response = app
        .request_authenticated(Method::PATCH, &uri, Some(json!({ "status": "SUBMIT" })))
        .await;
    assert_eq!(response.status(), 201);
    assert_eq!(
        message(&response_json(response).await),
        "Successfully updated order!"
    );
    assert_eq!(app.stock_of("A").await, 6);

    // a second SUBMIT edit only touches credit/remarks
    let response = app
        .request_authenticated(
            Method::PATCH,
            &uri,
            Some(json!({ "status": "SUBMIT", "remarks": "paid" })),
        )
        .await;
    assert_eq!(response.status(), 201);
    assert_eq!(app.stock_of("A").await, 6);
}

#[tokio::test]
async fn draft_edit_replaces_lines_before_submit() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    app.seed_product("B", 10, "3").await;
    let customer = app.seed_customer().await;
    let (_, order) = app
        .create_order(json!({ "customer": customer, "products": [order_line("A", 4, "5")] }))
        .await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/orders/{}", id),
            Some(json!({ "products": [order_line("B", 2, "3")], "status": "SUBMIT" })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let stored = app.get_order(id).await;
    assert_eq!(stored["products"].as_array().unwrap().len(), 1);
    assert_eq!(stored["products"][0]["code"], "B");
    assert_eq!(stored["products"][0]["remainingQuantity"], 8);
    assert_eq!(app.stock_of("A").await, 10);
    assert_eq!(app.stock_of("B").await, 8);
}

#[tokio::test]
async fn draft_edit_may_hold_more_than_stock_until_submitted() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;
    let (_, order) = app
        .create_order(json!({ "customer": customer, "products": [order_line("A", 4, "5")] }))
        .await;
    let id = order["id"].as_str().unwrap();
    let uri = format!("/api/orders/{}", id);

    let response = app
        .request_authenticated(
            Method::PATCH,
            &uri,
            Some(json!({ "products": [order_line("A", 20, "5")], "status": "DRAFT" })),
        )
        .await;
    assert_eq!(response.status(), 201);
    assert_eq!(app.stock_of("A").await, 10);
    let stored = app.get_order(id).await;
    assert_eq!(stored["status"], "DRAFT");
    assert_eq!(stored["products"][0]["quantity"], 20);

    let response = app
        .request_authenticated(Method::PATCH, &uri, Some(json!({ "status": "SUBMIT" })))
        .await;
    assert_eq!(response.status(), 422);
    let body = response_json(response).await;
    assert_eq!(
        message(&body),
        "The order quantity for A has exceeded its stock quantity."
    );
    assert_eq!(app.stock_of("A").await, 10);
    assert_eq!(app.get_order(id).await["status"], "DRAFT");
}

#[tokio::test]
async fn oversized_purchase_amount_is_rejected() {
    let app = TestApp::new().await;
    app.seed_product("A", 100, "5").await;
    let customer = app.seed_customer().await;

    let (status, body) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 100, "10000000000000000000000000000")],
            "status": "SUBMIT",
        }))
        .await;

    assert_eq!(status, 422);
    assert_eq!(message(&body), "The total purchase amount is too large!");
    assert_eq!(app.stock_of("A").await, 100);
}

#[tokio::test]
async fn submitted_order_cannot_go_back_to_draft() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;
    let (_, order) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 4, "5")],
            "status": "SUBMIT",
        }))
        .await;

    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/orders/{}", order["id"].as_str().unwrap()),
            Some(json!({ "status": "DRAFT" })),
        )
        .await;

    assert_eq!(response.status(), 422);
    assert_eq!(
        message(&response_json(response).await),
        "Cannot update the status of an order once the order is submitted!"
    );
}

#[tokio::test]
async fn submitted_order_ignores_new_lines_but_takes_credit() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;
    let (_, order) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 4, "5")],
            "status": "SUBMIT",
        }))
        .await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/orders/{}", id),
            Some(json!({ "products": [order_line("A", 9, "5")], "credit": "15" })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let stored = app.get_order(id).await;
    assert_eq!(stored["products"][0]["quantity"], 4);
    assert_eq!(decimal(&stored["credit"]), dec!(15));
    assert_eq!(app.stock_of("A").await, 6);

    let response = app
        .request_authenticated(
            Method::PATCH,
            &format!("/api/orders/{}", id),
            Some(json!({ "credit": "21" })),
        )
        .await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn submitted_order_cannot_be_cancelled() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;
    let (_, order) = app
        .create_order(json!({
            "customer": customer,
            "products": [order_line("A", 4, "5")],
            "status": "SUBMIT",
        }))
        .await;

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/orders/{}", order["id"].as_str().unwrap()),
            None,
        )
        .await;

    assert_eq!(response.status(), 422);
    assert_eq!(
        message(&response_json(response).await),
        "Cancellation of a submitted order is not allowed!"
    );
    assert_eq!(app.stock_of("A").await, 6);
}

#[tokio::test]
async fn cancelled_draft_is_terminal() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;
    let (_, order) = app
        .create_order(json!({ "customer": customer, "products": [order_line("A", 4, "5")] }))
        .await;
    let id = order["id"].as_str().unwrap();
    let uri = format!("/api/orders/{}", id);

    let response = app.request_authenticated(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        message(&response_json(response).await),
        "Cancellation of order successful!"
    );

    let stored = app.get_order(id).await;
    assert_eq!(stored["status"], "CANCELLED");
    assert_eq!(stored["isActive"], false);
    assert_eq!(app.stock_of("A").await, 10);

    let response = app
        .request_authenticated(Method::PATCH, &uri, Some(json!({ "status": "SUBMIT" })))
        .await;
    assert_eq!(response.status(), 422);
    assert_eq!(
        message(&response_json(response).await),
        "Cannot update a cancelled order!"
    );

    let response = app.request_authenticated(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/orders", Some(json!({})), None)
        .await;

    assert_eq!(response.status(), 401);
    assert_eq!(message(&response_json(response).await), "Authentication failed!");
}

#[tokio::test]
async fn other_owners_cannot_read_or_cancel_an_order() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;
    let (_, order) = app
        .create_order(json!({ "customer": customer, "products": [order_line("A", 1, "5")] }))
        .await;
    let uri = format!("/api/orders/{}", order["id"].as_str().unwrap());
    let intruder = app.token_for(uuid::Uuid::new_v4());

    let response = app.request(Method::GET, &uri, None, Some(&intruder)).await;
    assert_eq!(response.status(), 401);
    assert_eq!(message(&response_json(response).await), "Unauthorized access!");

    let response = app.request(Method::DELETE, &uri, None, Some(&intruder)).await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn error_bodies_carry_the_request_id() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/orders/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), 404);
    let echoed = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response_json(response).await;
    assert_eq!(body["request_id"].as_str().map(str::to_string), echoed);
}
