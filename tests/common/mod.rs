#![allow(dead_code)]

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use stockroom_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    repositories::ProductRepository,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "k7Qm2xVt9LpR4wZs8NcY3hBf6JdGa1Ue";

/// Application wired against a throwaway SQLite file with migrations applied.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub owner_id: Uuid,
    token: String,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir");
        let database_url = format!(
            "sqlite://{}?mode=rwc",
            db_dir.path().join("stockroom.db").display()
        );

        let mut cfg = AppConfig::new(database_url, TEST_SECRET.to_string(), "test".to_string());
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, EventSender::new(event_tx));
        let owner_id = Uuid::new_v4();
        let token = state.auth.issue_token(owner_id).expect("issue token");
        let router = stockroom_api::app_router(state.clone());

        Self {
            router,
            state,
            owner_id,
            token,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Bearer token for some other store owner.
    pub fn token_for(&self, owner_id: Uuid) -> String {
        self.state.auth.issue_token(owner_id).expect("issue token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests as the default owner.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    pub async fn seed_product(&self, code: &str, quantity: i32, price: &str) -> Uuid {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/products",
                Some(json!({
                    "code": code,
                    "name": format!("{} product", code),
                    "price": price,
                    "cost": "1",
                    "quantity": quantity,
                })),
            )
            .await;
        assert_eq!(response.status(), 201, "seed product {}", code);
        id_of(&response_json(response).await)
    }

    pub async fn seed_customer(&self) -> Uuid {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/customers",
                Some(json!({ "firstName": "Ada", "lastName": "Lovelace" })),
            )
            .await;
        assert_eq!(response.status(), 201, "seed customer");
        id_of(&response_json(response).await)
    }

    /// Creates an order and returns the response body.
    pub async fn create_order(&self, body: Value) -> (u16, Value) {
        let response = self
            .request_authenticated(Method::POST, "/api/orders", Some(body))
            .await;
        let status = response.status().as_u16();
        (status, response_json(response).await)
    }

    pub async fn create_return(&self, po_no: &str, lines: Value) -> (u16, Value) {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/purchase_returns",
                Some(json!({
                    "order": po_no,
                    "returnedProducts": lines,
                    "reason": "damaged",
                })),
            )
            .await;
        let status = response.status().as_u16();
        (status, response_json(response).await)
    }

    pub async fn get_order(&self, order_id: &str) -> Value {
        let response = self
            .request_authenticated(Method::GET, &format!("/api/orders/{}", order_id), None)
            .await;
        assert_eq!(response.status(), 200);
        response_json(response).await
    }

    /// Current stock of the default owner's product.
    pub async fn stock_of(&self, code: &str) -> i32 {
        ProductRepository::new(self.state.db.as_ref())
            .find_by_code(self.owner_id, code)
            .await
            .expect("product lookup")
            .expect("product exists")
            .quantity
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub fn id_of(body: &Value) -> Uuid {
    Uuid::parse_str(body["id"].as_str().expect("id in body")).expect("uuid id")
}

pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal: {}", other),
    }
}

pub fn message(body: &Value) -> &str {
    body["message"].as_str().unwrap_or_default()
}

pub fn order_line(code: &str, quantity: i32, price: &str) -> Value {
    json!({ "code": code, "name": format!("{} product", code), "quantity": quantity, "price": price, "cost": "2" })
}

pub fn return_line(code: &str, quantity: i32, price: &str) -> Value {
    json!({ "code": code, "name": format!("{} product", code), "quantity": quantity, "price": price })
}
