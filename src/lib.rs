//! Stockroom API
//!
//! Multi-tenant inventory and order backend. Store owners keep products and
//! customers, raise purchase orders that draw down stock, and record purchase
//! returns that restock products and keep each order's store credit within
//! what is still owed.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub auth: Arc<auth::AuthService>,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires services, auth and the event channel around an open pool.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let auth = Arc::new(auth::AuthService::new(auth::AuthConfig::new(
            config.jwt_secret.clone(),
            auth::DEFAULT_ISSUER.to_string(),
            std::time::Duration::from_secs(config.jwt_expiration),
        )));
        let event_sender = Arc::new(event_sender);
        let services = handlers::AppServices::new(db.clone(), event_sender.clone());

        Self {
            db,
            config,
            event_sender,
            auth,
            services,
        }
    }
}

/// Authenticated API routes, relative to `/api`.
pub fn api_routes() -> Router<AppState> {
    use handlers::{customers, orders, products, returns};

    Router::new()
        .route("/orders", post(orders::create_order))
        .route(
            "/orders/:id",
            get(orders::get_order)
                .patch(orders::update_order)
                .delete(orders::cancel_order),
        )
        .route(
            "/orders/:id/purchase_returns",
            get(orders::get_order_returns),
        )
        .route("/purchase_returns", post(returns::create_return))
        .route("/purchase_returns/:id", get(returns::get_return))
        // the segment holds a PO number here
        .route(
            "/purchase_returns/:id/order",
            get(returns::get_returnable_order),
        )
        .route("/products", post(products::create_product))
        .route(
            "/products/:id",
            axum::routing::delete(products::delete_product),
        )
        .route("/products/:id/restock", patch(products::restock_product))
        .route("/customers", post(customers::create_customer))
        .route(
            "/customers/:id/blacklist",
            patch(customers::set_blacklisted),
        )
}

/// Full application router: health and metrics, the authenticated API, and
/// the request id and tracing layers.
pub fn app_router(state: AppState) -> Router {
    let api = api_routes().layer(middleware::from_fn_with_state(
        state.auth.clone(),
        auth::auth_middleware,
    ));

    Router::new()
        .merge(health::health_routes())
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/api", api)
        // HTTP tracing layer for consistent request/response telemetry
        .layer(tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
