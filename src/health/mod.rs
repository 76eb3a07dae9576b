/*!
 * # Health Check Module
 *
 * - Liveness (`/health`) - the process is up and serving requests
 * - Readiness (`/health/ready`) - the database answers a trivial query
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppState;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthInfo {
    fn new(status: HealthStatus, message: Option<String>) -> Self {
        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            message,
        }
    }
}

/// Liveness endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthInfo::new(HealthStatus::Up, None)))
}

/// Readiness endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match crate::db::check_connection(&state.db).await {
        Ok(()) => (StatusCode::OK, Json(HealthInfo::new(HealthStatus::Up, None))),
        Err(e) => {
            warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthInfo::new(
                    HealthStatus::Down,
                    Some("Database is unreachable".to_string()),
                )),
            )
        }
    }
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
}
