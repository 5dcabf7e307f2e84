use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{api_success, ApiResponse};
use crate::server::CareHubServer;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
    pub version: String,
    /// Seconds since the server state was built
    pub uptime: u64,
    /// Individual dependency checks
    pub checks: HashMap<String, String>,
}

/// Unauthenticated liveness probe; 503 while the store is unreachable
pub async fn health_check(
    State(server): State<CareHubServer>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let database_ok = server.store.is_healthy().await;

    let mut checks = HashMap::new();
    checks.insert(
        "database".to_string(),
        if database_ok { "healthy" } else { "unreachable" }.to_string(),
    );
    checks.insert(
        "email".to_string(),
        if server.config.email.enabled { "enabled" } else { "disabled" }.to_string(),
    );

    let response = HealthResponse {
        status: if database_ok { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: server.uptime().as_secs(),
        checks,
    };

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(api_success(response)))
}
