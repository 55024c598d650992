use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::db::{check_health, Database};
use crate::error::ApiError;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
pub async fn health_check(State(database): State<Database>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, db_status) = match check_health(database.pool()).await {
        Ok(()) => ("healthy", StatusCode::OK, "connected".to_string()),
        Err(e) => ("unhealthy", StatusCode::SERVICE_UNAVAILABLE, format!("error: {}", e)),
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            database: db_status,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Answer for `/api/*` paths without a route
pub async fn api_not_found() -> ApiError {
    ApiError::NotFound("endpoint not found".to_string())
}
