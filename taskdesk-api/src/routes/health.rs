/// Health check and API info endpoints
///
/// # Endpoints
///
/// ```text
/// GET /health
/// GET /api/v1
/// ```
///
/// # Health response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "status": "healthy",
///     "version": "0.1.0",
///     "environment": "development",
///     "storage": { "backend": "postgres", "status": "connected" }
///   }
/// }
/// ```

use crate::{app::AppState, response::ApiResponse};
use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    pub environment: String,

    /// Storage status
    pub storage: StorageHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageHealth {
    pub backend: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

/// Health check handler
///
/// Returns 503 with `"status": "degraded"` when the store cannot be reached.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, ApiResponse<HealthResponse>) {
    let (status, storage_status) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "connected"),
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "disconnected")
        }
    };

    let body = HealthResponse {
        status: if status == StatusCode::OK {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.api.environment.as_str().to_string(),
        storage: StorageHealth {
            backend: state.store.backend().to_string(),
            status: storage_status.to_string(),
        },
    };

    (status, ApiResponse::ok(body))
}

/// API welcome handler
pub async fn api_info() -> ApiResponse<ApiInfo> {
    ApiResponse::ok(ApiInfo {
        name: "Taskdesk API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: vec!["/api/v1/auth".to_string(), "/api/v1/tasks".to_string()],
    })
    .with_message("Welcome to the Taskdesk API")
}
