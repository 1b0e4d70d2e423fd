/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "storage": "postgres" }
/// ```
///
/// `status` is `degraded` when the storage backend does not answer; the
/// endpoint itself always returns 200.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// Active storage backend
    pub storage: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.storage.health_check().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            "degraded"
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.storage.backend_name().to_string(),
    })
}
