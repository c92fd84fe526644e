//! Health and capability handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::dto::response::{GuacamoleResponse, HealthResponse};
use crate::state::AppState;

/// GET /v1/healthz
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /v1/readyz
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = state.db.health_check().await.unwrap_or_else(|e| {
        warn!(error = %e, "Catalog readiness check failed");
        false
    });
    let sessions = state.sessions.health_check().await.unwrap_or_else(|e| {
        warn!(error = %e, "Session store readiness check failed");
        false
    });

    if catalog && sessions {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready".to_string(),
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
            }),
        )
    }
}

/// GET /v1/guacamole
pub async fn guacamole(State(state): State<AppState>) -> Json<GuacamoleResponse> {
    Json(GuacamoleResponse {
        enabled: state.config.guacamole,
    })
}
