//! Auth handlers: login, refresh, logout.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{info, warn};

use glim_auth::{TokenPair, Verification};
use glim_core::error::AppError;

use crate::dto::request::{LoginRequest, RefreshRequest};
use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::state::AppState;

const LOGIN_FAILED: &str = "wrong username or password";

/// POST /v1/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let user = match state
        .credentials
        .verify_password(&req.username, &req.password)
        .await?
    {
        Verification::Valid(user) => user,
        Verification::Locked => {
            warn!(username = %req.username, "Login attempt on locked account");
            return Err(AppError::unauthorized(LOGIN_FAILED).into());
        }
        Verification::UnknownUser | Verification::WrongPassword => {
            warn!(username = %req.username, "Login failed");
            return Err(AppError::unauthorized(LOGIN_FAILED).into());
        }
    };

    let pair = state.tokens.issue(&user).await?;
    info!(uid = user.uid, username = %user.username, "User logged in");
    Ok(Json(pair))
}

/// POST /v1/login/refresh_token
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    Ok(Json(state.tokens.refresh(&req.refresh_token).await?))
}

/// DELETE /v1/login/refresh_token
pub async fn logout(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<StatusCode, ApiError> {
    state.tokens.logout(&req.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}
