//! Bearer token authentication middleware.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use glim_core::error::AppError;
use glim_core::result::AppResult;
use glim_service::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Validates the access token and stores the caller's [`RequestContext`]
/// in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let claims = state.tokens.validate(&token).await.inspect_err(|e| {
        debug!(path = %request.uri().path(), kind = %e.kind, "Rejected access token");
    })?;

    request
        .extensions_mut()
        .insert(RequestContext::from_claims(&claims));
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> AppResult<String> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AppError::unauthorized("invalid authorization header"))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AppError::unauthorized("invalid authorization header"));
    }
    Ok(token.trim().to_string())
}
