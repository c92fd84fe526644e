//! Role predicates applied as route layers after [`require_auth`].
//!
//! [`require_auth`]: super::auth::require_auth

use axum::extract::{Path, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use glim_core::error::{AppError, ErrorKind};
use glim_service::RequestContext;

use crate::error::ApiError;
use crate::extractors::parse_id;
use crate::state::AppState;

const NO_PERMISSION: &str = "user has no proper permissions";

fn context(request: &Request) -> Result<RequestContext, ApiError> {
    request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .ok_or_else(|| ApiError(AppError::unauthorized("missing authorization token")))
}

fn deny(ctx: &RequestContext, request: &Request) -> ApiError {
    debug!(uid = ctx.uid, path = %request.uri().path(), "Role check failed");
    ApiError(AppError::forbidden(NO_PERMISSION))
}

/// Manager only.
pub async fn require_manager(request: Request, next: Next) -> Result<Response, ApiError> {
    let ctx = context(&request)?;
    if !ctx.manager {
        return Err(deny(&ctx, &request));
    }
    Ok(next.run(request).await)
}

/// Manager or read-only.
pub async fn require_reader_role(request: Request, next: Next) -> Result<Response, ApiError> {
    let ctx = context(&request)?;
    if !ctx.is_reader() {
        return Err(deny(&ctx, &request));
    }
    Ok(next.run(request).await)
}

/// Manager, read-only, or the owner of the `{uid}` in the path.
pub async fn require_reader(
    Path(uid): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = context(&request)?;
    if !ctx.is_reader() && !ctx.is_self(parse_id("uid", &uid)?) {
        return Err(deny(&ctx, &request));
    }
    Ok(next.run(request).await)
}

/// Manager, read-only, or the owner of the username in the path.
pub async fn require_reader_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = context(&request)?;
    if !ctx.is_reader() {
        let owner = match state.users.uid_of(&username).await {
            Ok(uid) => Some(uid),
            Err(e) if e.kind == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        if owner != Some(ctx.uid) {
            return Err(deny(&ctx, &request));
        }
    }
    Ok(next.run(request).await)
}

/// Manager, or the owner of the `{uid}` in the path when not read-only.
pub async fn require_updater(
    Path(uid): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = context(&request)?;
    let uid = parse_id("uid", &uid)?;
    if !ctx.manager && !(ctx.is_self(uid) && !ctx.readonly) {
        return Err(deny(&ctx, &request));
    }
    Ok(next.run(request).await)
}
