//! User handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::dto::request::{ChangePassword, CreateUser, UpdateUser};
use crate::dto::response::{UidResponse, UserInfo};
use crate::error::ApiError;
use crate::extractors::{ApiJson, AuthUser, PaginationParams, parse_id};
use crate::state::AppState;

/// GET /v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<UserInfo>>, ApiError> {
    let users = state.users.list(&params.into_page_request()).await?;
    Ok(Json(users.iter().map(UserInfo::with_groups).collect()))
}

/// GET /v1/users/{uid}
pub async fn get_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<UserInfo>, ApiError> {
    let user = state.users.get(parse_id("uid", &uid)?).await?;
    Ok(Json(UserInfo::with_groups(&user)))
}

/// GET /v1/users/{username}/uid
pub async fn lookup_uid(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UidResponse>, ApiError> {
    let uid = state.users.uid_of(&username).await?;
    Ok(Json(UidResponse { uid }))
}

/// POST /v1/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CreateUser>,
) -> Result<Json<UserInfo>, ApiError> {
    let user = state.users.create(&auth, body).await?;
    Ok(Json(UserInfo::with_groups(&user)))
}

/// PUT /v1/users/{uid}
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(uid): Path<String>,
    ApiJson(body): ApiJson<UpdateUser>,
) -> Result<Json<UserInfo>, ApiError> {
    let user = state
        .users
        .update(&auth, parse_id("uid", &uid)?, body)
        .await?;
    Ok(Json(UserInfo::with_groups(&user)))
}

/// DELETE /v1/users/{uid}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(uid): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.users.delete(&auth, parse_id("uid", &uid)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/users/{uid}/passwd
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(uid): Path<String>,
    ApiJson(body): ApiJson<ChangePassword>,
) -> Result<StatusCode, ApiError> {
    state
        .users
        .change_password(&auth, parse_id("uid", &uid)?, body)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
