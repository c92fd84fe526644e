//! Group handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::dto::request::{CreateGroup, MemberList, UpdateGroup};
use crate::dto::response::{GidResponse, GroupInfo};
use crate::error::ApiError;
use crate::extractors::{ApiJson, AuthUser, PaginationParams, parse_id};
use crate::state::AppState;

/// GET /v1/groups
pub async fn list_groups(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<GroupInfo>>, ApiError> {
    let groups = state.groups.list(&params.into_page_request()).await?;
    Ok(Json(groups.iter().map(GroupInfo::from).collect()))
}

/// GET /v1/groups/{gid}
pub async fn get_group(
    State(state): State<AppState>,
    Path(gid): Path<String>,
) -> Result<Json<GroupInfo>, ApiError> {
    let group = state.groups.get(parse_id("gid", &gid)?).await?;
    Ok(Json(GroupInfo::from(&group)))
}

/// GET /v1/groups/{name}/gid
pub async fn lookup_gid(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<GidResponse>, ApiError> {
    let gid = state.groups.gid_of(&name).await?;
    Ok(Json(GidResponse { gid }))
}

/// POST /v1/groups
pub async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CreateGroup>,
) -> Result<Json<GroupInfo>, ApiError> {
    let group = state.groups.create(&auth, body).await?;
    Ok(Json(GroupInfo::from(&group)))
}

/// PUT /v1/groups/{gid}
pub async fn update_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(gid): Path<String>,
    ApiJson(body): ApiJson<UpdateGroup>,
) -> Result<Json<GroupInfo>, ApiError> {
    let group = state
        .groups
        .update(&auth, parse_id("gid", &gid)?, body)
        .await?;
    Ok(Json(GroupInfo::from(&group)))
}

/// DELETE /v1/groups/{gid}
pub async fn delete_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(gid): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.groups.delete(&auth, parse_id("gid", &gid)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/groups/{gid}/members
pub async fn add_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(gid): Path<String>,
    ApiJson(body): ApiJson<MemberList>,
) -> Result<Json<GroupInfo>, ApiError> {
    let group = state
        .groups
        .add_members(&auth, parse_id("gid", &gid)?, body)
        .await?;
    Ok(Json(GroupInfo::from(&group)))
}

/// DELETE /v1/groups/{gid}/members
pub async fn remove_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(gid): Path<String>,
    ApiJson(body): ApiJson<MemberList>,
) -> Result<Json<GroupInfo>, ApiError> {
    let group = state
        .groups
        .remove_members(&auth, parse_id("gid", &gid)?, body)
        .await?;
    Ok(Json(GroupInfo::from(&group)))
}
