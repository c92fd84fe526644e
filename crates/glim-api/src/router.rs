//! Route definitions for the Glim HTTP API.
//!
//! All routes are mounted under `/v1`. Protected routes pass through
//! [`require_auth`](crate::middleware::auth::require_auth) first and then
//! through the role predicate attached to their method.

use std::time::Duration;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{auth, cors, logging, rbac};
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(user_routes(&state))
        .merge(group_routes())
        .route_layer(from_fn_with_state(state.clone(), auth::require_auth));

    let api = Router::new()
        .merge(public_routes())
        .merge(protected);

    let timeout = Duration::from_secs(state.config.api.request_timeout_seconds.max(1));
    let cors = cors::build_cors_layer(&state.config.api.allowed_origins);

    Router::new()
        .nest("/v1", api)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(from_fn(logging::request_logging))
        .with_state(state)
}

/// Login, token rotation and probes (no auth required)
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route(
            "/login/refresh_token",
            post(handlers::auth::refresh).delete(handlers::auth::logout),
        )
        .route("/guacamole", get(handlers::health::guacamole))
        .route("/healthz", get(handlers::health::healthz))
        .route("/readyz", get(handlers::health::readyz))
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let manager = || from_fn(rbac::require_manager);

    Router::new()
        .route(
            "/users",
            get(handlers::user::list_users)
                .route_layer(from_fn(rbac::require_reader_role))
                .merge(post(handlers::user::create_user).route_layer(manager())),
        )
        .route(
            "/users/{uid}",
            get(handlers::user::get_user)
                .route_layer(from_fn(rbac::require_reader))
                .merge(
                    put(handlers::user::update_user)
                        .route_layer(from_fn(rbac::require_updater)),
                )
                .merge(delete(handlers::user::delete_user).route_layer(manager())),
        )
        .route(
            "/users/{uid}/uid",
            get(handlers::user::lookup_uid).route_layer(from_fn_with_state(
                state.clone(),
                rbac::require_reader_by_username,
            )),
        )
        .route("/users/{uid}/passwd", post(handlers::user::change_password))
}

fn group_routes() -> Router<AppState> {
    let manager = || from_fn(rbac::require_manager);
    let reader = || from_fn(rbac::require_reader_role);

    Router::new()
        .route(
            "/groups",
            get(handlers::group::list_groups)
                .route_layer(reader())
                .merge(post(handlers::group::create_group).route_layer(manager())),
        )
        .route(
            "/groups/{gid}",
            get(handlers::group::get_group)
                .route_layer(reader())
                .merge(
                    put(handlers::group::update_group)
                        .delete(handlers::group::delete_group)
                        .route_layer(manager()),
                ),
        )
        .route(
            "/groups/{gid}/gid",
            get(handlers::group::lookup_gid).route_layer(reader()),
        )
        .route(
            "/groups/{gid}/members",
            post(handlers::group::add_members)
                .delete(handlers::group::remove_members)
                .route_layer(manager()),
        )
}
