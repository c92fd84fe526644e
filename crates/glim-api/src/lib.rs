//! # glim-api
//!
//! HTTP+JSON administration API for Glim built on Axum.
//!
//! Every route lives under `/v1`. Token validation and the role
//! predicates run as route layers; handlers delegate to the services in
//! `glim-service` and map [`AppError`](glim_core::AppError) into
//! `{"message": ...}` bodies.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::serve;
pub use state::AppState;
