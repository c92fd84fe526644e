//! Request DTOs.
//!
//! User and group bodies are the service inputs from `glim-service`,
//! re-exported here so handlers import every body from one place.

use serde::{Deserialize, Serialize};

pub use glim_service::{ChangePassword, CreateGroup, CreateUser, MemberList, UpdateGroup, UpdateUser};

/// POST /v1/login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST and DELETE /v1/login/refresh_token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}
