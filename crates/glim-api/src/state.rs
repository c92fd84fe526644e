//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use glim_auth::{CredentialVerifier, PasswordHasher, TokenService};
use glim_core::config::AppConfig;
use glim_core::traits::session_store::SessionStore;
use glim_database::{DatabasePool, GroupRepository, UserRepository};
use glim_service::{GroupService, UserService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Catalog connection pool
    pub db: DatabasePool,
    /// Session store (embedded or Redis)
    pub sessions: Arc<dyn SessionStore>,

    // ── Auth ─────────────────────────────────────────────────
    /// Token issuance and validation
    pub tokens: Arc<TokenService>,
    /// Username/password checks
    pub credentials: Arc<CredentialVerifier>,

    // ── Services ─────────────────────────────────────────────
    /// User management
    pub users: Arc<UserService>,
    /// Group management
    pub groups: Arc<GroupService>,
}

impl AppState {
    /// Wires repositories and services over the opened stores.
    pub fn new(config: Arc<AppConfig>, db: DatabasePool, sessions: Arc<dyn SessionStore>) -> Self {
        let user_repo = UserRepository::new(db.pool().clone());
        let group_repo = GroupRepository::new(db.pool().clone());
        let hasher = PasswordHasher::new();

        let tokens = TokenService::new(&config.api, sessions.clone(), user_repo.clone());
        let credentials = CredentialVerifier::new(user_repo.clone(), hasher.clone());

        Self {
            db,
            sessions,
            tokens: Arc::new(tokens),
            credentials: Arc::new(credentials),
            users: Arc::new(UserService::new(user_repo.clone(), hasher)),
            groups: Arc::new(GroupService::new(group_repo, user_repo)),
            config,
        }
    }
}
