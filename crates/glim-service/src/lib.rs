//! # glim-service
//!
//! Business logic for Glim. Authorization predicates run in the HTTP
//! middleware; the services here enforce the field-level rules that need
//! the stored record (role flags, lock state, password contract,
//! Guacamole pairing) before writing to the catalog.

pub mod bootstrap;
pub mod context;
pub mod group;
pub mod user;

pub use bootstrap::ensure_bootstrap_accounts;
pub use context::RequestContext;
pub use group::{CreateGroup, GroupService, MemberList, UpdateGroup};
pub use user::{ChangePassword, CreateUser, UpdateUser, UserService};

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use chrono::Utc;
    use glim_auth::PasswordHasher;
    use glim_database::migration::run_migrations;
    use glim_database::{DatabasePool, GroupRepository, UserRepository};

    use crate::context::RequestContext;
    use crate::group::GroupService;
    use crate::user::UserService;

    /// User and group services over a fresh in-memory catalog.
    pub async fn service_pair() -> (UserService, GroupService) {
        let db = DatabasePool::connect_url("sqlite::memory:", 1, Duration::from_secs(5))
            .await
            .unwrap();
        run_migrations(&db).await.unwrap();
        let users = UserRepository::new(db.pool().clone());
        let groups = GroupRepository::new(db.pool().clone());
        (
            UserService::new(users.clone(), PasswordHasher::new()),
            GroupService::new(groups, users),
        )
    }

    pub fn context(uid: i64, manager: bool, readonly: bool) -> RequestContext {
        RequestContext {
            uid,
            manager,
            readonly,
            jti: "test".into(),
            request_time: Utc::now(),
        }
    }
}
