//! Repository implementations for the catalog entities.

pub mod group;
mod membership;
pub mod user;

pub use group::GroupRepository;
pub use user::UserRepository;

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use sqlx::AnyPool;

    use crate::connection::DatabasePool;
    use crate::migration::run_migrations;

    /// A fresh in-memory catalog with the schema applied.
    pub async fn memory_pool() -> AnyPool {
        let db = DatabasePool::connect_url("sqlite::memory:", 1, Duration::from_secs(5))
            .await
            .unwrap();
        run_migrations(&db).await.unwrap();
        db.pool().clone()
    }
}
