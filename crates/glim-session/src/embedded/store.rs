//! Session store kept in a sqlite file under the configured directory.
//!
//! Each row carries its absolute expiry in unix milliseconds. Reads ignore
//! expired rows; a background task deletes them.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use glim_core::error::{AppError, ErrorKind};
use glim_core::result::AppResult;
use glim_core::traits::session_store::{REVOKED, SessionStore};

/// File created inside the store directory.
const DB_FILE: &str = "sessions.db";

/// How often expired rows are deleted.
const PURGE_INTERVAL: Duration = Duration::from_secs(300);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sessions (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    expires_at INTEGER NOT NULL
)";

const EXPIRY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions (expires_at)";

const UPSERT: &str = "INSERT INTO sessions (key, value, expires_at) VALUES (?1, ?2, ?3)
    ON CONFLICT (key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at";

// The update only fires when the live row is not already revoked.
const REVOKE: &str = "INSERT INTO sessions (key, value, expires_at) VALUES (?1, ?2, ?3)
    ON CONFLICT (key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
    WHERE sessions.value <> excluded.value OR sessions.expires_at <= ?4";

/// Sqlite-backed session store that survives restarts.
#[derive(Debug, Clone)]
pub struct EmbeddedSessionStore {
    pool: SqlitePool,
    purger: Arc<JoinHandle<()>>,
}

impl EmbeddedSessionStore {
    /// Open (or create) the store in directory `location`.
    pub async fn open(location: impl AsRef<Path>) -> AppResult<Self> {
        let location = location.as_ref();
        tokio::fs::create_dir_all(location).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Session,
                format!(
                    "Failed to create session store directory {}: {e}",
                    location.display()
                ),
                e,
            )
        })?;

        let options = SqliteConnectOptions::new()
            .filename(location.join(DB_FILE))
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(map_err("Failed to open session store"))?;

        for statement in [SCHEMA, EXPIRY_INDEX] {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(map_err("Failed to prepare session store"))?;
        }

        let purged = purge_expired(&pool)
            .await
            .map_err(map_err("Failed to purge session store"))?;
        info!(location = %location.display(), purged, "Opened embedded session store");

        let purger = Arc::new(spawn_purger(pool.clone()));
        Ok(Self { pool, purger })
    }
}

#[async_trait]
impl SessionStore for EmbeddedSessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .bind(expiry(ttl))
            .execute(&self.pool)
            .await
            .map_err(map_err("Failed to write session entry"))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT value FROM sessions WHERE key = ?1 AND expires_at > ?2",
        )
        .bind(key)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err("Failed to read session entry"))
    }

    async fn revoke(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let result = sqlx::query(REVOKE)
            .bind(key)
            .bind(REVOKED)
            .bind(expiry(ttl))
            .bind(now_millis())
            .execute(&self.pool)
            .await
            .map_err(map_err("Failed to revoke session entry"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_err("Failed to delete session entry"))?;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(map_err("Session store health check failed"))
    }

    async fn close(&self) -> AppResult<()> {
        self.purger.abort();
        self.pool.close().await;
        debug!("Closed embedded session store");
        Ok(())
    }
}

fn spawn_purger(pool: SqlitePool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            match purge_expired(&pool).await {
                Ok(0) => {}
                Ok(count) => debug!(count, "Purged expired session entries"),
                Err(sqlx::Error::PoolClosed) => break,
                Err(e) => warn!(error = %e, "Failed to purge expired session entries"),
            }
        }
    })
}

async fn purge_expired(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
        .bind(now_millis())
        .execute(pool)
        .await
        .map(|result| result.rows_affected())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn expiry(ttl: Duration) -> i64 {
    let ttl = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1);
    now_millis().saturating_add(ttl)
}

fn map_err(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Session, format!("{context}: {e}"), e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glim_core::traits::session_store::TRACKED;

    #[tokio::test]
    async fn test_revocations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = EmbeddedSessionStore::open(dir.path()).await.unwrap();
        store.set("jti-1", TRACKED, Duration::from_secs(60)).await.unwrap();
        assert!(store.revoke("jti-1", Duration::from_secs(60)).await.unwrap());
        store.set("ajti-1", REVOKED, Duration::from_secs(60)).await.unwrap();
        store.close().await.unwrap();

        let reopened = EmbeddedSessionStore::open(dir.path()).await.unwrap();
        assert!(reopened.is_revoked("jti-1").await.unwrap());
        assert!(reopened.is_revoked("ajti-1").await.unwrap());
        assert!(!reopened.revoke("jti-1", Duration::from_secs(60)).await.unwrap());
        reopened.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("nested").join("sessions");

        let store = EmbeddedSessionStore::open(&location).await.unwrap();
        assert!(store.health_check().await.unwrap());
        assert!(location.join(DB_FILE).exists());
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entries_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddedSessionStore::open(dir.path()).await.unwrap();

        store.set("short", REVOKED, Duration::from_millis(50)).await.unwrap();
        store.set("long", REVOKED, Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(store.get("short").await.unwrap(), None);
        assert!(store.is_revoked("long").await.unwrap());
        // An expired revocation can be taken again.
        assert!(store.revoke("short", Duration::from_secs(60)).await.unwrap());
        store.close().await.unwrap();

        let reopened = EmbeddedSessionStore::open(dir.path()).await.unwrap();
        assert!(reopened.is_revoked("short").await.unwrap());
        reopened.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_overwrite_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddedSessionStore::open(dir.path()).await.unwrap();

        store.set("jti", TRACKED, Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("jti").await.unwrap().as_deref(), Some(TRACKED));
        store.set("jti", REVOKED, Duration::from_secs(60)).await.unwrap();
        assert!(store.is_revoked("jti").await.unwrap());
        store.delete("jti").await.unwrap();
        assert_eq!(store.get("jti").await.unwrap(), None);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_revoke_has_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddedSessionStore::open(dir.path()).await.unwrap();

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.revoke("jti", Duration::from_secs(60)).await.unwrap() })
            })
            .collect();
        let mut winners = 0;
        for attempt in attempts {
            if attempt.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        store.close().await.unwrap();
    }
}
