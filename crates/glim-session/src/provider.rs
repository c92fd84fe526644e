//! Session store manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use glim_core::config::session::SessionConfig;
use glim_core::error::AppError;
use glim_core::result::AppResult;
use glim_core::traits::session_store::SessionStore;

/// Session store manager that wraps the configured provider.
#[derive(Debug, Clone)]
pub struct SessionStoreManager {
    /// The inner store.
    inner: Arc<dyn SessionStore>,
}

impl SessionStoreManager {
    /// Create a new session store manager from configuration.
    pub async fn new(config: &SessionConfig) -> AppResult<Self> {
        let inner: Arc<dyn SessionStore> = match config.provider() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                let redis = config
                    .redis
                    .as_ref()
                    .ok_or_else(|| AppError::configuration("Redis settings are missing"))?;
                info!("Initializing Redis session store");
                let client = crate::redis::RedisClient::connect(redis).await?;
                Arc::new(crate::redis::RedisSessionStore::new(client))
            }
            #[cfg(feature = "embedded")]
            "embedded" => {
                let location = config
                    .badgerdb_store
                    .as_deref()
                    .ok_or_else(|| AppError::configuration("Embedded store location is missing"))?;
                info!(location, "Initializing embedded session store");
                Arc::new(crate::embedded::EmbeddedSessionStore::open(location).await?)
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory session store");
                Arc::new(crate::memory::MemorySessionStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown session store provider: '{other}'. Supported: memory, embedded, redis"
                )));
            }
        };

        Ok(Self { inner })
    }
}

#[async_trait]
impl SessionStore for SessionStoreManager {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn revoke(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.revoke(key, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn close(&self) -> AppResult<()> {
        self.inner.close().await
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use glim_core::traits::session_store::{REVOKED, TRACKED};

    #[tokio::test]
    async fn test_manager_defaults_to_memory() {
        let manager = SessionStoreManager::new(&SessionConfig::default())
            .await
            .unwrap();
        manager
            .set("jti-1", TRACKED, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(!manager.is_revoked("jti-1").await.unwrap());

        manager
            .set("jti-1", REVOKED, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(manager.is_revoked("jti-1").await.unwrap());
        assert!(!manager.is_revoked("unknown").await.unwrap());
        assert!(manager.health_check().await.unwrap());
    }

    #[cfg(feature = "embedded")]
    #[tokio::test]
    async fn test_manager_opens_embedded_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            badgerdb_store: Some(dir.path().display().to_string()),
            ..Default::default()
        };

        let manager = SessionStoreManager::new(&config).await.unwrap();
        assert!(manager.revoke("jti-1", Duration::from_secs(60)).await.unwrap());
        manager.close().await.unwrap();

        let manager = SessionStoreManager::new(&config).await.unwrap();
        assert!(manager.is_revoked("jti-1").await.unwrap());
        manager.close().await.unwrap();
    }
}
