//! Redis session store implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use glim_core::error::{AppError, ErrorKind};
use glim_core::result::AppResult;
use glim_core::traits::session_store::{REVOKED, SessionStore};

use super::client::RedisClient;

/// Redis-backed session store.
#[derive(Debug, Clone)]
pub struct RedisSessionStore {
    /// Redis client.
    client: RedisClient,
}

impl RedisSessionStore {
    /// Create a new Redis session store.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Session, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let _: () = redis::cmd("SET")
            .arg(&full_key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: Option<String> = conn.get(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn revoke(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        // SET .. GET needs Redis 6.2.
        let previous: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(REVOKED)
            .arg("PX")
            .arg(millis)
            .arg("GET")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(previous.as_deref() != Some(REVOKED))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn.del(&full_key).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }

    async fn close(&self) -> AppResult<()> {
        debug!("Releasing Redis session store connection");
        Ok(())
    }
}
