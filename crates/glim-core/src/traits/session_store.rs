//! Session store trait for pluggable key/value backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Value marking a denylisted token identifier.
pub const REVOKED: &str = "true";
/// Value marking a tracked, still valid token identifier.
pub const TRACKED: &str = "false";

/// Short-lived key/value store with per-key TTL.
///
/// Used to track token identifiers: [`REVOKED`] denylists a token,
/// [`TRACKED`] records an issued one. Entries disappear once their TTL
/// elapses.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Store `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Mark `key` [`REVOKED`] for `ttl` in one atomic step. Returns
    /// `false` when the key was already revoked, so of two concurrent
    /// callers exactly one gets `true`.
    async fn revoke(&self, key: &str, ttl: Duration) -> AppResult<bool>;

    /// Delete a key.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Release backend resources.
    async fn close(&self) -> AppResult<()>;

    /// Whether `key` is present and marked [`REVOKED`].
    async fn is_revoked(&self, key: &str) -> AppResult<bool> {
        Ok(self.get(key).await?.as_deref() == Some(REVOKED))
    }
}
