//! Embedded session store using the moka crate.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use tracing::debug;

use glim_core::result::AppResult;
use glim_core::traits::session_store::{REVOKED, SessionStore};

/// A stored value together with its own TTL.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process session store using moka.
///
/// The cache is unbounded: a denylist entry may only leave through its
/// own TTL, never through size-based eviction.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    /// The underlying moka cache.
    cache: Cache<String, Entry>,
}

impl MemorySessionStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        let cache = Cache::builder().expire_after(PerEntryTtl).build();
        Self { cache }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.cache
            .insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn revoke(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let result = self
            .cache
            .entry(key.to_string())
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if entry.value().value == REVOKED => Op::Nop,
                    _ => Op::Put(Entry {
                        value: REVOKED.to_string(),
                        ttl,
                    }),
                };
                std::future::ready(op)
            })
            .await;
        Ok(matches!(
            result,
            CompResult::Inserted(_) | CompResult::ReplacedWith(_)
        ))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn close(&self) -> AppResult<()> {
        debug!(entries = self.cache.entry_count(), "Closing embedded session store");
        self.cache.invalidate_all();
        Ok(())
    }
}
