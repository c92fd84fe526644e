//! Session store configuration.

use serde::{Deserialize, Serialize};

/// Session (denylist) store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory of the persistent embedded store. Without it, and without
    /// redis, entries live in process memory only.
    #[serde(default)]
    pub badgerdb_store: Option<String>,
    /// Redis server settings; selects the remote store when present.
    #[serde(default)]
    pub redis: Option<RedisConfig>,
}

/// Redis server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Server host name.
    pub host: String,
    /// Server port.
    #[serde(default = "default_redis_port")]
    pub port: u16,
    /// Optional AUTH password.
    #[serde(default)]
    pub password: Option<String>,
    /// Logical database index.
    #[serde(default)]
    pub db_index: u32,
    /// Key prefix for all Glim keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl SessionConfig {
    /// Provider name: `"redis"`, `"embedded"` or `"memory"`.
    pub fn provider(&self) -> &'static str {
        if self.redis.is_some() {
            "redis"
        } else if self.badgerdb_store.is_some() {
            "embedded"
        } else {
            "memory"
        }
    }
}

impl RedisConfig {
    /// Settings for `host` with the default port, database 0 and prefix.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_redis_port(),
            password: None,
            db_index: 0,
            key_prefix: default_key_prefix(),
        }
    }

    /// Build a `redis://` connection URL.
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) if !password.is_empty() => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db_index
            ),
            _ => format!("redis://{}:{}/{}", self.host, self.port, self.db_index),
        }
    }
}

fn default_redis_port() -> u16 {
    6379
}

fn default_key_prefix() -> String {
    "glim:".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_url() {
        let mut redis = RedisConfig {
            host: "cache".to_string(),
            port: 6380,
            password: None,
            db_index: 2,
            key_prefix: default_key_prefix(),
        };
        assert_eq!(redis.url(), "redis://cache:6380/2");
        redis.password = Some("secret".to_string());
        assert_eq!(redis.url(), "redis://:secret@cache:6380/2");
    }

    #[test]
    fn test_provider_selection() {
        let mut config = SessionConfig::default();
        assert_eq!(config.provider(), "memory");
        config.badgerdb_store = Some("/var/lib/glim/sessions".to_string());
        assert_eq!(config.provider(), "embedded");
        config.redis = Some(RedisConfig {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db_index: 0,
            key_prefix: default_key_prefix(),
        });
        assert_eq!(config.provider(), "redis");
    }
}
