//! REST API listener and token lifetime configuration.

use serde::{Deserialize, Serialize};

/// HTTP API listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address.
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default)]
    pub secret: String,
    /// Access token TTL in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: u64,
    /// Refresh token TTL in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: u64,
    /// Days a refresh chain may live without a fresh login.
    #[serde(default = "default_max_days_relogin")]
    pub max_days_relogin: u64,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Graceful shutdown timeout in seconds, shared by both listeners.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
    /// Allowed CORS origins (`["*"]` allows any).
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            secret: String::new(),
            access_token_expiry: default_access_token_expiry(),
            refresh_token_expiry: default_refresh_token_expiry(),
            max_days_relogin: default_max_days_relogin(),
            request_timeout_seconds: default_request_timeout(),
            shutdown_grace_seconds: default_shutdown_grace(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    1323
}

fn default_access_token_expiry() -> u64 {
    3600
}

fn default_refresh_token_expiry() -> u64 {
    259_200
}

fn default_max_days_relogin() -> u64 {
    7
}

fn default_request_timeout() -> u64 {
    30
}

fn default_shutdown_grace() -> u64 {
    10
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}
