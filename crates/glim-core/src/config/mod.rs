//! Application configuration schemas.
//!
//! The configuration is merged from an optional TOML file and `GLIM__`
//! environment variables via the `config` crate. Command-line flags are
//! applied on top by the binary before [`AppConfig::validate`] runs.

pub mod api;
pub mod bootstrap;
pub mod database;
pub mod ldap;
pub mod logging;
pub mod session;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use self::api::ApiConfig;
use self::bootstrap::BootstrapConfig;
use self::database::DatabaseConfig;
use self::ldap::LdapConfig;
use self::logging::LoggingConfig;
use self::session::SessionConfig;

use crate::error::AppError;
use crate::result::AppResult;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// REST API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// LDAP listener settings.
    #[serde(default)]
    pub ldap: LdapConfig,
    /// Certificate material shared by both listeners.
    #[serde(default)]
    pub tls: TlsConfig,
    /// Catalog database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session store settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Initial accounts.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Whether Apache Guacamole attributes are exposed.
    #[serde(default)]
    pub guacamole: bool,
}

/// PEM certificate and key paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Path to the PEM certificate chain.
    #[serde(default)]
    pub cert: Option<PathBuf>,
    /// Path to the PEM private key.
    #[serde(default)]
    pub key: Option<PathBuf>,
}

impl TlsConfig {
    /// Both certificate and key are configured.
    pub fn is_enabled(&self) -> bool {
        self.cert.is_some() && self.key.is_some()
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file and the environment.
    ///
    /// Environment variables use the `GLIM__` prefix with `__` separating
    /// sections, e.g. `GLIM__API__SECRET` or `GLIM__LDAP__PORT`.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("GLIM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Check cross-field constraints and normalize the LDAP domain.
    pub fn validate(&mut self) -> AppResult<()> {
        if self.api.secret.trim().is_empty() {
            return Err(AppError::configuration("api secret is required"));
        }
        if self.api.port == 0 {
            return Err(AppError::configuration("api port must be between 1 and 65535"));
        }
        if self.ldap.port == 0 {
            return Err(AppError::configuration("ldap port must be between 1 and 65535"));
        }
        if self.api.port == self.ldap.port {
            return Err(AppError::configuration(
                "ldap and rest server ports must be different",
            ));
        }
        if self.api.access_token_expiry == 0 || self.api.refresh_token_expiry == 0 {
            return Err(AppError::configuration("token expiry must be positive"));
        }
        if self.tls.cert.is_some() != self.tls.key.is_some() {
            return Err(AppError::configuration(
                "tlscert and tlskey must be provided together",
            ));
        }
        if !self.ldap.no_tls && !self.tls.is_enabled() {
            return Err(AppError::configuration(
                "ldaps requires tlscert and tlskey, or set ldap-no-tls",
            ));
        }
        if self.database.sqlite_db.is_some() && self.database.postgres.is_some() {
            return Err(AppError::configuration(
                "choose either a sqlite or a postgres catalog, not both",
            ));
        }
        if self.session.badgerdb_store.is_some() && self.session.redis.is_some() {
            return Err(AppError::configuration(
                "choose either the embedded or the redis session store, not both",
            ));
        }

        self.ldap.domain = ldap::normalize_domain(&self.ldap.domain)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.api.secret = "secret".to_string();
        config.ldap.no_tls = true;
        config
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.port, 1323);
        assert_eq!(config.ldap.port, 1636);
        assert_eq!(config.api.access_token_expiry, 3600);
        assert_eq!(config.api.refresh_token_expiry, 259_200);
        assert_eq!(config.api.max_days_relogin, 7);
        assert_eq!(config.ldap.size_limit, 500);
        assert!(!config.guacamole);
    }

    #[test]
    fn test_validate_requires_secret() {
        let mut config = valid();
        config.api.secret.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_equal_ports() {
        let mut config = valid();
        config.ldap.port = config.api.port;
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("must be different"));
    }

    #[test]
    fn test_validate_requires_tls_material_for_ldaps() {
        let mut config = valid();
        config.ldap.no_tls = false;
        assert!(config.validate().is_err());

        config.tls.cert = Some(PathBuf::from("cert.pem"));
        assert!(config.validate().is_err());

        config.tls.key = Some(PathBuf::from("key.pem"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_normalizes_domain() {
        let mut config = valid();
        config.ldap.domain = "Example.ORG".to_string();
        config.validate().unwrap();
        assert_eq!(config.ldap.domain, "dc=example,dc=org");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"guacamole = true\n[api]\nsecret = \"s3cr3t\"\nport = 8443\n[ldap]\nsize_limit = 10\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api.secret, "s3cr3t");
        assert_eq!(config.api.port, 8443);
        assert_eq!(config.ldap.size_limit, 10);
        assert!(config.guacamole);
    }
}
