//! LDAP listener configuration and directory domain handling.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// LDAP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Bind address.
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory suffix, either `dc=example,dc=org` or `example.org`.
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Serve plain LDAP instead of LDAPS.
    #[serde(default)]
    pub no_tls: bool,
    /// Maximum entries returned by a single search (0 = unlimited).
    #[serde(default = "default_size_limit")]
    pub size_limit: u32,
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            domain: default_domain(),
            no_tls: false,
            size_limit: default_size_limit(),
        }
    }
}

/// Normalize a directory domain to its lowercase DC form.
///
/// `example.org` and `DC=Example, dc=org` both become `dc=example,dc=org`.
pub fn normalize_domain(domain: &str) -> AppResult<String> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(AppError::configuration("ldap domain must not be empty"));
    }

    let labels: Vec<String> = if domain.contains('=') {
        domain
            .split(',')
            .map(|rdn| {
                let (attr, value) = rdn.split_once('=').ok_or_else(|| {
                    AppError::configuration(format!("invalid ldap domain component '{rdn}'"))
                })?;
                if !attr.trim().eq_ignore_ascii_case("dc") {
                    return Err(AppError::configuration(format!(
                        "ldap domain must only contain dc components, found '{rdn}'"
                    )));
                }
                Ok(value.trim().to_ascii_lowercase())
            })
            .collect::<AppResult<_>>()?
    } else {
        domain
            .split('.')
            .map(|label| label.trim().to_ascii_lowercase())
            .collect()
    };

    if labels.iter().any(|label| label.is_empty()) {
        return Err(AppError::configuration(format!(
            "invalid ldap domain '{domain}'"
        )));
    }

    Ok(labels
        .iter()
        .map(|label| format!("dc={label}"))
        .collect::<Vec<_>>()
        .join(","))
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    1636
}

fn default_domain() -> String {
    "dc=example,dc=org".to_string()
}

fn default_size_limit() -> u32 {
    500
}
