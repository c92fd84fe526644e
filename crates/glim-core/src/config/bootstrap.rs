//! Initial account provisioning configuration.

use serde::{Deserialize, Serialize};

/// Accounts created on first start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Password for the `admin` manager account.
    #[serde(default)]
    pub initial_admin_passwd: Option<String>,
    /// Password for the `search` read-only account.
    #[serde(default)]
    pub initial_search_passwd: Option<String>,
    /// Comma-separated plain usernames to create.
    #[serde(default)]
    pub initial_users: Option<String>,
    /// Password shared by all `initial_users`.
    #[serde(default)]
    pub initial_users_password: Option<String>,
}

impl BootstrapConfig {
    /// The parsed `initial_users` list, trimmed and without empty items.
    pub fn initial_usernames(&self) -> Vec<String> {
        self.initial_users
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_usernames() {
        let config = BootstrapConfig {
            initial_users: Some(" saul, kim,,mike ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.initial_usernames(), vec!["saul", "kim", "mike"]);
        assert!(BootstrapConfig::default().initial_usernames().is_empty());
    }
}
