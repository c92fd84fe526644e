//! First-start provisioning of the built-in accounts.

use tracing::{info, warn};

use glim_core::config::bootstrap::BootstrapConfig;
use glim_core::error::AppError;
use glim_core::result::AppResult;
use glim_entity::{ADMIN_USERNAME, SEARCH_USERNAME};

use crate::user::{CreateUser, UserService};

const BOOTSTRAP_ACTOR: &str = "system";

/// Ensures the `admin` manager and `search` read-only accounts exist and
/// creates any configured initial users. Existing accounts are left as
/// they are.
pub async fn ensure_bootstrap_accounts(users: &UserService, config: &BootstrapConfig) -> AppResult<()> {
    ensure_account(
        users,
        CreateUser {
            username: ADMIN_USERNAME.to_string(),
            firstname: "LDAP".to_string(),
            lastname: "administrator".to_string(),
            manager: true,
            ..Default::default()
        },
        config.initial_admin_passwd.as_deref(),
        "initial-admin-passwd",
    )
    .await?;

    ensure_account(
        users,
        CreateUser {
            username: SEARCH_USERNAME.to_string(),
            firstname: "Read-Only".to_string(),
            lastname: "Account".to_string(),
            readonly: true,
            ..Default::default()
        },
        config.initial_search_passwd.as_deref(),
        "initial-search-passwd",
    )
    .await?;

    let initial = config.initial_usernames();
    if initial.is_empty() {
        return Ok(());
    }
    let password = config
        .initial_users_password
        .as_deref()
        .filter(|p| !p.is_empty());
    if password.is_none() {
        warn!("initial-users-password is not set, initial users will be locked");
    }
    for username in initial {
        if users.repository().find_by_username(&username).await?.is_some() {
            continue;
        }
        users
            .create_as(
                BOOTSTRAP_ACTOR,
                CreateUser {
                    username,
                    password: password.map(str::to_string),
                    ..Default::default()
                },
            )
            .await?;
    }
    Ok(())
}

async fn ensure_account(
    users: &UserService,
    mut account: CreateUser,
    password: Option<&str>,
    option: &str,
) -> AppResult<()> {
    if users
        .repository()
        .find_by_username(&account.username)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let password = password.filter(|p| !p.is_empty()).ok_or_else(|| {
        AppError::configuration(format!(
            "{} account does not exist and {option} was not provided",
            account.username
        ))
    })?;
    account.password = Some(password.to_string());

    let user = users.create_as(BOOTSTRAP_ACTOR, account).await?;
    info!(uid = user.uid, username = %user.username, "Created bootstrap account");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::service_pair;
    use glim_core::error::ErrorKind;

    fn config() -> BootstrapConfig {
        BootstrapConfig {
            initial_admin_passwd: Some("admin-pass".into()),
            initial_search_passwd: Some("search-pass".into()),
            initial_users: Some("saul,kim,mike".into()),
            initial_users_password: Some("test".into()),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_creates_accounts_in_order() {
        let (users, _) = service_pair().await;
        ensure_bootstrap_accounts(&users, &config()).await.unwrap();

        let admin = users.get(1).await.unwrap();
        assert_eq!(admin.username, "admin");
        assert!(admin.manager);
        let search = users.get(2).await.unwrap();
        assert!(search.readonly);
        assert_eq!(users.uid_of("saul").await.unwrap(), 3);
        assert!(!users.get(3).await.unwrap().locked);
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (users, _) = service_pair().await;
        ensure_bootstrap_accounts(&users, &config()).await.unwrap();

        let mut again = config();
        again.initial_admin_passwd = None;
        ensure_bootstrap_accounts(&users, &again).await.unwrap();
        assert_eq!(users.repository().count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_missing_admin_password_fails() {
        let (users, _) = service_pair().await;
        let err = ensure_bootstrap_accounts(&users, &BootstrapConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
