//! Catalog-backed credential checks shared by the HTTP login and LDAP bind.

use tracing::debug;

use glim_core::result::AppResult;
use glim_database::UserRepository;
use glim_entity::User;

use super::hasher::PasswordHasher;

/// Outcome of a credential check.
#[derive(Debug, Clone)]
pub enum Verification {
    /// Password matched an unlocked account.
    Valid(Box<User>),
    /// No such username.
    UnknownUser,
    /// Password did not match (or was empty).
    WrongPassword,
    /// The account is locked.
    Locked,
}

/// Checks a username and clear password against the catalog.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    users: UserRepository,
    hasher: PasswordHasher,
}

impl CredentialVerifier {
    /// Creates a verifier over the user repository.
    pub fn new(users: UserRepository, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    /// Looks the user up and compares the password hash.
    pub async fn verify_password(&self, username: &str, password: &str) -> AppResult<Verification> {
        let Some(user) = self.users.find_by_username(username).await? else {
            debug!(username, "Credential check for unknown user");
            return Ok(Verification::UnknownUser);
        };

        if user.locked || user.password_hash.is_empty() {
            return Ok(Verification::Locked);
        }
        if password.is_empty() {
            return Ok(Verification::WrongPassword);
        }

        if self.hasher.verify(password, &user.password_hash).await? {
            Ok(Verification::Valid(Box::new(user)))
        } else {
            Ok(Verification::WrongPassword)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use glim_database::DatabasePool;
    use glim_database::migration::run_migrations;
    use glim_entity::NewUser;

    async fn verifier_with(username: &str, password: &str) -> CredentialVerifier {
        let db = DatabasePool::connect_url("sqlite::memory:", 1, Duration::from_secs(5))
            .await
            .unwrap();
        run_migrations(&db).await.unwrap();
        let users = UserRepository::new(db.pool().clone());
        let hasher = PasswordHasher::new();
        let password_hash = if password.is_empty() {
            String::new()
        } else {
            hasher.hash_password(password).unwrap()
        };
        users
            .create(&NewUser {
                username: username.into(),
                firstname: "Saul".into(),
                lastname: "Goodman".into(),
                email: "saul@example.org".into(),
                password_hash,
                created_by: "test".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        CredentialVerifier::new(users, hasher)
    }

    #[tokio::test]
    async fn test_valid_password() {
        let verifier = verifier_with("saul", "test").await;
        match verifier.verify_password("saul", "test").await.unwrap() {
            Verification::Valid(user) => assert_eq!(user.username, "saul"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_and_unknown() {
        let verifier = verifier_with("saul", "test").await;
        assert!(matches!(
            verifier.verify_password("saul", "nope").await.unwrap(),
            Verification::WrongPassword
        ));
        assert!(matches!(
            verifier.verify_password("saul", "").await.unwrap(),
            Verification::WrongPassword
        ));
        assert!(matches!(
            verifier.verify_password("kim", "test").await.unwrap(),
            Verification::UnknownUser
        ));
    }

    #[tokio::test]
    async fn test_locked_account() {
        let verifier = verifier_with("kim", "").await;
        assert!(matches!(
            verifier.verify_password("kim", "anything").await.unwrap(),
            Verification::Locked
        ));
    }
}
