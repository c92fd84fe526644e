//! User management: create, update, delete and the password contract.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::ValidateEmail;

use glim_auth::PasswordHasher;
use glim_core::error::AppError;
use glim_core::result::AppResult;
use glim_core::types::pagination::PageRequest;
use glim_database::UserRepository;
use glim_entity::{ADMIN_USERNAME, NewUser, SEARCH_USERNAME, User, UserChanges};

use crate::context::RequestContext;

/// Body of a user creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub ssh_public_key: String,
    #[serde(default)]
    pub jpeg_photo: String,
    #[serde(default)]
    pub manager: bool,
    #[serde(default)]
    pub readonly: bool,
    /// Clear password; absent or empty creates a locked account.
    #[serde(default)]
    pub password: Option<String>,
    /// Names of the groups to join.
    #[serde(default, rename = "memberOf")]
    pub member_of: Vec<String>,
}

/// Body of a user update request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub ssh_public_key: Option<String>,
    #[serde(default)]
    pub jpeg_photo: Option<String>,
    #[serde(default)]
    pub manager: Option<bool>,
    #[serde(default)]
    pub readonly: Option<bool>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default, rename = "memberOf")]
    pub member_of: Option<Vec<String>>,
    /// Replace the group set instead of adding to it.
    #[serde(default)]
    pub replace: bool,
}

/// Body of a password change request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangePassword {
    #[serde(default)]
    pub old_password: Option<String>,
    #[serde(default)]
    pub password: String,
}

/// User operations on top of the catalog.
#[derive(Debug, Clone)]
pub struct UserService {
    users: UserRepository,
    hasher: PasswordHasher,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(users: UserRepository, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &UserRepository {
        &self.users
    }

    /// Lists users with their memberships.
    pub async fn list(&self, page: &PageRequest) -> AppResult<Vec<User>> {
        self.users.list(page).await
    }

    /// Gets a single user.
    pub async fn get(&self, uid: i64) -> AppResult<User> {
        self.users
            .find_by_id(uid)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    /// Resolves a username to its uid.
    pub async fn uid_of(&self, username: &str) -> AppResult<i64> {
        self.users
            .find_by_username(username)
            .await?
            .map(|user| user.uid)
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    /// Creates a user. Only managers reach this through the API.
    pub async fn create(&self, ctx: &RequestContext, input: CreateUser) -> AppResult<User> {
        let actor = self.actor_name(ctx).await?;
        self.create_as(&actor, input).await
    }

    /// Creates a user recording `actor` as the creator.
    pub async fn create_as(&self, actor: &str, input: CreateUser) -> AppResult<User> {
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::validation("username is required"));
        }
        check_roles(input.manager, input.readonly)?;
        check_email(&input.email)?;
        check_photo(&input.jpeg_photo)?;

        let password_hash = match input.password.as_deref() {
            Some(password) if !password.is_empty() => self.hasher.hash(password).await?,
            _ => String::new(),
        };

        let user = self
            .users
            .create(&NewUser {
                username,
                firstname: input.firstname,
                lastname: input.lastname,
                email: input.email,
                ssh_public_key: input.ssh_public_key,
                jpeg_photo: input.jpeg_photo,
                manager: input.manager,
                readonly: input.readonly,
                password_hash,
                created_by: actor.to_string(),
                member_of: input.member_of,
            })
            .await?;

        info!(uid = user.uid, username = %user.username, created_by = %actor, "User created");
        Ok(user)
    }

    /// Updates a user.
    ///
    /// Plain users may only edit their own profile fields; attempts to
    /// change role flags, the lock flag, the username or group
    /// memberships are rejected.
    pub async fn update(&self, ctx: &RequestContext, uid: i64, input: UpdateUser) -> AppResult<User> {
        let current = self.get(uid).await?;

        if !ctx.manager {
            if !ctx.is_self(uid) || ctx.readonly {
                return Err(AppError::forbidden("user has no proper permissions"));
            }
            let escalates = changes(&input.manager, &current.manager)
                || changes(&input.readonly, &current.readonly)
                || changes(&input.locked, &current.locked)
                || changes(&input.username, &current.username)
                || input.member_of.is_some();
            if escalates {
                return Err(AppError::forbidden(
                    "only managers can change roles, lock state, username or group membership",
                ));
            }
        }

        if let Some(username) = &input.username {
            if username.trim().is_empty() {
                return Err(AppError::validation("username is required"));
            }
        }
        check_roles(
            input.manager.unwrap_or(current.manager),
            input.readonly.unwrap_or(current.readonly),
        )?;
        if let Some(email) = &input.email {
            check_email(email)?;
        }
        if let Some(photo) = &input.jpeg_photo {
            check_photo(photo)?;
        }

        let password_hash = match input.locked {
            Some(true) => Some(String::new()),
            Some(false) if current.password_hash.is_empty() => {
                return Err(AppError::validation(
                    "a password must be set to unlock the account",
                ));
            }
            _ => None,
        };

        let actor = self.actor_name(ctx).await?;
        let user = self
            .users
            .update(
                uid,
                &UserChanges {
                    username: input.username.map(|u| u.trim().to_string()),
                    firstname: input.firstname,
                    lastname: input.lastname,
                    email: input.email,
                    ssh_public_key: input.ssh_public_key,
                    jpeg_photo: input.jpeg_photo,
                    manager: input.manager,
                    readonly: input.readonly,
                    locked: input.locked,
                    password_hash,
                    member_of: input.member_of,
                    replace_groups: input.replace,
                    updated_by: actor.clone(),
                },
            )
            .await?;

        info!(uid, updated_by = %actor, "User updated");
        Ok(user)
    }

    /// Deletes a user and its memberships. The bootstrap accounts are
    /// permanent.
    pub async fn delete(&self, ctx: &RequestContext, uid: i64) -> AppResult<()> {
        let user = self.get(uid).await?;
        if user.username == ADMIN_USERNAME || user.username == SEARCH_USERNAME {
            return Err(AppError::forbidden("bootstrap accounts cannot be deleted"));
        }
        self.users.delete(uid).await?;
        info!(uid, username = %user.username, deleted_by = ctx.uid, "User deleted");
        Ok(())
    }

    /// Changes a password and unlocks the account.
    ///
    /// Managers may change any password without the old one. Anyone else
    /// may only change their own and must prove the old password. A
    /// verified old password equal to the new one is a no-op.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        uid: i64,
        input: ChangePassword,
    ) -> AppResult<()> {
        if input.password.is_empty() {
            return Err(AppError::forbidden("new password cannot be empty"));
        }
        if !ctx.manager && !ctx.is_self(uid) {
            return Err(AppError::forbidden("user has no proper permissions"));
        }

        let user = self.get(uid).await?;

        if !ctx.manager {
            let old = input
                .old_password
                .as_deref()
                .filter(|old| !old.is_empty())
                .ok_or_else(|| AppError::validation("old password is required"))?;
            if !self.hasher.verify(old, &user.password_hash).await? {
                return Err(AppError::unauthorized("wrong password"));
            }
            if old == input.password {
                return Ok(());
            }
        }

        let hash = self.hasher.hash(&input.password).await?;
        let actor = self.actor_name(ctx).await?;
        self.users.update_password(uid, &hash, &actor).await?;
        info!(uid, updated_by = %actor, "Password changed");
        Ok(())
    }

    /// Username recorded in audit columns for the caller.
    async fn actor_name(&self, ctx: &RequestContext) -> AppResult<String> {
        Ok(self
            .users
            .find_by_id(ctx.uid)
            .await?
            .map(|user| user.username)
            .unwrap_or_else(|| format!("uid:{}", ctx.uid)))
    }
}

fn changes<T: PartialEq>(requested: &Option<T>, stored: &T) -> bool {
    requested.as_ref().is_some_and(|value| value != stored)
}

fn check_roles(manager: bool, readonly: bool) -> AppResult<()> {
    if manager && readonly {
        return Err(AppError::validation(
            "manager and readonly are mutually exclusive",
        ));
    }
    Ok(())
}

fn check_email(email: &str) -> AppResult<()> {
    if !email.is_empty() && !email.validate_email() {
        return Err(AppError::validation("invalid email"));
    }
    Ok(())
}

fn check_photo(photo: &str) -> AppResult<()> {
    if !photo.is_empty() && STANDARD.decode(photo).is_err() {
        return Err(AppError::validation("jpeg_photo must be base64 encoded"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, service_pair};
    use glim_core::error::ErrorKind;

    fn saul() -> CreateUser {
        CreateUser {
            username: "saul".into(),
            firstname: "Saul".into(),
            lastname: "Goodman".into(),
            email: "saul@example.org".into(),
            password: Some("test".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let (users, _) = service_pair().await;
        let admin = context(1, true, false);

        let mut input = saul();
        input.email = "not-an-email".into();
        let err = users.create(&admin, input).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let mut input = saul();
        input.manager = true;
        input.readonly = true;
        let err = users.create(&admin, input).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let mut input = saul();
        input.jpeg_photo = "@@@".into();
        assert!(users.create(&admin, input).await.is_err());
    }

    #[tokio::test]
    async fn test_create_without_password_is_locked() {
        let (users, _) = service_pair().await;
        let mut input = saul();
        input.password = None;
        let user = users.create(&context(1, true, false), input).await.unwrap();
        assert!(user.locked);
    }

    #[tokio::test]
    async fn test_plain_user_cannot_escalate() {
        let (users, _) = service_pair().await;
        let saul = users.create_as("admin", saul()).await.unwrap();
        let own = context(saul.uid, false, false);

        let err = users
            .update(
                &own,
                saul.uid,
                UpdateUser {
                    manager: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let updated = users
            .update(
                &own,
                saul.uid,
                UpdateUser {
                    email: Some("jimmy@example.org".into()),
                    manager: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "jimmy@example.org");
    }

    #[tokio::test]
    async fn test_lock_clears_password() {
        let (users, _) = service_pair().await;
        let saul = users.create_as("admin", saul()).await.unwrap();
        let updated = users
            .update(
                &context(1, true, false),
                saul.uid,
                UpdateUser {
                    locked: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.locked);
        assert!(updated.password_hash.is_empty());
    }

    #[tokio::test]
    async fn test_password_contract() {
        let (users, _) = service_pair().await;
        let saul = users.create_as("admin", saul()).await.unwrap();
        let kim = users
            .create_as(
                "admin",
                CreateUser {
                    username: "kim".into(),
                    password: Some("test".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let own = context(saul.uid, false, false);

        let empty = ChangePassword {
            old_password: Some("test".into()),
            password: String::new(),
        };
        let err = users.change_password(&own, saul.uid, empty).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let other = ChangePassword {
            old_password: None,
            password: "x".into(),
        };
        let err = users.change_password(&own, kim.uid, other).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let missing_old = ChangePassword {
            old_password: None,
            password: "new".into(),
        };
        assert!(users.change_password(&own, saul.uid, missing_old).await.is_err());

        let same = ChangePassword {
            old_password: Some("test".into()),
            password: "test".into(),
        };
        users.change_password(&own, saul.uid, same).await.unwrap();

        let change = ChangePassword {
            old_password: Some("test".into()),
            password: "better".into(),
        };
        users.change_password(&own, saul.uid, change).await.unwrap();
        let stored = users.get(saul.uid).await.unwrap();
        assert!(PasswordHasher::new().verify_password("better", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_manager_password_reset_unlocks() {
        let (users, _) = service_pair().await;
        let mut input = saul();
        input.password = None;
        let saul = users.create_as("admin", input).await.unwrap();

        let reset = ChangePassword {
            old_password: None,
            password: "fresh".into(),
        };
        users
            .change_password(&context(1, true, false), saul.uid, reset)
            .await
            .unwrap();
        assert!(!users.get(saul.uid).await.unwrap().locked);
    }
}
