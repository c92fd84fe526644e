//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::group::GroupRef;

/// Username of the bootstrap manager account.
pub const ADMIN_USERNAME: &str = "admin";
/// Username of the bootstrap read-only account.
pub const SEARCH_USERNAME: &str = "search";

/// A user in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable numeric identifier, assigned at creation.
    pub uid: i64,
    /// Stable UUID, exposed as the LDAP `entryUUID`.
    pub uuid: Uuid,
    /// Unique, case-sensitive login name.
    pub username: String,
    /// Given name.
    pub firstname: String,
    /// Surname.
    pub lastname: String,
    /// Email address, empty when unset.
    pub email: String,
    /// SSH public key, empty when unset.
    pub ssh_public_key: String,
    /// Base64 JPEG photo, empty when unset.
    pub jpeg_photo: String,
    /// Manager role.
    pub manager: bool,
    /// Read-only role.
    pub readonly: bool,
    /// Whether authentication is refused.
    pub locked: bool,
    /// Argon2 password hash, empty for locked accounts.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Username of the creator.
    pub created_by: String,
    /// Username of the last modifier.
    pub updated_by: String,
    /// Groups the user belongs to.
    #[serde(default)]
    pub member_of: Vec<GroupRef>,
}

impl User {
    /// Given name and surname joined by a space, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
            .trim()
            .to_string()
    }

    /// The user can authenticate with a password.
    pub fn can_login(&self) -> bool {
        !self.locked && !self.password_hash.is_empty()
    }

    /// Whether this is the bootstrap manager account.
    pub fn is_bootstrap_admin(&self) -> bool {
        self.username == ADMIN_USERNAME
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    /// Desired username.
    pub username: String,
    /// Given name.
    pub firstname: String,
    /// Surname.
    pub lastname: String,
    /// Email address.
    pub email: String,
    /// SSH public key.
    pub ssh_public_key: String,
    /// Base64 JPEG photo.
    pub jpeg_photo: String,
    /// Manager role.
    pub manager: bool,
    /// Read-only role.
    pub readonly: bool,
    /// Pre-hashed password; empty creates a locked account.
    pub password_hash: String,
    /// Creating user's username.
    pub created_by: String,
    /// Names of the groups to join.
    pub member_of: Vec<String>,
}

/// Changes to apply to an existing user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserChanges {
    /// New username.
    pub username: Option<String>,
    /// New given name.
    pub firstname: Option<String>,
    /// New surname.
    pub lastname: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New SSH public key.
    pub ssh_public_key: Option<String>,
    /// New base64 JPEG photo.
    pub jpeg_photo: Option<String>,
    /// New manager flag.
    pub manager: Option<bool>,
    /// New read-only flag.
    pub readonly: Option<bool>,
    /// New locked flag.
    pub locked: Option<bool>,
    /// New password hash.
    pub password_hash: Option<String>,
    /// Group names; applied as a replacement or an addition per `replace_groups`.
    pub member_of: Option<Vec<String>>,
    /// Replace the group set instead of adding to it.
    pub replace_groups: bool,
    /// Modifying user's username.
    pub updated_by: String,
}
