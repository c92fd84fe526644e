//! Group entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::User;

/// A group in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Stable numeric identifier.
    pub gid: i64,
    /// Stable UUID, exposed as the LDAP `entryUUID`.
    pub uuid: Uuid,
    /// Unique, case-sensitive group name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Apache Guacamole protocol, set together with the parameters.
    pub guac_config_protocol: Option<String>,
    /// Apache Guacamole parameters, set together with the protocol.
    pub guac_config_parameters: Option<String>,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
    /// When the group was last updated.
    pub updated_at: DateTime<Utc>,
    /// Username of the creator.
    pub created_by: String,
    /// Username of the last modifier.
    pub updated_by: String,
    /// Member users, without their own group lists.
    #[serde(default)]
    pub members: Vec<User>,
}

impl Group {
    /// A lightweight reference to this group.
    pub fn to_ref(&self) -> GroupRef {
        GroupRef {
            gid: self.gid,
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Group reference embedded in a user's `memberOf` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    /// Group identifier.
    pub gid: i64,
    /// Group name.
    pub name: String,
    /// Group description.
    pub description: String,
}

/// Data required to create a new group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGroup {
    /// Desired group name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Apache Guacamole protocol.
    pub guac_config_protocol: Option<String>,
    /// Apache Guacamole parameters.
    pub guac_config_parameters: Option<String>,
    /// Usernames of the initial members.
    pub members: Vec<String>,
    /// Creating user's username.
    pub created_by: String,
}

/// Changes to apply to an existing group. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupChanges {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New Guacamole protocol; an empty string clears it.
    pub guac_config_protocol: Option<String>,
    /// New Guacamole parameters; an empty string clears them.
    pub guac_config_parameters: Option<String>,
    /// Usernames; applied as a replacement or an addition per `replace_members`.
    pub members: Option<Vec<String>>,
    /// Replace the member set instead of adding to it.
    pub replace_members: bool,
    /// Modifying user's username.
    pub updated_by: String,
}
