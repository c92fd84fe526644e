//! Response DTOs.

use serde::{Deserialize, Serialize};

use glim_entity::{Group, GroupRef, User};

/// Error and informational body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Group summary embedded in [`UserInfo`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRefInfo {
    pub gid: i64,
    pub name: String,
    pub description: String,
}

impl From<&GroupRef> for GroupRefInfo {
    fn from(group: &GroupRef) -> Self {
        Self {
            gid: group.gid,
            name: group.name.clone(),
            description: group.description.clone(),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: i64,
    pub username: String,
    /// Full name.
    pub name: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub ssh_public_key: String,
    pub jpeg_photo: String,
    pub manager: bool,
    pub readonly: bool,
    pub locked: bool,
    #[serde(rename = "memberOf", default, skip_serializing_if = "Option::is_none")]
    pub member_of: Option<Vec<GroupRefInfo>>,
}

impl UserInfo {
    /// User view including group memberships.
    pub fn with_groups(user: &User) -> Self {
        let mut info = Self::without_groups(user);
        if !user.member_of.is_empty() {
            info.member_of = Some(user.member_of.iter().map(GroupRefInfo::from).collect());
        }
        info
    }

    /// User view without group memberships, as nested in [`GroupInfo`].
    pub fn without_groups(user: &User) -> Self {
        Self {
            uid: user.uid,
            username: user.username.clone(),
            name: user.full_name(),
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            email: user.email.clone(),
            ssh_public_key: user.ssh_public_key.clone(),
            jpeg_photo: user.jpeg_photo.clone(),
            manager: user.manager,
            readonly: user.readonly,
            locked: user.locked,
            member_of: None,
        }
    }
}

/// Public view of a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub gid: i64,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<UserInfo>>,
    pub guac_config_protocol: String,
    pub guac_config_parameters: String,
}

impl From<&Group> for GroupInfo {
    fn from(group: &Group) -> Self {
        let members = (!group.members.is_empty())
            .then(|| group.members.iter().map(UserInfo::without_groups).collect());
        Self {
            gid: group.gid,
            name: group.name.clone(),
            description: group.description.clone(),
            members,
            guac_config_protocol: group.guac_config_protocol.clone().unwrap_or_default(),
            guac_config_parameters: group.guac_config_parameters.clone().unwrap_or_default(),
        }
    }
}

/// GET /v1/users/{username}/uid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UidResponse {
    pub uid: i64,
}

/// GET /v1/groups/{name}/gid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GidResponse {
    pub gid: i64,
}

/// GET /v1/guacamole
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuacamoleResponse {
    pub enabled: bool,
}

/// Health probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
