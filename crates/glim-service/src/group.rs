//! Group management with Apache Guacamole pairing rules.

use serde::{Deserialize, Serialize};
use tracing::info;

use glim_core::error::AppError;
use glim_core::result::AppResult;
use glim_core::types::pagination::PageRequest;
use glim_database::{GroupRepository, UserRepository};
use glim_entity::{Group, GroupChanges, NewGroup};

use crate::context::RequestContext;

/// Body of a group creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub guac_config_protocol: Option<String>,
    #[serde(default)]
    pub guac_config_parameters: Option<String>,
    /// Usernames of the initial members.
    #[serde(default)]
    pub members: Vec<String>,
}

/// Body of a group update request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGroup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub guac_config_protocol: Option<String>,
    #[serde(default)]
    pub guac_config_parameters: Option<String>,
    #[serde(default)]
    pub members: Option<Vec<String>>,
    /// Replace the member set instead of adding to it.
    #[serde(default)]
    pub replace: bool,
}

/// Body of the member add/remove requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberList {
    #[serde(default)]
    pub members: Vec<String>,
}

/// Group operations on top of the catalog.
#[derive(Debug, Clone)]
pub struct GroupService {
    groups: GroupRepository,
    users: UserRepository,
}

impl GroupService {
    /// Creates a new group service.
    pub fn new(groups: GroupRepository, users: UserRepository) -> Self {
        Self { groups, users }
    }

    /// Lists groups with their members.
    pub async fn list(&self, page: &PageRequest) -> AppResult<Vec<Group>> {
        self.groups.list(page).await
    }

    /// Gets a single group.
    pub async fn get(&self, gid: i64) -> AppResult<Group> {
        self.groups
            .find_by_id(gid)
            .await?
            .ok_or_else(|| AppError::not_found("group not found"))
    }

    /// Resolves a group name to its gid.
    pub async fn gid_of(&self, name: &str) -> AppResult<i64> {
        self.groups
            .find_by_name(name)
            .await?
            .map(|group| group.gid)
            .ok_or_else(|| AppError::not_found("group not found"))
    }

    /// Creates a group.
    pub async fn create(&self, ctx: &RequestContext, input: CreateGroup) -> AppResult<Group> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("group name is required"));
        }
        let protocol = non_empty(input.guac_config_protocol);
        let parameters = non_empty(input.guac_config_parameters);
        check_guacamole(protocol.as_deref(), parameters.as_deref())?;

        let actor = self.actor_name(ctx).await?;
        let group = self
            .groups
            .create(&NewGroup {
                name,
                description: input.description,
                guac_config_protocol: protocol,
                guac_config_parameters: parameters,
                members: input.members,
                created_by: actor.clone(),
            })
            .await?;

        info!(gid = group.gid, name = %group.name, created_by = %actor, "Group created");
        Ok(group)
    }

    /// Updates a group. The Guacamole pair is checked on the merged result.
    pub async fn update(&self, ctx: &RequestContext, gid: i64, input: UpdateGroup) -> AppResult<Group> {
        let current = self.get(gid).await?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("group name is required"));
            }
        }

        let merged_protocol = match &input.guac_config_protocol {
            Some(value) => non_empty(Some(value.clone())),
            None => current.guac_config_protocol.clone(),
        };
        let merged_parameters = match &input.guac_config_parameters {
            Some(value) => non_empty(Some(value.clone())),
            None => current.guac_config_parameters.clone(),
        };
        check_guacamole(merged_protocol.as_deref(), merged_parameters.as_deref())?;

        let actor = self.actor_name(ctx).await?;
        let group = self
            .groups
            .update(
                gid,
                &GroupChanges {
                    name: input.name.map(|n| n.trim().to_string()),
                    description: input.description,
                    guac_config_protocol: input.guac_config_protocol,
                    guac_config_parameters: input.guac_config_parameters,
                    members: input.members,
                    replace_members: input.replace,
                    updated_by: actor.clone(),
                },
            )
            .await?;

        info!(gid, updated_by = %actor, "Group updated");
        Ok(group)
    }

    /// Deletes a group and its memberships.
    pub async fn delete(&self, ctx: &RequestContext, gid: i64) -> AppResult<()> {
        self.groups.delete(gid).await?;
        info!(gid, deleted_by = ctx.uid, "Group deleted");
        Ok(())
    }

    /// Adds members by username.
    pub async fn add_members(&self, ctx: &RequestContext, gid: i64, input: MemberList) -> AppResult<Group> {
        let group = self.groups.add_members(gid, &input.members).await?;
        info!(gid, count = input.members.len(), by = ctx.uid, "Group members added");
        Ok(group)
    }

    /// Removes members by username.
    pub async fn remove_members(
        &self,
        ctx: &RequestContext,
        gid: i64,
        input: MemberList,
    ) -> AppResult<Group> {
        let group = self.groups.remove_members(gid, &input.members).await?;
        info!(gid, count = input.members.len(), by = ctx.uid, "Group members removed");
        Ok(group)
    }

    async fn actor_name(&self, ctx: &RequestContext) -> AppResult<String> {
        Ok(self
            .users
            .find_by_id(ctx.uid)
            .await?
            .map(|user| user.username)
            .unwrap_or_else(|| format!("uid:{}", ctx.uid)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Both Guacamole attributes are set, or neither.
fn check_guacamole(protocol: Option<&str>, parameters: Option<&str>) -> AppResult<()> {
    match (protocol, parameters) {
        (None, Some(_)) => Err(AppError::validation(
            "Apache Guacamole config protocol is required",
        )),
        (Some(_), None) => Err(AppError::validation(
            "Apache Guacamole config parameters are required",
        )),
        _ => Ok(()),
    }
}
