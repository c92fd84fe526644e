//! Group repository implementation.

use sqlx::AnyPool;
use uuid::Uuid;

use glim_core::error::AppError;
use glim_core::result::AppResult;
use glim_core::types::pagination::PageRequest;
use glim_entity::{Group, GroupChanges, NewGroup};

use super::membership;
use crate::rows::{GROUP_COLUMNS, GroupRow, MemberRow, map_db_error, map_write_error, now_timestamp};

const GROUP_EXISTS: &str = "group already exists";

/// Repository for group CRUD and membership operations.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: AnyPool,
}

impl GroupRepository {
    /// Create a new group repository.
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Find a group by gid, with its members.
    pub async fn find_by_id(&self, gid: i64) -> AppResult<Option<Group>> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM groups WHERE gid = $1");
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(gid)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find group by id"))?;

        match row {
            Some(row) => Ok(Some(self.with_members(row.into_group()).await?)),
            None => Ok(None),
        }
    }

    /// Find a group by exact (case-sensitive) name, with its members.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Group>> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM groups WHERE name = $1");
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find group by name"))?;

        match row {
            Some(row) => Ok(Some(self.with_members(row.into_group()).await?)),
            None => Ok(None),
        }
    }

    /// List a page of groups ordered by gid, members resolved in a single
    /// additional query.
    pub async fn list(&self, page: &PageRequest) -> AppResult<Vec<Group>> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM groups ORDER BY gid LIMIT $1 OFFSET $2");
        let groups = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to list groups"))?;

        let members = sqlx::query_as(&membership::members_sql(
            "WHERE gm.gid IN (SELECT gid FROM groups ORDER BY gid LIMIT $1 OFFSET $2)",
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error("Failed to list group members"))?;

        Ok(attach_members(groups, members))
    }

    /// List every group, members resolved in a single additional query.
    pub async fn list_all(&self) -> AppResult<Vec<Group>> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM groups ORDER BY gid");
        let groups = sqlx::query_as::<_, GroupRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to list groups"))?;

        let members = sqlx::query_as(&membership::members_sql(""))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to list group members"))?;

        Ok(attach_members(groups, members))
    }

    /// Create a new group and its initial members in one transaction.
    pub async fn create(&self, data: &NewGroup) -> AppResult<Group> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("Failed to begin transaction"))?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT gid FROM groups WHERE name = $1")
            .bind(&data.name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error("Failed to check group name"))?;
        if exists.is_some() {
            return Err(AppError::already_exists(GROUP_EXISTS));
        }

        let uids = membership::resolve_user_ids(&mut tx, &data.members).await?;
        let now = now_timestamp();

        let gid = sqlx::query_scalar::<_, i64>(
            "INSERT INTO groups (uuid, name, description, guac_config_protocol, \
             guac_config_parameters, created_at, updated_at, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING gid",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.guac_config_protocol.clone())
        .bind(data.guac_config_parameters.clone())
        .bind(now)
        .bind(now)
        .bind(&data.created_by)
        .bind(&data.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error("Failed to create group", GROUP_EXISTS))?;

        for uid in uids {
            membership::insert(&mut tx, gid, uid).await?;
        }

        tx.commit()
            .await
            .map_err(map_db_error("Failed to commit group creation"))?;

        self.find_by_id(gid)
            .await?
            .ok_or_else(|| AppError::internal("Created group could not be read back"))
    }

    /// Apply `changes` to a group, including member edits, in one transaction.
    pub async fn update(&self, gid: i64, changes: &GroupChanges) -> AppResult<Group> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("Failed to begin transaction"))?;

        let sql = format!("SELECT {GROUP_COLUMNS} FROM groups WHERE gid = $1");
        let mut group = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(gid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error("Failed to load group"))?
            .ok_or_else(|| AppError::not_found("group not found"))?
            .into_group();

        if let Some(name) = &changes.name {
            if *name != group.name {
                let taken = sqlx::query_scalar::<_, i64>("SELECT gid FROM groups WHERE name = $1")
                    .bind(name)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(map_db_error("Failed to check group name"))?;
                if taken.is_some() {
                    return Err(AppError::already_exists(GROUP_EXISTS));
                }
                group.name = name.clone();
            }
        }
        if let Some(description) = &changes.description {
            group.description = description.clone();
        }
        if let Some(protocol) = &changes.guac_config_protocol {
            group.guac_config_protocol = non_empty(protocol);
        }
        if let Some(parameters) = &changes.guac_config_parameters {
            group.guac_config_parameters = non_empty(parameters);
        }

        sqlx::query(
            "UPDATE groups SET name = $2, description = $3, guac_config_protocol = $4, \
             guac_config_parameters = $5, updated_at = $6, updated_by = $7 WHERE gid = $1",
        )
        .bind(gid)
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.guac_config_protocol.clone())
        .bind(group.guac_config_parameters.clone())
        .bind(now_timestamp())
        .bind(&changes.updated_by)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error("Failed to update group", GROUP_EXISTS))?;

        if let Some(members) = &changes.members {
            let uids = membership::resolve_user_ids(&mut tx, members).await?;
            if changes.replace_members {
                membership::clear_group(&mut tx, gid).await?;
            }
            for uid in uids {
                membership::insert(&mut tx, gid, uid).await?;
            }
        }

        tx.commit()
            .await
            .map_err(map_db_error("Failed to commit group update"))?;

        self.find_by_id(gid)
            .await?
            .ok_or_else(|| AppError::not_found("group not found"))
    }

    /// Delete a group and all of its memberships.
    pub async fn delete(&self, gid: i64) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("Failed to begin transaction"))?;

        membership::clear_group(&mut tx, gid).await?;
        let result = sqlx::query("DELETE FROM groups WHERE gid = $1")
            .bind(gid)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error("Failed to delete group"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("group not found"));
        }

        tx.commit()
            .await
            .map_err(map_db_error("Failed to commit group deletion"))?;
        Ok(())
    }

    /// Add users to a group. Existing memberships are kept.
    pub async fn add_members(&self, gid: i64, usernames: &[String]) -> AppResult<Group> {
        self.edit_members(gid, usernames, MemberEdit::Add).await
    }

    /// Remove users from a group. Non-members are ignored.
    pub async fn remove_members(&self, gid: i64, usernames: &[String]) -> AppResult<Group> {
        self.edit_members(gid, usernames, MemberEdit::Remove).await
    }

    /// Replace the member set of a group.
    pub async fn replace_members(&self, gid: i64, usernames: &[String]) -> AppResult<Group> {
        self.edit_members(gid, usernames, MemberEdit::Replace).await
    }

    async fn edit_members(
        &self,
        gid: i64,
        usernames: &[String],
        edit: MemberEdit,
    ) -> AppResult<Group> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("Failed to begin transaction"))?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT gid FROM groups WHERE gid = $1")
            .bind(gid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error("Failed to load group"))?;
        if exists.is_none() {
            return Err(AppError::not_found("group not found"));
        }

        let uids = membership::resolve_user_ids(&mut tx, usernames).await?;
        match edit {
            MemberEdit::Add => {
                for uid in uids {
                    membership::insert(&mut tx, gid, uid).await?;
                }
            }
            MemberEdit::Remove => {
                for uid in uids {
                    membership::remove(&mut tx, gid, uid).await?;
                }
            }
            MemberEdit::Replace => {
                membership::clear_group(&mut tx, gid).await?;
                for uid in uids {
                    membership::insert(&mut tx, gid, uid).await?;
                }
            }
        }

        sqlx::query("UPDATE groups SET updated_at = $2 WHERE gid = $1")
            .bind(gid)
            .bind(now_timestamp())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error("Failed to touch group"))?;

        tx.commit()
            .await
            .map_err(map_db_error("Failed to commit member edit"))?;

        self.find_by_id(gid)
            .await?
            .ok_or_else(|| AppError::not_found("group not found"))
    }

    /// Number of groups in the catalog.
    pub async fn count(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM groups")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error("Failed to count groups"))
    }

    async fn with_members(&self, mut group: Group) -> AppResult<Group> {
        let rows: Vec<MemberRow> = sqlx::query_as(&membership::members_sql("WHERE gm.gid = $1"))
            .bind(group.gid)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to load group members"))?;

        let mut members = membership::group_by_gid(rows);
        group.members = members.remove(&group.gid).unwrap_or_default();
        Ok(group)
    }
}

#[derive(Debug, Clone, Copy)]
enum MemberEdit {
    Add,
    Remove,
    Replace,
}

fn attach_members(rows: Vec<GroupRow>, members: Vec<MemberRow>) -> Vec<Group> {
    let mut members = membership::group_by_gid(members);
    rows.into_iter()
        .map(|row| {
            let mut group = row.into_group();
            group.members = members.remove(&group.gid).unwrap_or_default();
            group
        })
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
