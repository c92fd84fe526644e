//! Membership helpers shared by the user and group repositories.
//!
//! Every helper runs on a caller-provided connection so that membership
//! edits happen inside the caller's transaction.

use std::collections::HashMap;

use sqlx::AnyConnection;

use glim_core::error::AppError;
use glim_core::result::AppResult;
use glim_entity::{GroupRef, User};

use crate::rows::{MemberRow, MembershipRow, map_db_error, user_columns};

pub(crate) async fn resolve_group_ids(
    conn: &mut AnyConnection,
    names: &[String],
) -> AppResult<Vec<i64>> {
    let mut gids = Vec::with_capacity(names.len());
    for name in names {
        let gid = sqlx::query_scalar::<_, i64>("SELECT gid FROM groups WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_db_error("Failed to resolve group name"))?
            .ok_or_else(|| AppError::not_found(format!("group {name} not found")))?;
        gids.push(gid);
    }
    Ok(gids)
}

pub(crate) async fn resolve_user_ids(
    conn: &mut AnyConnection,
    usernames: &[String],
) -> AppResult<Vec<i64>> {
    let mut uids = Vec::with_capacity(usernames.len());
    for username in usernames {
        let uid = sqlx::query_scalar::<_, i64>("SELECT uid FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_db_error("Failed to resolve username"))?
            .ok_or_else(|| AppError::not_found(format!("user {username} not found")))?;
        uids.push(uid);
    }
    Ok(uids)
}

pub(crate) async fn insert(conn: &mut AnyConnection, gid: i64, uid: i64) -> AppResult<()> {
    sqlx::query("INSERT INTO group_members (gid, uid) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(gid)
        .bind(uid)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error("Failed to add group member"))?;
    Ok(())
}

pub(crate) async fn remove(conn: &mut AnyConnection, gid: i64, uid: i64) -> AppResult<()> {
    sqlx::query("DELETE FROM group_members WHERE gid = $1 AND uid = $2")
        .bind(gid)
        .bind(uid)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error("Failed to remove group member"))?;
    Ok(())
}

pub(crate) async fn clear_user(conn: &mut AnyConnection, uid: i64) -> AppResult<()> {
    sqlx::query("DELETE FROM group_members WHERE uid = $1")
        .bind(uid)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error("Failed to clear user memberships"))?;
    Ok(())
}

pub(crate) async fn clear_group(conn: &mut AnyConnection, gid: i64) -> AppResult<()> {
    sqlx::query("DELETE FROM group_members WHERE gid = $1")
        .bind(gid)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error("Failed to clear group members"))?;
    Ok(())
}

const MEMBERSHIP_SELECT: &str = "SELECT gm.uid AS uid, g.gid AS gid, g.name AS name, \
     g.description AS description FROM group_members gm JOIN groups g ON g.gid = gm.gid";

/// `memberOf` lists keyed by uid. `scope` is an optional `WHERE` clause
/// over `gm.uid`, bound with `limit`/`offset` or a single uid.
pub(crate) fn membership_sql(scope: &str) -> String {
    format!("{MEMBERSHIP_SELECT} {scope} ORDER BY g.name")
}

/// Member lists keyed by gid, same conventions as [`membership_sql`].
pub(crate) fn members_sql(scope: &str) -> String {
    format!(
        "SELECT gm.gid AS member_gid, {} FROM group_members gm \
         JOIN users u ON u.uid = gm.uid {scope} ORDER BY u.username",
        user_columns("u")
    )
}

pub(crate) fn group_by_uid(rows: Vec<MembershipRow>) -> HashMap<i64, Vec<GroupRef>> {
    let mut map: HashMap<i64, Vec<GroupRef>> = HashMap::new();
    for row in rows {
        map.entry(row.uid).or_default().push(row.group_ref());
    }
    map
}

pub(crate) fn group_by_gid(rows: Vec<MemberRow>) -> HashMap<i64, Vec<User>> {
    let mut map: HashMap<i64, Vec<User>> = HashMap::new();
    for row in rows {
        map.entry(row.member_gid)
            .or_default()
            .push(row.user.into_user());
    }
    map
}
