//! Row types shared by the repositories.
//!
//! The `Any` driver only moves integers, text and blobs, so flags are
//! stored as 0/1 integers and timestamps as unix seconds.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use glim_core::error::{AppError, ErrorKind};
use glim_entity::{Group, GroupRef, User};

/// Column list of the `users` table, optionally qualified with a table alias.
pub(crate) fn user_columns(alias: &str) -> String {
    const COLUMNS: [&str; 16] = [
        "uid",
        "uuid",
        "username",
        "firstname",
        "lastname",
        "email",
        "ssh_public_key",
        "jpeg_photo",
        "manager",
        "readonly",
        "locked",
        "password_hash",
        "created_at",
        "updated_at",
        "created_by",
        "updated_by",
    ];
    COLUMNS
        .iter()
        .map(|c| {
            if alias.is_empty() {
                (*c).to_string()
            } else {
                format!("{alias}.{c} AS {c}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Column list of the `groups` table.
pub(crate) const GROUP_COLUMNS: &str = "gid, uuid, name, description, guac_config_protocol, \
     guac_config_parameters, created_at, updated_at, created_by, updated_by";

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub uid: i64,
    pub uuid: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub ssh_public_key: String,
    pub jpeg_photo: String,
    pub manager: i64,
    pub readonly: i64,
    pub locked: i64,
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub created_by: String,
    pub updated_by: String,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            uid: self.uid,
            uuid: parse_uuid(&self.uuid),
            username: self.username,
            firstname: self.firstname,
            lastname: self.lastname,
            email: self.email,
            ssh_public_key: self.ssh_public_key,
            jpeg_photo: self.jpeg_photo,
            manager: self.manager != 0,
            readonly: self.readonly != 0,
            locked: self.locked != 0,
            password_hash: self.password_hash,
            created_at: from_timestamp(self.created_at),
            updated_at: from_timestamp(self.updated_at),
            created_by: self.created_by,
            updated_by: self.updated_by,
            member_of: Vec::new(),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct GroupRow {
    pub gid: i64,
    pub uuid: String,
    pub name: String,
    pub description: String,
    pub guac_config_protocol: Option<String>,
    pub guac_config_parameters: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub created_by: String,
    pub updated_by: String,
}

impl GroupRow {
    pub fn into_group(self) -> Group {
        Group {
            gid: self.gid,
            uuid: parse_uuid(&self.uuid),
            name: self.name,
            description: self.description,
            guac_config_protocol: self.guac_config_protocol,
            guac_config_parameters: self.guac_config_parameters,
            created_at: from_timestamp(self.created_at),
            updated_at: from_timestamp(self.updated_at),
            created_by: self.created_by,
            updated_by: self.updated_by,
            members: Vec::new(),
        }
    }
}

/// A user's group membership, joined with the group record.
#[derive(Debug, FromRow)]
pub(crate) struct MembershipRow {
    pub uid: i64,
    pub gid: i64,
    pub name: String,
    pub description: String,
}

impl MembershipRow {
    pub fn group_ref(&self) -> GroupRef {
        GroupRef {
            gid: self.gid,
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// A group's member, joined with the user record.
#[derive(Debug, FromRow)]
pub(crate) struct MemberRow {
    pub member_gid: i64,
    #[sqlx(flatten)]
    pub user: UserRow,
}

pub(crate) fn flag(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

fn from_timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

fn parse_uuid(value: &str) -> Uuid {
    Uuid::parse_str(value).unwrap_or_default()
}

/// Map a sqlx error into a catalog error, turning uniqueness violations
/// into `AlreadyExists` with the given message.
pub(crate) fn map_write_error(
    context: &'static str,
    exists_message: &'static str,
) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::already_exists(exists_message)
        }
        _ => AppError::with_source(ErrorKind::Database, context, e),
    }
}

/// Map a sqlx error into a plain catalog error.
pub(crate) fn map_db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}
