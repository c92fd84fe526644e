//! Catalog schema bootstrap.
//!
//! The schema is small and additive, so it is created idempotently at
//! startup with dialect-specific DDL rather than versioned migrations.

use tracing::info;

use glim_core::error::{AppError, ErrorKind};

use crate::connection::{Backend, DatabasePool};

const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        uid INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL UNIQUE,
        firstname TEXT NOT NULL DEFAULT '',
        lastname TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        ssh_public_key TEXT NOT NULL DEFAULT '',
        jpeg_photo TEXT NOT NULL DEFAULT '',
        manager INTEGER NOT NULL DEFAULT 0,
        readonly INTEGER NOT NULL DEFAULT 0,
        locked INTEGER NOT NULL DEFAULT 0,
        password_hash TEXT NOT NULL DEFAULT '',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        created_by TEXT NOT NULL DEFAULT '',
        updated_by TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS groups (
        gid INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        guac_config_protocol TEXT,
        guac_config_parameters TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        created_by TEXT NOT NULL DEFAULT '',
        updated_by TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS group_members (
        gid INTEGER NOT NULL REFERENCES groups (gid) ON DELETE CASCADE,
        uid INTEGER NOT NULL REFERENCES users (uid) ON DELETE CASCADE,
        PRIMARY KEY (gid, uid)
    )",
    "CREATE INDEX IF NOT EXISTS idx_group_members_uid ON group_members (uid)",
];

const POSTGRES_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        uid BIGSERIAL PRIMARY KEY,
        uuid TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL UNIQUE,
        firstname TEXT NOT NULL DEFAULT '',
        lastname TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        ssh_public_key TEXT NOT NULL DEFAULT '',
        jpeg_photo TEXT NOT NULL DEFAULT '',
        manager BIGINT NOT NULL DEFAULT 0,
        readonly BIGINT NOT NULL DEFAULT 0,
        locked BIGINT NOT NULL DEFAULT 0,
        password_hash TEXT NOT NULL DEFAULT '',
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL,
        created_by TEXT NOT NULL DEFAULT '',
        updated_by TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS groups (
        gid BIGSERIAL PRIMARY KEY,
        uuid TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        guac_config_protocol TEXT,
        guac_config_parameters TEXT,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL,
        created_by TEXT NOT NULL DEFAULT '',
        updated_by TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS group_members (
        gid BIGINT NOT NULL REFERENCES groups (gid) ON DELETE CASCADE,
        uid BIGINT NOT NULL REFERENCES users (uid) ON DELETE CASCADE,
        PRIMARY KEY (gid, uid)
    )",
    "CREATE INDEX IF NOT EXISTS idx_group_members_uid ON group_members (uid)",
];

/// Create the catalog tables if they do not exist yet.
pub async fn run_migrations(db: &DatabasePool) -> Result<(), AppError> {
    info!(backend = ?db.backend(), "Preparing catalog schema...");

    let statements = match db.backend() {
        Backend::Sqlite => SQLITE_SCHEMA,
        Backend::Postgres => POSTGRES_SCHEMA,
    };

    for statement in statements {
        sqlx::query(statement)
            .execute(db.pool())
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to prepare catalog schema: {e}"),
                    e,
                )
            })?;
    }

    info!("Catalog schema ready");
    Ok(())
}
