//! User repository implementation.

use sqlx::AnyPool;
use uuid::Uuid;

use glim_core::error::AppError;
use glim_core::result::AppResult;
use glim_core::types::pagination::PageRequest;
use glim_entity::{NewUser, User, UserChanges};

use super::membership;
use crate::rows::{UserRow, flag, map_db_error, map_write_error, now_timestamp, user_columns};

const USER_EXISTS: &str = "user already exists";

/// Repository for user CRUD and query operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: AnyPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Find a user by uid, with group memberships.
    pub async fn find_by_id(&self, uid: i64) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE uid = $1", user_columns(""));
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find user by id"))?;

        match row {
            Some(row) => Ok(Some(self.with_groups(row.into_user()).await?)),
            None => Ok(None),
        }
    }

    /// Find a user by exact (case-sensitive) username, with group memberships.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", user_columns(""));
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find user by username"))?;

        match row {
            Some(row) => Ok(Some(self.with_groups(row.into_user()).await?)),
            None => Ok(None),
        }
    }

    /// List a page of users ordered by uid, memberships resolved in a
    /// single additional query.
    pub async fn list(&self, page: &PageRequest) -> AppResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY uid LIMIT $1 OFFSET $2",
            user_columns("")
        );
        let users = sqlx::query_as::<_, UserRow>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to list users"))?;

        let membership_sql = membership::membership_sql(
            "WHERE gm.uid IN (SELECT uid FROM users ORDER BY uid LIMIT $1 OFFSET $2)",
        );
        let memberships = sqlx::query_as(&membership_sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to list user memberships"))?;

        Ok(attach_groups(users, memberships))
    }

    /// List every user, memberships resolved in a single additional query.
    pub async fn list_all(&self) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY uid", user_columns(""));
        let users = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to list users"))?;

        let memberships = sqlx::query_as(&membership::membership_sql(""))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to list user memberships"))?;

        Ok(attach_groups(users, memberships))
    }

    /// Create a new user and its group memberships in one transaction.
    ///
    /// An empty `password_hash` creates a locked account.
    pub async fn create(&self, data: &NewUser) -> AppResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("Failed to begin transaction"))?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT uid FROM users WHERE username = $1")
            .bind(&data.username)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error("Failed to check username"))?;
        if exists.is_some() {
            return Err(AppError::already_exists(USER_EXISTS));
        }

        let gids = membership::resolve_group_ids(&mut tx, &data.member_of).await?;
        let now = now_timestamp();

        let uid = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (uuid, username, firstname, lastname, email, ssh_public_key, \
             jpeg_photo, manager, readonly, locked, password_hash, created_at, updated_at, \
             created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING uid",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&data.username)
        .bind(&data.firstname)
        .bind(&data.lastname)
        .bind(&data.email)
        .bind(&data.ssh_public_key)
        .bind(&data.jpeg_photo)
        .bind(flag(data.manager))
        .bind(flag(data.readonly))
        .bind(flag(data.password_hash.is_empty()))
        .bind(&data.password_hash)
        .bind(now)
        .bind(now)
        .bind(&data.created_by)
        .bind(&data.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error("Failed to create user", USER_EXISTS))?;

        for gid in gids {
            membership::insert(&mut tx, gid, uid).await?;
        }

        tx.commit()
            .await
            .map_err(map_db_error("Failed to commit user creation"))?;

        self.find_by_id(uid)
            .await?
            .ok_or_else(|| AppError::internal("Created user could not be read back"))
    }

    /// Apply `changes` to a user, including group edits, in one transaction.
    pub async fn update(&self, uid: i64, changes: &UserChanges) -> AppResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("Failed to begin transaction"))?;

        let sql = format!("SELECT {} FROM users WHERE uid = $1", user_columns(""));
        let mut user = sqlx::query_as::<_, UserRow>(&sql)
            .bind(uid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error("Failed to load user"))?
            .ok_or_else(|| AppError::not_found("user not found"))?
            .into_user();

        if let Some(username) = &changes.username {
            if *username != user.username {
                let taken =
                    sqlx::query_scalar::<_, i64>("SELECT uid FROM users WHERE username = $1")
                        .bind(username)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(map_db_error("Failed to check username"))?;
                if taken.is_some() {
                    return Err(AppError::already_exists(USER_EXISTS));
                }
                user.username = username.clone();
            }
        }
        apply(&mut user.firstname, &changes.firstname);
        apply(&mut user.lastname, &changes.lastname);
        apply(&mut user.email, &changes.email);
        apply(&mut user.ssh_public_key, &changes.ssh_public_key);
        apply(&mut user.jpeg_photo, &changes.jpeg_photo);
        apply(&mut user.password_hash, &changes.password_hash);
        apply(&mut user.manager, &changes.manager);
        apply(&mut user.readonly, &changes.readonly);
        apply(&mut user.locked, &changes.locked);

        sqlx::query(
            "UPDATE users SET username = $2, firstname = $3, lastname = $4, email = $5, \
             ssh_public_key = $6, jpeg_photo = $7, manager = $8, readonly = $9, locked = $10, \
             password_hash = $11, updated_at = $12, updated_by = $13 WHERE uid = $1",
        )
        .bind(uid)
        .bind(&user.username)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.email)
        .bind(&user.ssh_public_key)
        .bind(&user.jpeg_photo)
        .bind(flag(user.manager))
        .bind(flag(user.readonly))
        .bind(flag(user.locked))
        .bind(&user.password_hash)
        .bind(now_timestamp())
        .bind(&changes.updated_by)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error("Failed to update user", USER_EXISTS))?;

        if let Some(groups) = &changes.member_of {
            let gids = membership::resolve_group_ids(&mut tx, groups).await?;
            if changes.replace_groups {
                membership::clear_user(&mut tx, uid).await?;
            }
            for gid in gids {
                membership::insert(&mut tx, gid, uid).await?;
            }
        }

        tx.commit()
            .await
            .map_err(map_db_error("Failed to commit user update"))?;

        self.find_by_id(uid)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    /// Set a new password hash and unlock the account.
    pub async fn update_password(
        &self,
        uid: i64,
        password_hash: &str,
        updated_by: &str,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, locked = $3, updated_at = $4, updated_by = $5 \
             WHERE uid = $1",
        )
        .bind(uid)
        .bind(password_hash)
        .bind(flag(password_hash.is_empty()))
        .bind(now_timestamp())
        .bind(updated_by)
        .execute(&self.pool)
        .await
        .map_err(map_db_error("Failed to update password"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("user not found"));
        }
        Ok(())
    }

    /// Delete a user and all of its memberships.
    pub async fn delete(&self, uid: i64) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("Failed to begin transaction"))?;

        membership::clear_user(&mut tx, uid).await?;
        let result = sqlx::query("DELETE FROM users WHERE uid = $1")
            .bind(uid)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error("Failed to delete user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("user not found"));
        }

        tx.commit()
            .await
            .map_err(map_db_error("Failed to commit user deletion"))?;
        Ok(())
    }

    /// Number of users in the catalog.
    pub async fn count(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error("Failed to count users"))
    }

    async fn with_groups(&self, mut user: User) -> AppResult<User> {
        let memberships =
            sqlx::query_as(&membership::membership_sql("WHERE gm.uid = $1"))
                .bind(user.uid)
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_error("Failed to load user memberships"))?;

        let mut groups = membership::group_by_uid(memberships);
        user.member_of = groups.remove(&user.uid).unwrap_or_default();
        Ok(user)
    }
}

fn attach_groups(rows: Vec<UserRow>, memberships: Vec<crate::rows::MembershipRow>) -> Vec<User> {
    let mut groups = membership::group_by_uid(memberships);
    rows.into_iter()
        .map(|row| {
            let mut user = row.into_user();
            user.member_of = groups.remove(&user.uid).unwrap_or_default();
            user
        })
        .collect()
}

fn apply<T: Clone>(field: &mut T, change: &Option<T>) {
    if let Some(value) = change {
        *field = value.clone();
    }
}
