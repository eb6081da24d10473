//! User storage repository.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::{User, UserRole, UserStatus};
use crate::Result;
use crate::id::UserId;
use crate::storage::sql::{
    found, get_optional_timestamp, get_timestamp, now, require_id, timestamp, write_error,
};
use crate::storage::{Database, Page, Paginated, Repository, repository::paginate};

/// Repository for user storage and retrieval.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a repository on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Get a user by login name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if no user has that username.
    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        let row = sqlx::query(
            r"
            SELECT id, name, username, password, email, status, role,
                   password_login, logged_in_at, created_at, updated_at
            FROM users
            WHERE username = ?
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row_to_user(&found(row, Self::ENTITY, username)?)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the user does not exist.
    pub async fn set_password_hash(&self, id: UserId, password_hash: &str) -> Result<()> {
        let updated: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE users SET password = ?, updated_at = ?
            WHERE id = ?
            RETURNING id
            ",
        )
        .bind(password_hash)
        .bind(timestamp(now()))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        found(updated, Self::ENTITY, id).map(drop)
    }

    /// Stamp the last login time.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the user does not exist.
    pub async fn touch_login(&self, id: UserId) -> Result<()> {
        let updated: Option<i64> =
            sqlx::query_scalar("UPDATE users SET logged_in_at = ? WHERE id = ? RETURNING id")
                .bind(timestamp(now()))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        found(updated, Self::ENTITY, id).map(drop)
    }
}

impl Repository for UserRepository {
    type Entity = User;
    type Id = UserId;
    type Scope = ();

    const ENTITY: &'static str = "user";

    async fn create(&self, mut user: User) -> Result<User> {
        let at = now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO users (
                name, username, password, email, status, role,
                password_login, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(user.status.as_str())
        .bind(user.role.as_str())
        .bind(user.password_login)
        .bind(timestamp(at))
        .bind(timestamp(at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, &user.username))?;

        user.id = Some(UserId::new(id));
        user.created_at = Some(at);
        user.updated_at = Some(at);
        Ok(user)
    }

    async fn get(&self, id: UserId) -> Result<User> {
        let row = sqlx::query(
            r"
            SELECT id, name, username, password, email, status, role,
                   password_login, logged_in_at, created_at, updated_at
            FROM users
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row_to_user(&found(row, Self::ENTITY, id)?)
    }

    /// Writes profile fields only; the password goes through
    /// [`UserRepository::set_password_hash`].
    async fn update(&self, user: &mut User) -> Result<()> {
        let id = require_id(user.id, Self::ENTITY)?;
        let at = now();
        let updated: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE users SET
                name = ?, username = ?, email = ?, status = ?, role = ?,
                password_login = ?, updated_at = ?
            WHERE id = ?
            RETURNING id
            ",
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.status.as_str())
        .bind(user.role.as_str())
        .bind(user.password_login)
        .bind(timestamp(at))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, &user.username))?;

        found(updated, Self::ENTITY, id)?;
        user.updated_at = Some(at);
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM users WHERE id = ? RETURNING id")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        found(deleted, Self::ENTITY, id).map(drop)
    }

    async fn list(&self, (): (), page: Page) -> Result<Paginated<User>> {
        paginate(
            &self.pool,
            "SELECT COUNT(*) FROM users",
            r"
            SELECT id, name, username, password, email, status, role,
                   password_login, logged_in_at, created_at, updated_at
            FROM users
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            ",
            None,
            page,
            row_to_user,
        )
        .await
    }
}

/// Convert a database row to a `User`.
fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: Some(UserId::new(row.try_get("id")?)),
        name: row.try_get("name")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password")?,
        email: row.try_get("email")?,
        status: UserStatus::parse(row.try_get("status")?),
        role: UserRole::parse(row.try_get("role")?),
        password_login: row.try_get("password_login")?,
        logged_in_at: get_optional_timestamp(row, "logged_in_at")?,
        created_at: Some(get_timestamp(row, "created_at")?),
        updated_at: Some(get_timestamp(row, "updated_at")?),
    })
}
