//! Token storage repository.
//!
//! Besides the plain repository contract, every per-user operation filters
//! on the owner so that a token id under another user is simply not found.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::Token;
use crate::Result;
use crate::id::{TokenId, UserId};
use crate::storage::sql::{
    found, get_optional_timestamp, get_timestamp, now, require_id, timestamp, write_error,
};
use crate::storage::{Database, Page, Paginated, Repository, repository::paginate};

/// Repository for API tokens. Listings are scoped to one user.
#[derive(Debug, Clone)]
pub struct TokenRepository {
    pool: SqlitePool,
}

impl TokenRepository {
    /// Create a repository on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Get a token only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the token does not exist or has
    /// another owner.
    pub async fn get_by_user(&self, token_id: TokenId, user_id: UserId) -> Result<Token> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, token, name, expires_at, last_used_at, created_at, updated_at
            FROM tokens
            WHERE id = ? AND user_id = ?
            ",
        )
        .bind(token_id.0)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row_to_token(&found(row, Self::ENTITY, token_id)?)
    }

    /// Delete a token only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the token does not exist or has
    /// another owner.
    pub async fn delete_by_user(&self, user_id: UserId, token_id: TokenId) -> Result<()> {
        let deleted: Option<i64> = sqlx::query_scalar(
            "DELETE FROM tokens WHERE id = ? AND user_id = ? RETURNING id",
        )
        .bind(token_id.0)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        found(deleted, Self::ENTITY, token_id).map(drop)
    }

    /// Look up a token by its secret value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_value(&self, value: &str) -> Result<Option<Token>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, token, name, expires_at, last_used_at, created_at, updated_at
            FROM tokens
            WHERE token = ?
            ",
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_token).transpose()
    }

    /// Stamp the last use time.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the token does not exist.
    pub async fn touch(&self, id: TokenId) -> Result<()> {
        let updated: Option<i64> =
            sqlx::query_scalar("UPDATE tokens SET last_used_at = ? WHERE id = ? RETURNING id")
                .bind(timestamp(now()))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        found(updated, Self::ENTITY, id).map(drop)
    }
}

impl Repository for TokenRepository {
    type Entity = Token;
    type Id = TokenId;
    type Scope = UserId;

    const ENTITY: &'static str = "token";

    async fn create(&self, mut token: Token) -> Result<Token> {
        let at = now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO tokens (user_id, token, name, expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(token.user_id.0)
        .bind(&token.token)
        .bind(&token.name)
        .bind(token.expires_at.map(timestamp))
        .bind(timestamp(at))
        .bind(timestamp(at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, &token.name))?;

        token.id = Some(TokenId::new(id));
        token.created_at = Some(at);
        token.updated_at = Some(at);
        Ok(token)
    }

    async fn get(&self, id: TokenId) -> Result<Token> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, token, name, expires_at, last_used_at, created_at, updated_at
            FROM tokens
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row_to_token(&found(row, Self::ENTITY, id)?)
    }

    /// Renames or re-dates a token; the owner and secret value never change.
    async fn update(&self, token: &mut Token) -> Result<()> {
        let id = require_id(token.id, Self::ENTITY)?;
        let at = now();
        let updated: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE tokens SET name = ?, expires_at = ?, updated_at = ?
            WHERE id = ?
            RETURNING id
            ",
        )
        .bind(&token.name)
        .bind(token.expires_at.map(timestamp))
        .bind(timestamp(at))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        found(updated, Self::ENTITY, id)?;
        token.updated_at = Some(at);
        Ok(())
    }

    async fn delete(&self, id: TokenId) -> Result<()> {
        let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM tokens WHERE id = ? RETURNING id")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        found(deleted, Self::ENTITY, id).map(drop)
    }

    async fn list(&self, user_id: UserId, page: Page) -> Result<Paginated<Token>> {
        paginate(
            &self.pool,
            "SELECT COUNT(*) FROM tokens WHERE user_id = ?",
            r"
            SELECT id, user_id, token, name, expires_at, last_used_at, created_at, updated_at
            FROM tokens
            WHERE user_id = ?
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            ",
            Some(user_id.0),
            page,
            row_to_token,
        )
        .await
    }
}

/// Convert a database row to a `Token`.
fn row_to_token(row: &SqliteRow) -> Result<Token> {
    Ok(Token {
        id: Some(TokenId::new(row.try_get("id")?)),
        user_id: UserId::new(row.try_get("user_id")?),
        token: row.try_get("token")?,
        name: row.try_get("name")?,
        expires_at: get_optional_timestamp(row, "expires_at")?,
        last_used_at: get_optional_timestamp(row, "last_used_at")?,
        created_at: Some(get_timestamp(row, "created_at")?),
        updated_at: Some(get_timestamp(row, "updated_at")?),
    })
}
