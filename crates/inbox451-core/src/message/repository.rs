//! Message storage repository.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::Message;
use crate::Result;
use crate::id::{InboxId, MessageId};
use crate::storage::sql::{found, get_timestamp, now, require_id, timestamp, write_error};
use crate::storage::{Database, Page, Paginated, Repository, repository::paginate};

/// Repository for stored messages. Listings are scoped to one inbox.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a repository on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Set the read flag of a message.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the message does not exist.
    pub async fn set_read(&self, id: MessageId, is_read: bool) -> Result<()> {
        let updated: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE messages SET is_read = ?, updated_at = ?
            WHERE id = ?
            RETURNING id
            ",
        )
        .bind(is_read)
        .bind(timestamp(now()))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        found(updated, Self::ENTITY, id).map(drop)
    }
}

impl Repository for MessageRepository {
    type Entity = Message;
    type Id = MessageId;
    type Scope = InboxId;

    const ENTITY: &'static str = "message";

    async fn create(&self, mut message: Message) -> Result<Message> {
        let at = now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO messages (
                inbox_id, sender, receiver, subject, body, is_read, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(message.inbox_id.0)
        .bind(&message.sender)
        .bind(&message.receiver)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(message.is_read)
        .bind(timestamp(at))
        .bind(timestamp(at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, message.inbox_id))?;

        message.id = Some(MessageId::new(id));
        message.created_at = Some(at);
        message.updated_at = Some(at);
        Ok(message)
    }

    async fn get(&self, id: MessageId) -> Result<Message> {
        let row = sqlx::query(
            r"
            SELECT id, inbox_id, sender, receiver, subject, body, is_read, created_at, updated_at
            FROM messages
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row_to_message(&found(row, Self::ENTITY, id)?)
    }

    /// Messages are immutable apart from the read flag, which is all this writes.
    async fn update(&self, message: &mut Message) -> Result<()> {
        let id = require_id(message.id, Self::ENTITY)?;
        let at = now();
        let updated: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE messages SET is_read = ?, updated_at = ?
            WHERE id = ?
            RETURNING id
            ",
        )
        .bind(message.is_read)
        .bind(timestamp(at))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        found(updated, Self::ENTITY, id)?;
        message.updated_at = Some(at);
        Ok(())
    }

    async fn delete(&self, id: MessageId) -> Result<()> {
        let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM messages WHERE id = ? RETURNING id")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        found(deleted, Self::ENTITY, id).map(drop)
    }

    async fn list(&self, inbox_id: InboxId, page: Page) -> Result<Paginated<Message>> {
        paginate(
            &self.pool,
            "SELECT COUNT(*) FROM messages WHERE inbox_id = ?",
            r"
            SELECT id, inbox_id, sender, receiver, subject, body, is_read, created_at, updated_at
            FROM messages
            WHERE inbox_id = ?
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            ",
            Some(inbox_id.0),
            page,
            row_to_message,
        )
        .await
    }
}

/// Convert a database row to a `Message`.
fn row_to_message(row: &SqliteRow) -> Result<Message> {
    Ok(Message {
        id: Some(MessageId::new(row.try_get("id")?)),
        inbox_id: InboxId::new(row.try_get("inbox_id")?),
        sender: row.try_get("sender")?,
        receiver: row.try_get("receiver")?,
        subject: row.try_get("subject")?,
        body: row.try_get("body")?,
        is_read: row.try_get("is_read")?,
        created_at: Some(get_timestamp(row, "created_at")?),
        updated_at: Some(get_timestamp(row, "updated_at")?),
    })
}
