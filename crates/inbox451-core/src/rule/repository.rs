//! Forwarding rule storage repository.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::trace;

use super::model::ForwardRule;
use crate::Result;
use crate::id::{InboxId, RuleId};
use crate::storage::sql::{found, get_timestamp, now, require_id, timestamp, write_error};
use crate::storage::{Database, Page, Paginated, Repository, repository::paginate};

/// Which rules a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Every rule in the system.
    All,
    /// Rules targeting one inbox.
    Inbox(InboxId),
}

/// Repository for forward rules.
#[derive(Debug, Clone)]
pub struct RuleRepository {
    pool: SqlitePool,
}

impl RuleRepository {
    /// Create a repository on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Load the complete rule set in primary-key order.
    ///
    /// This is the snapshot routing decisions are made against.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn all(&self) -> Result<Vec<ForwardRule>> {
        let rows = sqlx::query(
            r"
            SELECT id, inbox_id, sender, receiver, subject, created_at, updated_at
            FROM forward_rules
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        trace!("Loaded {} forward rules", rows.len());
        rows.iter().map(row_to_rule).collect()
    }
}

impl Repository for RuleRepository {
    type Entity = ForwardRule;
    type Id = RuleId;
    type Scope = RuleScope;

    const ENTITY: &'static str = "forward rule";

    async fn create(&self, mut rule: ForwardRule) -> Result<ForwardRule> {
        let at = now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO forward_rules (inbox_id, sender, receiver, subject, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(rule.inbox_id.0)
        .bind(&rule.sender)
        .bind(&rule.receiver)
        .bind(&rule.subject)
        .bind(timestamp(at))
        .bind(timestamp(at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, &rule.receiver))?;

        rule.id = Some(RuleId::new(id));
        rule.created_at = Some(at);
        rule.updated_at = Some(at);
        Ok(rule)
    }

    async fn get(&self, id: RuleId) -> Result<ForwardRule> {
        let row = sqlx::query(
            r"
            SELECT id, inbox_id, sender, receiver, subject, created_at, updated_at
            FROM forward_rules
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row_to_rule(&found(row, Self::ENTITY, id)?)
    }

    async fn update(&self, rule: &mut ForwardRule) -> Result<()> {
        let id = require_id(rule.id, Self::ENTITY)?;
        let at = now();
        let updated: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE forward_rules SET
                inbox_id = ?, sender = ?, receiver = ?, subject = ?, updated_at = ?
            WHERE id = ?
            RETURNING id
            ",
        )
        .bind(rule.inbox_id.0)
        .bind(&rule.sender)
        .bind(&rule.receiver)
        .bind(&rule.subject)
        .bind(timestamp(at))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, id))?;

        found(updated, Self::ENTITY, id)?;
        rule.updated_at = Some(at);
        Ok(())
    }

    async fn delete(&self, id: RuleId) -> Result<()> {
        let deleted: Option<i64> =
            sqlx::query_scalar("DELETE FROM forward_rules WHERE id = ? RETURNING id")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        found(deleted, Self::ENTITY, id).map(drop)
    }

    async fn list(&self, scope: RuleScope, page: Page) -> Result<Paginated<ForwardRule>> {
        match scope {
            RuleScope::All => {
                paginate(
                    &self.pool,
                    "SELECT COUNT(*) FROM forward_rules",
                    r"
                    SELECT id, inbox_id, sender, receiver, subject, created_at, updated_at
                    FROM forward_rules
                    ORDER BY id ASC
                    LIMIT ? OFFSET ?
                    ",
                    None,
                    page,
                    row_to_rule,
                )
                .await
            }
            RuleScope::Inbox(inbox_id) => {
                paginate(
                    &self.pool,
                    "SELECT COUNT(*) FROM forward_rules WHERE inbox_id = ?",
                    r"
                    SELECT id, inbox_id, sender, receiver, subject, created_at, updated_at
                    FROM forward_rules
                    WHERE inbox_id = ?
                    ORDER BY id ASC
                    LIMIT ? OFFSET ?
                    ",
                    Some(inbox_id.0),
                    page,
                    row_to_rule,
                )
                .await
            }
        }
    }
}

/// Convert a database row to a `ForwardRule`.
fn row_to_rule(row: &SqliteRow) -> Result<ForwardRule> {
    Ok(ForwardRule {
        id: Some(RuleId::new(row.try_get("id")?)),
        inbox_id: InboxId::new(row.try_get("inbox_id")?),
        sender: row.try_get("sender")?,
        receiver: row.try_get("receiver")?,
        subject: row.try_get("subject")?,
        created_at: Some(get_timestamp(row, "created_at")?),
        updated_at: Some(get_timestamp(row, "updated_at")?),
    })
}
