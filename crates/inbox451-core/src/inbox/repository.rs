//! Inbox storage repository.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::Inbox;
use crate::Result;
use crate::id::{InboxId, ProjectId};
use crate::storage::sql::{found, get_timestamp, now, require_id, timestamp, write_error};
use crate::storage::{Database, Page, Paginated, Repository, repository::paginate};

/// Repository for inboxes. Listings are scoped to one project.
#[derive(Debug, Clone)]
pub struct InboxRepository {
    pool: SqlitePool,
}

impl InboxRepository {
    /// Create a repository on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Look up the inbox that owns `email`, compared exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Inbox>> {
        let row = sqlx::query(
            r"
            SELECT id, project_id, email, created_at, updated_at
            FROM inboxes
            WHERE email = ?
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_inbox).transpose()
    }

    /// Get the inbox that owns `email`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if no inbox has that address.
    pub async fn get_by_email(&self, email: &str) -> Result<Inbox> {
        found(self.find_by_email(email).await?, Self::ENTITY, email)
    }
}

impl Repository for InboxRepository {
    type Entity = Inbox;
    type Id = InboxId;
    type Scope = ProjectId;

    const ENTITY: &'static str = "inbox";

    async fn create(&self, mut inbox: Inbox) -> Result<Inbox> {
        let at = now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO inboxes (project_id, email, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(inbox.project_id.0)
        .bind(&inbox.email)
        .bind(timestamp(at))
        .bind(timestamp(at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, &inbox.email))?;

        inbox.id = Some(InboxId::new(id));
        inbox.created_at = Some(at);
        inbox.updated_at = Some(at);
        Ok(inbox)
    }

    async fn get(&self, id: InboxId) -> Result<Inbox> {
        let row = sqlx::query(
            r"
            SELECT id, project_id, email, created_at, updated_at
            FROM inboxes
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row_to_inbox(&found(row, Self::ENTITY, id)?)
    }

    async fn update(&self, inbox: &mut Inbox) -> Result<()> {
        let id = require_id(inbox.id, Self::ENTITY)?;
        let at = now();
        let updated: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE inboxes SET project_id = ?, email = ?, updated_at = ?
            WHERE id = ?
            RETURNING id
            ",
        )
        .bind(inbox.project_id.0)
        .bind(&inbox.email)
        .bind(timestamp(at))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, &inbox.email))?;

        found(updated, Self::ENTITY, id)?;
        inbox.updated_at = Some(at);
        Ok(())
    }

    async fn delete(&self, id: InboxId) -> Result<()> {
        let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM inboxes WHERE id = ? RETURNING id")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        found(deleted, Self::ENTITY, id).map(drop)
    }

    async fn list(&self, project_id: ProjectId, page: Page) -> Result<Paginated<Inbox>> {
        paginate(
            &self.pool,
            "SELECT COUNT(*) FROM inboxes WHERE project_id = ?",
            r"
            SELECT id, project_id, email, created_at, updated_at
            FROM inboxes
            WHERE project_id = ?
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            ",
            Some(project_id.0),
            page,
            row_to_inbox,
        )
        .await
    }
}

/// Convert a database row to an `Inbox`.
fn row_to_inbox(row: &SqliteRow) -> Result<Inbox> {
    Ok(Inbox {
        id: Some(InboxId::new(row.try_get("id")?)),
        project_id: ProjectId::new(row.try_get("project_id")?),
        email: row.try_get("email")?,
        created_at: Some(get_timestamp(row, "created_at")?),
        updated_at: Some(get_timestamp(row, "updated_at")?),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::project::{Project, ProjectRepository};

    async fn setup() -> (InboxRepository, ProjectId) {
        let db = Database::in_memory().await.unwrap();
        let project = ProjectRepository::new(&db)
            .create(Project::new("P1"))
            .await
            .unwrap();
        (InboxRepository::new(&db), project.id.unwrap())
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let (repo, project_id) = setup().await;
        let inbox = repo
            .create(Inbox::new(project_id, "a@x.com"))
            .await
            .unwrap();

        assert_eq!(repo.find_by_email("a@x.com").await.unwrap(), Some(inbox));
        assert_eq!(repo.find_by_email("b@x.com").await.unwrap(), None);
        assert!(repo.get_by_email("b@x.com").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found_class() {
        let (repo, _) = setup().await;
        let err = repo
            .create(Inbox::new(ProjectId::new(999), "a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingParent { entity: "inbox" }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_project() {
        let (repo, project_id) = setup().await;
        for n in 0..3 {
            repo.create(Inbox::new(project_id, &format!("box{n}@x.com")))
                .await
                .unwrap();
        }

        let page = repo.list(project_id, Page::new(2, 0)).await.unwrap();
        assert_eq!(page.total(), 3);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].email, "box0@x.com");

        let other = repo.list(ProjectId::new(999), Page::default()).await.unwrap();
        assert!(other.is_empty());
        assert_eq!(other.total(), 0);
    }
}
