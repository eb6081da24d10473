//! Project storage repository.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::Project;
use crate::Result;
use crate::id::{ProjectId, UserId};
use crate::storage::sql::{found, get_timestamp, now, require_id, timestamp, write_error};
use crate::storage::{Database, Page, Paginated, Repository, repository::paginate};

/// Which projects a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    /// Every project.
    All,
    /// Projects the user is a member of.
    Member(UserId),
}

/// Repository for project storage and retrieval.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    /// Create a repository on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

impl Repository for ProjectRepository {
    type Entity = Project;
    type Id = ProjectId;
    type Scope = ProjectScope;

    const ENTITY: &'static str = "project";

    async fn create(&self, mut project: Project) -> Result<Project> {
        let at = now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO projects (name, created_at, updated_at)
            VALUES (?, ?, ?)
            RETURNING id
            ",
        )
        .bind(&project.name)
        .bind(timestamp(at))
        .bind(timestamp(at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, &project.name))?;

        project.id = Some(ProjectId::new(id));
        project.created_at = Some(at);
        project.updated_at = Some(at);
        Ok(project)
    }

    async fn get(&self, id: ProjectId) -> Result<Project> {
        let row = sqlx::query(
            r"
            SELECT id, name, created_at, updated_at
            FROM projects
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row_to_project(&found(row, Self::ENTITY, id)?)
    }

    async fn update(&self, project: &mut Project) -> Result<()> {
        let id = require_id(project.id, Self::ENTITY)?;
        let at = now();
        let updated: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE projects SET name = ?, updated_at = ?
            WHERE id = ?
            RETURNING id
            ",
        )
        .bind(&project.name)
        .bind(timestamp(at))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, &project.name))?;

        found(updated, Self::ENTITY, id)?;
        project.updated_at = Some(at);
        Ok(())
    }

    async fn delete(&self, id: ProjectId) -> Result<()> {
        let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM projects WHERE id = ? RETURNING id")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        found(deleted, Self::ENTITY, id).map(drop)
    }

    async fn list(&self, scope: ProjectScope, page: Page) -> Result<Paginated<Project>> {
        match scope {
            ProjectScope::All => {
                paginate(
                    &self.pool,
                    "SELECT COUNT(*) FROM projects",
                    r"
                    SELECT id, name, created_at, updated_at
                    FROM projects
                    ORDER BY id ASC
                    LIMIT ? OFFSET ?
                    ",
                    None,
                    page,
                    row_to_project,
                )
                .await
            }
            ProjectScope::Member(user_id) => {
                paginate(
                    &self.pool,
                    r"
                    SELECT COUNT(*)
                    FROM projects p
                    INNER JOIN project_users pu ON pu.project_id = p.id
                    WHERE pu.user_id = ?
                    ",
                    r"
                    SELECT p.id, p.name, p.created_at, p.updated_at
                    FROM projects p
                    INNER JOIN project_users pu ON pu.project_id = p.id
                    WHERE pu.user_id = ?
                    ORDER BY p.id ASC
                    LIMIT ? OFFSET ?
                    ",
                    Some(user_id.0),
                    page,
                    row_to_project,
                )
                .await
            }
        }
    }
}

/// Convert a database row to a `Project`.
fn row_to_project(row: &SqliteRow) -> Result<Project> {
    Ok(Project {
        id: Some(ProjectId::new(row.try_get("id")?)),
        name: row.try_get("name")?,
        created_at: Some(get_timestamp(row, "created_at")?),
        updated_at: Some(get_timestamp(row, "updated_at")?),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;

    async fn repo() -> ProjectRepository {
        ProjectRepository::new(&Database::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_retrieve_project() {
        let repo = repo().await;

        let project = repo.create(Project::new("P1")).await.unwrap();
        assert!(project.id.is_some());
        assert!(project.created_at.is_some());

        let retrieved = repo.get(project.id.unwrap()).await.unwrap();
        assert_eq!(retrieved, project);
    }

    #[tokio::test]
    async fn test_update_project() {
        let repo = repo().await;
        let mut project = repo.create(Project::new("Before")).await.unwrap();

        project.name = "After".to_string();
        repo.update(&mut project).await.unwrap();

        let retrieved = repo.get(project.id.unwrap()).await.unwrap();
        assert_eq!(retrieved.name, "After");
    }

    #[tokio::test]
    async fn test_blank_name_rejected_by_schema() {
        let repo = repo().await;
        let err = repo.create(Project::new("  ")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_project() {
        let repo = repo().await;
        let id = ProjectId::new(99);

        assert!(repo.get(id).await.unwrap_err().is_not_found());
        assert!(repo.delete(id).await.unwrap_err().is_not_found());

        let mut ghost = Project::new("ghost");
        ghost.id = Some(id);
        assert!(repo.update(&mut ghost).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_pages_in_id_order() {
        let repo = repo().await;
        for name in ["a", "b", "c"] {
            repo.create(Project::new(name)).await.unwrap();
        }

        let page = repo.list(ProjectScope::All, Page::new(2, 1)).await.unwrap();
        assert_eq!(page.total(), 3);
        let names: Vec<_> = page.data.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let repo = repo().await;
        let page = repo.list(ProjectScope::All, Page::new(10, 0)).await.unwrap();
        assert_eq!(page.total(), 0);
        assert!(page.is_empty());
    }
}
