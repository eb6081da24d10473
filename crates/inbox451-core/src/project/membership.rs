//! Project membership storage (the project/user join table).

use std::fmt;

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::{ProjectMember, ProjectRole};
use crate::Result;
use crate::id::{MembershipId, ProjectId, UserId};
use crate::storage::sql::{found, get_timestamp, now, require_id, timestamp, write_error};
use crate::storage::{Database, Page, Paginated, Repository, repository::paginate};

/// Which side of the join a membership listing is filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipScope {
    /// Members of one project.
    Project(ProjectId),
    /// Memberships held by one user.
    User(UserId),
}

/// The natural key of a membership, used in error messages.
struct Pair(ProjectId, UserId);

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project {} / user {}", self.0, self.1)
    }
}

/// Repository for project memberships.
#[derive(Debug, Clone)]
pub struct MembershipRepository {
    pool: SqlitePool,
}

impl MembershipRepository {
    /// Create a repository on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Look up the membership of `user_id` in `project_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<ProjectMember>> {
        let row = sqlx::query(
            r"
            SELECT id, project_id, user_id, role, created_at, updated_at
            FROM project_users
            WHERE project_id = ? AND user_id = ?
            ",
        )
        .bind(project_id.0)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_member).transpose()
    }

    /// Delete the membership of `user_id` in `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the user is not a member.
    pub async fn remove(&self, project_id: ProjectId, user_id: UserId) -> Result<()> {
        let deleted: Option<i64> = sqlx::query_scalar(
            r"
            DELETE FROM project_users
            WHERE project_id = ? AND user_id = ?
            RETURNING id
            ",
        )
        .bind(project_id.0)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        found(deleted, Self::ENTITY, Pair(project_id, user_id)).map(drop)
    }
}

impl Repository for MembershipRepository {
    type Entity = ProjectMember;
    type Id = MembershipId;
    type Scope = MembershipScope;

    const ENTITY: &'static str = "project member";

    async fn create(&self, mut member: ProjectMember) -> Result<ProjectMember> {
        let at = now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO project_users (project_id, user_id, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(member.project_id.0)
        .bind(member.user_id.0)
        .bind(member.role.as_str())
        .bind(timestamp(at))
        .bind(timestamp(at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, Self::ENTITY, Pair(member.project_id, member.user_id)))?;

        member.id = Some(MembershipId::new(id));
        member.created_at = Some(at);
        member.updated_at = Some(at);
        Ok(member)
    }

    async fn get(&self, id: MembershipId) -> Result<ProjectMember> {
        let row = sqlx::query(
            r"
            SELECT id, project_id, user_id, role, created_at, updated_at
            FROM project_users
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row_to_member(&found(row, Self::ENTITY, id)?)
    }

    /// Only the role is mutable; moving a membership means remove + create.
    async fn update(&self, member: &mut ProjectMember) -> Result<()> {
        let id = require_id(member.id, Self::ENTITY)?;
        let at = now();
        let updated: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE project_users SET role = ?, updated_at = ?
            WHERE id = ?
            RETURNING id
            ",
        )
        .bind(member.role.as_str())
        .bind(timestamp(at))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        found(updated, Self::ENTITY, id)?;
        member.updated_at = Some(at);
        Ok(())
    }

    async fn delete(&self, id: MembershipId) -> Result<()> {
        let deleted: Option<i64> =
            sqlx::query_scalar("DELETE FROM project_users WHERE id = ? RETURNING id")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        found(deleted, Self::ENTITY, id).map(drop)
    }

    async fn list(&self, scope: MembershipScope, page: Page) -> Result<Paginated<ProjectMember>> {
        let (count_sql, select_sql, key) = match scope {
            MembershipScope::Project(project_id) => (
                "SELECT COUNT(*) FROM project_users WHERE project_id = ?",
                r"
                SELECT id, project_id, user_id, role, created_at, updated_at
                FROM project_users
                WHERE project_id = ?
                ORDER BY id ASC
                LIMIT ? OFFSET ?
                ",
                project_id.0,
            ),
            MembershipScope::User(user_id) => (
                "SELECT COUNT(*) FROM project_users WHERE user_id = ?",
                r"
                SELECT id, project_id, user_id, role, created_at, updated_at
                FROM project_users
                WHERE user_id = ?
                ORDER BY id ASC
                LIMIT ? OFFSET ?
                ",
                user_id.0,
            ),
        };

        paginate(&self.pool, count_sql, select_sql, Some(key), page, row_to_member).await
    }
}

/// Convert a database row to a `ProjectMember`.
fn row_to_member(row: &SqliteRow) -> Result<ProjectMember> {
    Ok(ProjectMember {
        id: Some(MembershipId::new(row.try_get("id")?)),
        project_id: ProjectId::new(row.try_get("project_id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        role: ProjectRole::parse(row.try_get("role")?),
        created_at: Some(get_timestamp(row, "created_at")?),
        updated_at: Some(get_timestamp(row, "updated_at")?),
    })
}
