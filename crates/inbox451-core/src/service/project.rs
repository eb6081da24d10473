//! Project and membership operations.

use tracing::{debug, info};

use crate::id::{ProjectId, UserId};
use crate::project::{
    MembershipRepository, MembershipScope, Project, ProjectMember, ProjectRepository, ProjectRole,
    ProjectScope,
};
use crate::storage::{Database, Page, Paginated, Repository};
use crate::{Error, Result};

/// Manages projects and the users that belong to them.
#[derive(Debug, Clone)]
pub struct ProjectService {
    projects: ProjectRepository,
    members: MembershipRepository,
}

impl ProjectService {
    /// Create the service on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            projects: ProjectRepository::new(db),
            members: MembershipRepository::new(db),
        }
    }

    /// Create a project.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] for a blank or overlong name, or a
    /// storage error.
    pub async fn create(&self, project: Project) -> Result<Project> {
        let name = project.name.clone();
        project
            .validate()
            .inspect_err(|e| e.log("Create project", &name))?;
        let project = self
            .projects
            .create(project)
            .await
            .inspect_err(|e| e.log("Create project", &name))?;
        info!(project_id = ?project.id, "Created project {}", project.name);
        Ok(project)
    }

    /// Get a project by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the project does not exist.
    pub async fn get(&self, id: ProjectId) -> Result<Project> {
        debug!("Loading project {id}");
        self.projects
            .get(id)
            .await
            .inspect_err(|e| e.log("Get project", &id))
    }

    /// Save changes to a project.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the project does not exist, or
    /// [`crate::Error::Validation`] for a bad name.
    pub async fn update(&self, project: &mut Project) -> Result<()> {
        project
            .validate()
            .inspect_err(|e| e.log("Update project", &project.name))?;
        self.projects
            .update(project)
            .await
            .inspect_err(|e| e.log("Update project", &project.name))?;
        info!(project_id = ?project.id, "Updated project");
        Ok(())
    }

    /// Delete a project with its inboxes, rules, messages and memberships.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the project does not exist.
    pub async fn delete(&self, id: ProjectId) -> Result<()> {
        self.projects
            .delete(id)
            .await
            .inspect_err(|e| e.log("Delete project", &id))?;
        info!("Deleted project {id}");
        Ok(())
    }

    /// List every project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, page: Page) -> Result<Paginated<Project>> {
        self.projects
            .list(ProjectScope::All, page)
            .await
            .inspect_err(|e| e.log("List projects", &"all"))
    }

    /// List the projects `user_id` is a member of.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: UserId, page: Page) -> Result<Paginated<Project>> {
        self.projects
            .list(ProjectScope::Member(user_id), page)
            .await
            .inspect_err(|e| e.log("List projects", &user_id))
    }

    /// Grant `user_id` a role in `project_id`.
    ///
    /// Adding an existing member is an error, not a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Conflict`] if the user is already a member, or
    /// [`crate::Error::MissingParent`] if either side does not exist.
    pub async fn add_user(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: ProjectRole,
    ) -> Result<ProjectMember> {
        let member = self
            .members
            .create(ProjectMember::new(project_id, user_id, role))
            .await
            .inspect_err(|e| e.log("Add project member", &user_id))?;
        info!(
            "Added user {user_id} to project {project_id} as {}",
            role.as_str()
        );
        Ok(member)
    }

    /// Revoke the membership of `user_id` in `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the user is not a member.
    pub async fn remove_user(&self, project_id: ProjectId, user_id: UserId) -> Result<()> {
        self.members
            .remove(project_id, user_id)
            .await
            .inspect_err(|e| e.log("Remove project member", &user_id))?;
        info!("Removed user {user_id} from project {project_id}");
        Ok(())
    }

    /// The membership of `user_id` in `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the user is not a member.
    pub async fn membership(&self, project_id: ProjectId, user_id: UserId) -> Result<ProjectMember> {
        self.members
            .find(project_id, user_id)
            .await
            .and_then(|member| {
                member.ok_or_else(|| {
                    Error::not_found(
                        MembershipRepository::ENTITY,
                        format!("project {project_id} / user {user_id}"),
                    )
                })
            })
            .inspect_err(|e| e.log("Get project member", &user_id))
    }

    /// Change the role of an existing member.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the user is not a member.
    pub async fn set_role(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: ProjectRole,
    ) -> Result<ProjectMember> {
        let mut member = self.membership(project_id, user_id).await?;
        member.role = role;
        self.members
            .update(&mut member)
            .await
            .inspect_err(|e| e.log("Update project member", &user_id))?;
        info!("User {user_id} is now {} in project {project_id}", role.as_str());
        Ok(member)
    }

    /// List the members of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_members(
        &self,
        project_id: ProjectId,
        page: Page,
    ) -> Result<Paginated<ProjectMember>> {
        self.members
            .list(MembershipScope::Project(project_id), page)
            .await
            .inspect_err(|e| e.log("List project members", &project_id))
    }
}
