//! Project and membership models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{MembershipId, ProjectId, UserId};
use crate::{Error, Result};

/// Longest accepted project name, in characters.
pub const MAX_PROJECT_NAME: usize = 100;

/// A tenant: owns inboxes and grants access to users through memberships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier (None for unsaved projects).
    pub id: Option<ProjectId>,
    /// Display name.
    pub name: String,
    /// When the project was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the project was last modified.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create an unsaved project.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Check caller-supplied fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the name is blank or too long.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("project name is required"));
        }
        if self.name.chars().count() > MAX_PROJECT_NAME {
            return Err(Error::validation(format!(
                "project name must be at most {MAX_PROJECT_NAME} characters"
            )));
        }
        Ok(())
    }
}

/// Role a user holds within one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Regular member.
    #[default]
    User,
    /// Project administrator.
    Admin,
}

impl ProjectRole {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Membership of one user in one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    /// Unique identifier (None for unsaved rows).
    pub id: Option<MembershipId>,
    /// The project.
    pub project_id: ProjectId,
    /// The member.
    pub user_id: UserId,
    /// Role within the project.
    pub role: ProjectRole,
    /// When the membership was granted.
    pub created_at: Option<DateTime<Utc>>,
    /// When the role last changed.
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectMember {
    /// Create an unsaved membership.
    #[must_use]
    pub const fn new(project_id: ProjectId, user_id: UserId, role: ProjectRole) -> Self {
        Self {
            id: None,
            project_id,
            user_id,
            role,
            created_at: None,
            updated_at: None,
        }
    }
}
