//! User models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;
use crate::{Error, Result};

/// System-wide role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular user.
    #[default]
    User,
    /// Administrator.
    Admin,
}

impl UserRole {
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

/// Whether an account may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Account is usable.
    #[default]
    Active,
    /// Account is disabled.
    Inactive,
}

impl UserStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "inactive" | "disabled" => Self::Inactive,
            _ => Self::Active,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// A person or service account that can log in and own API tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (None for unsaved users).
    pub id: Option<UserId>,
    /// Display name.
    pub name: String,
    /// Login name, unique.
    pub username: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Contact address, unique.
    pub email: String,
    /// Account status.
    pub status: UserStatus,
    /// System role.
    pub role: UserRole,
    /// Whether password login is allowed (tokens always are).
    pub password_login: bool,
    /// Last successful login.
    pub logged_in_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the user was last modified.
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create an unsaved, active user with password login enabled.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            email: email.into(),
            password_login: true,
            ..Self::default()
        }
    }

    /// Set the system role.
    #[must_use]
    pub const fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    /// Returns true if the account is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, UserStatus::Active)
    }

    /// Check caller-supplied fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the name, username or email is blank,
    /// or the email has no `@`.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("name is required"));
        }
        if self.username.trim().is_empty() {
            return Err(Error::validation("username is required"));
        }
        if !self.email.contains('@') {
            return Err(Error::validation(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        Ok(())
    }
}
