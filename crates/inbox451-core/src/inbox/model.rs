//! Inbox model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::id::{InboxId, ProjectId};
use crate::routing::{normalize_address, validate_address};

/// An address-bound mailbox owned by a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbox {
    /// Unique identifier (None for unsaved inboxes).
    pub id: Option<InboxId>,
    /// Owning project.
    pub project_id: ProjectId,
    /// Receiving address, unique across all projects.
    pub email: String,
    /// When the inbox was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the inbox was last modified.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Inbox {
    /// Create an unsaved inbox. The address is normalized.
    #[must_use]
    pub fn new(project_id: ProjectId, email: &str) -> Self {
        Self {
            id: None,
            project_id,
            email: normalize_address(email),
            created_at: None,
            updated_at: None,
        }
    }

    /// Bring the address into stored form.
    pub fn normalize(&mut self) {
        self.email = normalize_address(&self.email);
    }

    /// Check caller-supplied fields.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] if the address is malformed.
    pub fn validate(&self) -> Result<()> {
        validate_address(&self.email)
    }
}
