//! Inbox operations.

use tracing::{debug, info};

use crate::Result;
use crate::id::{InboxId, ProjectId};
use crate::inbox::{Inbox, InboxRepository};
use crate::routing::normalize_address;
use crate::storage::{Database, Page, Paginated, Repository};

/// Manages the inboxes of each project.
#[derive(Debug, Clone)]
pub struct InboxService {
    inboxes: InboxRepository,
}

impl InboxService {
    /// Create the service on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            inboxes: InboxRepository::new(db),
        }
    }

    /// Create an inbox. The address is normalized first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] for a malformed address,
    /// [`crate::Error::Conflict`] if any project already owns it, or
    /// [`crate::Error::MissingParent`] if the project does not exist.
    pub async fn create(&self, mut inbox: Inbox) -> Result<Inbox> {
        inbox.normalize();
        let email = inbox.email.clone();
        inbox
            .validate()
            .inspect_err(|e| e.log("Create inbox", &email))?;
        let inbox = self
            .inboxes
            .create(inbox)
            .await
            .inspect_err(|e| e.log("Create inbox", &email))?;
        info!(inbox_id = ?inbox.id, project_id = %inbox.project_id, "Created inbox {email}");
        Ok(inbox)
    }

    /// Get an inbox by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the inbox does not exist.
    pub async fn get(&self, id: InboxId) -> Result<Inbox> {
        debug!("Loading inbox {id}");
        self.inboxes
            .get(id)
            .await
            .inspect_err(|e| e.log("Get inbox", &id))
    }

    /// Get the inbox that owns `email`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if no inbox has that address.
    pub async fn get_by_email(&self, email: &str) -> Result<Inbox> {
        let email = normalize_address(email);
        self.inboxes
            .get_by_email(&email)
            .await
            .inspect_err(|e| e.log("Get inbox", &email))
    }

    /// Save changes to an inbox.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the inbox does not exist,
    /// [`crate::Error::Validation`] for a malformed address or
    /// [`crate::Error::Conflict`] if the new address is taken.
    pub async fn update(&self, inbox: &mut Inbox) -> Result<()> {
        inbox.normalize();
        inbox
            .validate()
            .inspect_err(|e| e.log("Update inbox", &inbox.email))?;
        self.inboxes
            .update(inbox)
            .await
            .inspect_err(|e| e.log("Update inbox", &inbox.email))?;
        info!(inbox_id = ?inbox.id, "Updated inbox {}", inbox.email);
        Ok(())
    }

    /// Delete an inbox with its rules and messages.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the inbox does not exist.
    pub async fn delete(&self, id: InboxId) -> Result<()> {
        self.inboxes
            .delete(id)
            .await
            .inspect_err(|e| e.log("Delete inbox", &id))?;
        info!("Deleted inbox {id}");
        Ok(())
    }

    /// List the inboxes of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_project(
        &self,
        project_id: ProjectId,
        page: Page,
    ) -> Result<Paginated<Inbox>> {
        self.inboxes
            .list(project_id, page)
            .await
            .inspect_err(|e| e.log("List inboxes", &project_id))
    }
}
