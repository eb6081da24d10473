//! Stored message operations.
//!
//! Messages are only ever created by the ingestion pipeline; this service
//! reads them, toggles the read flag and deletes them.

use tracing::{debug, info};

use crate::Result;
use crate::id::{InboxId, MessageId};
use crate::message::{Message, MessageRepository};
use crate::storage::{Database, Page, Paginated, Repository};

/// Read access and housekeeping for stored messages.
#[derive(Debug, Clone)]
pub struct MessageService {
    messages: MessageRepository,
}

impl MessageService {
    /// Create the service on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            messages: MessageRepository::new(db),
        }
    }

    /// Get a message by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the message does not exist.
    pub async fn get(&self, id: MessageId) -> Result<Message> {
        debug!("Loading message {id}");
        self.messages
            .get(id)
            .await
            .inspect_err(|e| e.log("Get message", &id))
    }

    /// Mark a message read or unread.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the message does not exist.
    pub async fn set_read(&self, id: MessageId, is_read: bool) -> Result<()> {
        self.messages
            .set_read(id, is_read)
            .await
            .inspect_err(|e| e.log("Set read flag", &id))?;
        debug!("Message {id} read={is_read}");
        Ok(())
    }

    /// Delete a message.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the message does not exist.
    pub async fn delete(&self, id: MessageId) -> Result<()> {
        self.messages
            .delete(id)
            .await
            .inspect_err(|e| e.log("Delete message", &id))?;
        info!("Deleted message {id}");
        Ok(())
    }

    /// List the messages of an inbox, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_inbox(&self, inbox_id: InboxId, page: Page) -> Result<Paginated<Message>> {
        self.messages
            .list(inbox_id, page)
            .await
            .inspect_err(|e| e.log("List messages", &inbox_id))
    }
}
