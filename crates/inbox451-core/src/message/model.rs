//! Stored message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{InboxId, MessageId};

/// A received message, filed under exactly one inbox.
///
/// Only the read flag changes after ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier (None until stored).
    pub id: Option<MessageId>,
    /// Inbox the message was routed to.
    pub inbox_id: InboxId,
    /// Envelope sender.
    pub sender: String,
    /// Envelope receiver.
    pub receiver: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Whether the message has been read.
    pub is_read: bool,
    /// When the message was stored.
    pub created_at: Option<DateTime<Utc>>,
    /// When the read flag last changed.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create an unsaved, unread message.
    #[must_use]
    pub fn new(
        inbox_id: InboxId,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            inbox_id,
            sender: sender.into(),
            receiver: receiver.into(),
            subject: subject.into(),
            body: body.into(),
            is_read: false,
            created_at: None,
            updated_at: None,
        }
    }
}
