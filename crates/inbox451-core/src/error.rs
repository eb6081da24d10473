//! Error types for the core library.

use std::fmt::Display;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::id::InboxId;

/// Coarse classification of an [`Error`].
///
/// Callers decide user-visible behaviour from the kind alone; the concrete
/// variant only carries context for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced row (by id, email or token value) does not exist.
    NotFound,
    /// A unique constraint was violated.
    Conflict,
    /// Ingestion found neither a rule nor an inbox for the receiver.
    AddressNotRecognized,
    /// Backend, connectivity or unexpected driver failure.
    Storage,
    /// Caller-supplied data is malformed.
    Validation,
}

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No row with the given key.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity name, e.g. `"inbox"`.
        entity: &'static str,
        /// The id, email or other key that was looked up.
        key: String,
    },

    /// A foreign key points at a parent row that does not exist.
    #[error("{entity} references a missing parent")]
    MissingParent {
        /// Entity that was being written.
        entity: &'static str,
    },

    /// Unique constraint violation.
    #[error("{entity} already exists: {key}")]
    Conflict {
        /// Entity that was being written.
        entity: &'static str,
        /// The conflicting key as supplied by the caller.
        key: String,
    },

    /// No rule matched and no inbox owns the receiver address.
    #[error("No inbox or rule accepts mail for {0}")]
    AddressNotRecognized(String),

    /// The routed inbox was deleted before the message was stored.
    #[error("Inbox {0} disappeared before the message was stored")]
    InboxVanished(InboxId),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An operation exceeded its deadline and was aborted.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// A stored column could not be decoded.
    #[error("Corrupt value in column {column}: {value}")]
    CorruptRow {
        /// Column name.
        column: &'static str,
        /// Raw stored value.
        value: String,
    },

    /// Caller-supplied data is malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Password hashing or verification failed.
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a not-found error for `entity` keyed by `key`.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Create a conflict error for `entity` keyed by `key`.
    pub fn conflict(entity: &'static str, key: impl ToString) -> Self {
        Self::Conflict {
            entity,
            key: key.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::MissingParent { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::AddressNotRecognized(_) => ErrorKind::AddressNotRecognized,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Database(_)
            | Self::InboxVanished(_)
            | Self::Timeout(_)
            | Self::CorruptRow { .. }
            | Self::PasswordHash(_)
            | Self::Config(_)
            | Self::Serde(_)
            | Self::Io(_) => ErrorKind::Storage,
        }
    }

    /// Returns true for not-found class errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }

    /// HTTP status an API layer should answer with.
    ///
    /// Not-found maps to 404 and validation to 400; everything else,
    /// conflicts included, is a 500.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation => 400,
            ErrorKind::Conflict | ErrorKind::AddressNotRecognized | ErrorKind::Storage => 500,
        }
    }

    /// Log this error against the operation and key that produced it.
    ///
    /// Storage failures are errors; caller mistakes are warnings; lookups
    /// that simply miss are debug noise.
    pub(crate) fn log(&self, action: &str, key: &dyn Display) {
        match self.kind() {
            ErrorKind::Storage => error!(%key, "{action} failed: {self}"),
            ErrorKind::Conflict | ErrorKind::Validation => warn!(%key, "{action} rejected: {self}"),
            ErrorKind::NotFound | ErrorKind::AddressNotRecognized => {
                debug!(%key, "{action}: {self}");
            }
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(Error::not_found("inbox", 7).http_status(), 404);
        assert_eq!(Error::MissingParent { entity: "inbox" }.http_status(), 404);
        assert_eq!(Error::validation("limit").http_status(), 400);
        assert_eq!(Error::conflict("inbox", "a@x.com").http_status(), 500);
        assert_eq!(
            Error::AddressNotRecognized("c@x.com".into()).http_status(),
            500
        );
        assert_eq!(Error::Timeout(Duration::from_secs(1)).http_status(), 500);
        assert_eq!(Error::InboxVanished(InboxId::new(3)).http_status(), 500);
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::not_found("forward rule", 42);
        assert_eq!(err.to_string(), "forward rule not found: 42");
        assert!(err.is_not_found());
    }
}
