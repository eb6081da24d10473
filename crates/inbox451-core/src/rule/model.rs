//! Forwarding rule model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{InboxId, RuleId};
use crate::routing::{normalize_address, validate_address};
use crate::{Error, Result};

/// Routes mail with an exact sender, receiver and subject to an inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardRule {
    /// Unique identifier (None for unsaved rules).
    pub id: Option<RuleId>,
    /// Inbox that receives matching mail.
    pub inbox_id: InboxId,
    /// Envelope sender to match.
    pub sender: String,
    /// Envelope receiver to match.
    pub receiver: String,
    /// Subject to match, byte for byte.
    pub subject: String,
    /// When the rule was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the rule was last modified.
    pub updated_at: Option<DateTime<Utc>>,
}

impl ForwardRule {
    /// Create an unsaved rule. Addresses are normalized.
    #[must_use]
    pub fn new(
        inbox_id: InboxId,
        sender: &str,
        receiver: &str,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            inbox_id,
            sender: normalize_address(sender),
            receiver: normalize_address(receiver),
            subject: subject.into(),
            id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Bring the addresses into stored form.
    pub fn normalize(&mut self) {
        self.sender = normalize_address(&self.sender);
        self.receiver = normalize_address(&self.receiver);
    }

    /// Check caller-supplied fields.
    ///
    /// An empty sender or receiver is allowed and matches only an empty
    /// envelope field, such as the null sender of a bounce.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a non-empty address is malformed.
    pub fn validate(&self) -> Result<()> {
        for (field, address) in [("sender", &self.sender), ("receiver", &self.receiver)] {
            if !address.is_empty() && validate_address(address).is_err() {
                return Err(Error::validation(format!(
                    "forward rule {field} is not a valid address: {address:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_addresses() {
        let rule = ForwardRule::new(InboxId::new(1), "<S@Y.com>", "a@X.com", "Hi");
        assert_eq!(rule.sender, "S@y.com");
        assert_eq!(rule.receiver, "a@x.com");
        assert_eq!(rule.subject, "Hi");
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_invalid_sender() {
        let rule = ForwardRule::new(InboxId::new(1), "nobody", "a@x.com", "");
        let err = rule.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: forward rule sender is not a valid address: \"nobody\""
        );
    }

    #[test]
    fn test_empty_addresses_allowed() {
        let bounce = ForwardRule::new(InboxId::new(1), "<>", "a@x.com", "");
        assert_eq!(bounce.sender, "");
        assert!(bounce.validate().is_ok());
        assert!(ForwardRule::new(InboxId::new(1), "s@y.com", "", "Hi").validate().is_ok());
    }
}
