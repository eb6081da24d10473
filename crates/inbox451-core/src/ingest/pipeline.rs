//! Message ingestion: rule match, then address fallback, then persist.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::envelope::Envelope;
use crate::id::{InboxId, RuleId};
use crate::inbox::InboxRepository;
use crate::message::{Message, MessageRepository};
use crate::routing::{InboxResolver, RoutingTable};
use crate::rule::RuleRepository;
use crate::storage::sql::require_id;
use crate::storage::{Database, Repository, with_deadline};
use crate::{Error, Result};

/// How a delivered message found its inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// A forward rule matched.
    Rule(RuleId),
    /// No rule matched; an inbox owns the receiver address.
    Address,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(id) => write!(f, "rule {id}"),
            Self::Address => f.write_str("address"),
        }
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// The stored message.
    pub message: Message,
    /// The route taken.
    pub route: Route,
}

/// Routes envelopes to inboxes and stores them.
///
/// Holds no mutable state; clone it freely across listener tasks.
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    rules: RuleRepository,
    resolver: InboxResolver,
    messages: MessageRepository,
    timeout: Option<Duration>,
}

impl IngestPipeline {
    /// Create a pipeline on the shared database, without a deadline.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            rules: RuleRepository::new(db),
            resolver: InboxResolver::new(InboxRepository::new(db)),
            messages: MessageRepository::new(db),
            timeout: None,
        }
    }

    /// Abort any single ingestion that runs longer than `limit`.
    #[must_use]
    pub const fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Route `envelope` and store it as an unread message.
    ///
    /// The envelope's addresses are compared as given; build it with
    /// [`Envelope::new`] or [`Envelope::from_rfc822`] to get them normalized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressNotRecognized`] if neither a rule nor an inbox
    /// accepts the receiver (nothing is stored), [`Error::Timeout`] if the
    /// configured deadline expires, or a storage error.
    pub async fn ingest(&self, envelope: &Envelope) -> Result<Delivery> {
        let result = match self.timeout {
            Some(limit) => with_deadline(limit, self.deliver(envelope)).await,
            None => self.deliver(envelope).await,
        };

        result
            .inspect(|delivery| {
                info!(
                    message_id = ?delivery.message.id,
                    inbox_id = %delivery.message.inbox_id,
                    route = %delivery.route,
                    "Delivered mail from {} to {}",
                    envelope.sender,
                    envelope.receiver
                );
            })
            .inspect_err(|e| match e {
                Error::AddressNotRecognized(address) => {
                    warn!(sender = %envelope.sender, "Rejected mail for unknown address {address}");
                }
                other => other.log("Ingest", &envelope.receiver),
            })
    }

    async fn deliver(&self, envelope: &Envelope) -> Result<Delivery> {
        let table = RoutingTable::new(self.rules.all().await?);
        let (inbox_id, route) = self.route(&table, envelope).await?;
        let message = self.persist(inbox_id, envelope).await?;
        Ok(Delivery { message, route })
    }

    /// Store `envelope` unread in `inbox_id`.
    ///
    /// The inbox was resolved moments ago, so a missing parent here means it
    /// was deleted concurrently. That is a backend failure, not a lookup miss.
    async fn persist(&self, inbox_id: InboxId, envelope: &Envelope) -> Result<Message> {
        let message = Message::new(
            inbox_id,
            envelope.sender.as_str(),
            envelope.receiver.as_str(),
            envelope.subject.as_str(),
            envelope.body_text(),
        );
        self.messages
            .create(message)
            .await
            .map_err(|e| match e {
                Error::MissingParent { .. } => Error::InboxVanished(inbox_id),
                other => other,
            })
    }

    async fn route(&self, table: &RoutingTable, envelope: &Envelope) -> Result<(InboxId, Route)> {
        if let Some(rule) = table.route(envelope) {
            let rule_id = require_id(rule.id, RuleRepository::ENTITY)?;
            debug!("Rule {rule_id} matched mail for {}", envelope.receiver);
            return Ok((rule.inbox_id, Route::Rule(rule_id)));
        }

        debug!(
            "No rule among {} matched, resolving {} by address",
            table.len(),
            envelope.receiver
        );
        let inbox = self.resolver.resolve(&envelope.receiver).await?;
        let inbox_id = require_id(inbox.id, InboxRepository::ENTITY)?;
        Ok((inbox_id, Route::Address))
    }
}
