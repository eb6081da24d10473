//! Service layer.
//!
//! Each service validates input, calls into its repositories and logs the
//! outcome with entity and id context before handing errors back unchanged.
//! [`Services`] wires all of them, plus the ingestion pipeline, onto one
//! database.

mod inbox;
mod message;
mod project;
mod rule;
mod token;
mod user;

pub use inbox::InboxService;
pub use message::MessageService;
pub use project::ProjectService;
pub use rule::RuleService;
pub use token::TokenService;
pub use user::UserService;

use tracing::info;

use crate::Result;
use crate::config::Config;
use crate::ingest::IngestPipeline;
use crate::storage::Database;

/// Every service, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct Services {
    /// Shared database handle.
    pub db: Database,
    /// Projects and memberships.
    pub projects: ProjectService,
    /// User accounts.
    pub users: UserService,
    /// Inboxes.
    pub inboxes: InboxService,
    /// Forward rules.
    pub rules: RuleService,
    /// Stored messages.
    pub messages: MessageService,
    /// API tokens.
    pub tokens: TokenService,
    /// Inbound mail pipeline, with the configured deadline.
    pub ingest: IngestPipeline,
}

impl Services {
    /// Connect to the configured database and build every service.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn connect(config: &Config) -> Result<Self> {
        let db = Database::connect(&config.database).await?;
        info!("Database ready at {}", config.database.url);
        Ok(Self::new(db, config))
    }

    /// Build every service on an existing database.
    #[must_use]
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            projects: ProjectService::new(&db),
            users: UserService::new(&db),
            inboxes: InboxService::new(&db),
            rules: RuleService::new(&db),
            messages: MessageService::new(&db),
            tokens: TokenService::new(&db),
            ingest: IngestPipeline::new(&db).with_timeout(config.ingest.timeout()),
            db,
        }
    }
}
