//! # inbox451-core
//!
//! Core business logic for the `inbox451` multi-tenant mailbox service.
//!
//! This crate provides:
//! - Domain models (projects, users, memberships, inboxes, forward rules,
//!   messages, API tokens)
//! - Local storage (`SQLite`) behind a paginated repository contract
//! - **Routing** - exact-match forward rules with an inbox-address fallback
//! - **Ingestion** - the pipeline a mail listener hands inbound envelopes to
//! - Tenancy and token services
//! - Configuration loading

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod id;
pub mod inbox;
pub mod ingest;
pub mod message;
pub mod project;
pub mod routing;
pub mod rule;
pub mod service;
pub mod storage;
pub mod token;
pub mod user;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use id::{InboxId, MembershipId, MessageId, ProjectId, RuleId, TokenId, UserId};
pub use inbox::{Inbox, InboxRepository};
pub use ingest::{Delivery, Envelope, IngestPipeline, Route};
pub use message::{Message, MessageRepository};
pub use project::{
    MembershipRepository, MembershipScope, Project, ProjectMember, ProjectRepository, ProjectRole,
    ProjectScope,
};
pub use routing::{InboxResolver, RoutingTable, find_matching_rule, normalize_address};
pub use rule::{ForwardRule, RuleRepository, RuleScope};
pub use service::{
    InboxService, MessageService, ProjectService, RuleService, Services, TokenService,
    UserService,
};
pub use storage::{Database, Page, Paginated, Pagination, Repository, with_deadline};
pub use token::{DEFAULT_TOKEN_NAME, Token, TokenRepository};
pub use user::{User, UserRepository, UserRole, UserStatus};
