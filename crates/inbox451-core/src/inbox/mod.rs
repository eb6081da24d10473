//! Inboxes: the addresses a project receives mail on.

mod model;
mod repository;

pub use model::Inbox;
pub use repository::InboxRepository;
