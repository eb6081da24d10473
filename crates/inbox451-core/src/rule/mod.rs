//! Forwarding rules: exact-match predicates that route mail to an inbox.

mod model;
mod repository;

pub use model::ForwardRule;
pub use repository::{RuleRepository, RuleScope};
