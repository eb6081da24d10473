//! Routing of inbound mail: address normalization, the rule matcher and
//! the inbox resolver used when no rule matches.

mod address;
mod matcher;
mod resolver;

pub use address::{normalize_address, validate_address};
pub use matcher::{RoutingTable, find_matching_rule, rule_matches};
pub use resolver::InboxResolver;
