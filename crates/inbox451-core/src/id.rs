//! Typed primary keys.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            #[doc = concat!("Create a new `", stringify!($name), "`.")]
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a project.
    ProjectId
);
entity_id!(
    /// Unique identifier for a user.
    UserId
);
entity_id!(
    /// Unique identifier for a project membership row.
    MembershipId
);
entity_id!(
    /// Unique identifier for an inbox.
    InboxId
);
entity_id!(
    /// Unique identifier for a forward rule.
    RuleId
);
entity_id!(
    /// Unique identifier for a stored message.
    MessageId
);
entity_id!(
    /// Unique identifier for an API token.
    TokenId
);
