//! API token model and generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::id::{TokenId, UserId};

/// Name given to tokens created without one.
pub const DEFAULT_TOKEN_NAME: &str = "API Token";

/// Random bytes behind every token value.
const TOKEN_BYTES: usize = 32;

/// Length of a generated token value in characters.
pub const TOKEN_LENGTH: usize = 43;

/// An opaque credential bound to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Unique identifier (None for unsaved tokens).
    pub id: Option<TokenId>,
    /// Owner.
    pub user_id: UserId,
    /// The secret value presented by clients.
    pub token: String,
    /// Human-readable label.
    pub name: String,
    /// When the token stops working, if ever.
    pub expires_at: Option<DateTime<Utc>>,
    /// Last successful authentication.
    pub last_used_at: Option<DateTime<Utc>>,
    /// When the token was issued.
    pub created_at: Option<DateTime<Utc>>,
    /// When the token was last modified.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Issue a new, unsaved token with a fresh random value.
    #[must_use]
    pub fn issue(user_id: UserId, name: Option<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: None,
            user_id,
            token: generate_token(),
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_NAME.to_string()),
            expires_at,
            last_used_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns true if the token has an expiry at or before `at`.
    #[must_use]
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= at)
    }
}

/// Generate a token value: 32 bytes from the OS RNG, URL-safe base64
/// without padding.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
