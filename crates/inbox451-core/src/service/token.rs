//! API token issuance and authentication.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::id::{TokenId, UserId};
use crate::storage::{Database, Page, Paginated, Repository};
use crate::token::{Token, TokenRepository};
use crate::user::{User, UserRepository};
use crate::{Error, Result};

/// Issues, lists, revokes and checks API tokens.
///
/// Every per-user operation is filtered by the requesting user's id.
#[derive(Debug, Clone)]
pub struct TokenService {
    tokens: TokenRepository,
    users: UserRepository,
}

impl TokenService {
    /// Create the service on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            tokens: TokenRepository::new(db),
            users: UserRepository::new(db),
        }
    }

    /// Issue a new token for `user_id`.
    ///
    /// The name defaults to [`crate::token::DEFAULT_TOKEN_NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParent`] if the user does not exist.
    pub async fn create_for_user(
        &self,
        user_id: UserId,
        name: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Token> {
        let token = self
            .tokens
            .create(Token::issue(user_id, name, expires_at))
            .await
            .inspect_err(|e| e.log("Create token", &user_id))?;
        info!(token_id = ?token.id, "Issued token {:?} for user {user_id}", token.name);
        Ok(token)
    }

    /// Get one of `user_id`'s tokens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the token does not exist or belongs to
    /// someone else.
    pub async fn get_by_user(&self, token_id: TokenId, user_id: UserId) -> Result<Token> {
        debug!("Loading token {token_id} for user {user_id}");
        self.tokens
            .get_by_user(token_id, user_id)
            .await
            .inspect_err(|e| e.log("Get token", &token_id))
    }

    /// Revoke one of `user_id`'s tokens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the token does not exist or belongs to
    /// someone else.
    pub async fn delete_by_user(&self, user_id: UserId, token_id: TokenId) -> Result<()> {
        self.tokens
            .delete_by_user(user_id, token_id)
            .await
            .inspect_err(|e| e.log("Delete token", &token_id))?;
        info!("Revoked token {token_id} of user {user_id}");
        Ok(())
    }

    /// List `user_id`'s tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_user(&self, user_id: UserId, page: Page) -> Result<Paginated<Token>> {
        self.tokens
            .list(user_id, page)
            .await
            .inspect_err(|e| e.log("List tokens", &user_id))
    }

    /// Resolve a presented token value to its owner and stamp its use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the value is unknown or expired, or the
    /// owner is inactive.
    pub async fn authenticate(&self, value: &str) -> Result<User> {
        self.check(value)
            .await
            .inspect_err(|e| e.log("Authenticate token", &"presented"))
    }

    async fn check(&self, value: &str) -> Result<User> {
        // The presented value never appears in errors or logs.
        let unknown = || Error::not_found(TokenRepository::ENTITY, "presented value");

        let token = self.tokens.find_by_value(value).await?.ok_or_else(unknown)?;
        if token.is_expired_at(Utc::now()) {
            debug!(token_id = ?token.id, "Rejected expired token");
            return Err(unknown());
        }

        let user = self.users.get(token.user_id).await?;
        if !user.is_active() {
            debug!("Rejected token of inactive user {}", token.user_id);
            return Err(unknown());
        }

        if let Some(id) = token.id {
            self.tokens.touch(id).await?;
        }
        Ok(user)
    }
}
