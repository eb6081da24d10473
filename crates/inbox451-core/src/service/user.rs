//! User accounts and password login.

use tracing::{debug, info};

use crate::id::UserId;
use crate::storage::{Database, Page, Paginated, Repository};
use crate::user::{User, UserRepository, hash_password, verify_password};
use crate::{Error, Result};

/// Manages user accounts.
#[derive(Debug, Clone)]
pub struct UserService {
    users: UserRepository,
}

impl UserService {
    /// Create the service on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            users: UserRepository::new(db),
        }
    }

    /// Create a user with the given plaintext password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for missing fields or an empty password,
    /// or [`Error::Conflict`] if the username or email is taken.
    pub async fn create(&self, mut user: User, password: &str) -> Result<User> {
        let username = user.username.clone();
        user.validate()
            .and_then(|()| check_password(password))
            .inspect_err(|e| e.log("Create user", &username))?;

        user.password_hash = hash_password(password)?;
        let user = self
            .users
            .create(user)
            .await
            .inspect_err(|e| e.log("Create user", &username))?;
        info!(user_id = ?user.id, "Created user {username}");
        Ok(user)
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user does not exist.
    pub async fn get(&self, id: UserId) -> Result<User> {
        debug!("Loading user {id}");
        self.users
            .get(id)
            .await
            .inspect_err(|e| e.log("Get user", &id))
    }

    /// Get a user by login name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no user has that username.
    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        self.users
            .get_by_username(username)
            .await
            .inspect_err(|e| e.log("Get user", &username))
    }

    /// Save profile changes. The password is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user does not exist,
    /// [`Error::Validation`] for bad fields or [`Error::Conflict`] if the new
    /// username or email is taken.
    pub async fn update(&self, user: &mut User) -> Result<()> {
        user.validate()
            .inspect_err(|e| e.log("Update user", &user.username))?;
        self.users
            .update(user)
            .await
            .inspect_err(|e| e.log("Update user", &user.username))?;
        info!(user_id = ?user.id, "Updated user {}", user.username);
        Ok(())
    }

    /// Delete a user with their tokens and memberships.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user does not exist.
    pub async fn delete(&self, id: UserId) -> Result<()> {
        self.users
            .delete(id)
            .await
            .inspect_err(|e| e.log("Delete user", &id))?;
        info!("Deleted user {id}");
        Ok(())
    }

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, page: Page) -> Result<Paginated<User>> {
        self.users
            .list((), page)
            .await
            .inspect_err(|e| e.log("List users", &"all"))
    }

    /// Replace a user's password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty password or
    /// [`Error::NotFound`] if the user does not exist.
    pub async fn set_password(&self, id: UserId, password: &str) -> Result<()> {
        check_password(password).inspect_err(|e| e.log("Set password", &id))?;
        let hash = hash_password(password)?;
        self.users
            .set_password_hash(id, &hash)
            .await
            .inspect_err(|e| e.log("Set password", &id))?;
        info!("Changed password of user {id}");
        Ok(())
    }

    /// Check a password for an active user that may log in with one.
    ///
    /// Returns false for a wrong password, an inactive account or an account
    /// with password login disabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user does not exist.
    pub async fn verify_password(&self, id: UserId, password: &str) -> Result<bool> {
        let user = self.get(id).await?;
        if !user.is_active() || !user.password_login || user.password_hash.is_empty() {
            debug!("Password login not available for user {id}");
            return Ok(false);
        }
        verify_password(password, &user.password_hash)
    }

    /// Stamp a successful login.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user does not exist.
    pub async fn record_login(&self, id: UserId) -> Result<()> {
        self.users
            .touch_login(id)
            .await
            .inspect_err(|e| e.log("Record login", &id))?;
        debug!("User {id} logged in");
        Ok(())
    }
}

fn check_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::validation("password is required"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::user::UserStatus;

    async fn service() -> UserService {
        UserService::new(&Database::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let service = service().await;
        let user = service
            .create(User::new("Ada", "ada", "ada@example.com"), "hunter2")
            .await
            .unwrap();
        let id = user.id.unwrap();

        assert_ne!(user.password_hash, "hunter2");
        assert!(service.verify_password(id, "hunter2").await.unwrap());
        assert!(!service.verify_password(id, "wrong").await.unwrap());

        service.set_password(id, "swordfish").await.unwrap();
        assert!(!service.verify_password(id, "hunter2").await.unwrap());
        assert!(service.verify_password(id, "swordfish").await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_log_in() {
        let service = service().await;
        let mut user = service
            .create(User::new("Ada", "ada", "ada@example.com"), "hunter2")
            .await
            .unwrap();
        user.status = UserStatus::Inactive;
        service.update(&mut user).await.unwrap();

        assert!(
            !service
                .verify_password(user.id.unwrap(), "hunter2")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_password_rejected() {
        let service = service().await;
        let err = service
            .create(User::new("Ada", "ada", "ada@example.com"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(service.list(Page::default()).await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_lookup_and_login() {
        let service = service().await;
        let user = service
            .create(User::new("Ada", "ada", "ada@example.com"), "pw")
            .await
            .unwrap();

        let found = service.get_by_username("ada").await.unwrap();
        assert_eq!(found.id, user.id);
        assert!(service.get_by_username("bob").await.unwrap_err().is_not_found());

        service.record_login(user.id.unwrap()).await.unwrap();
        assert!(service.get(user.id.unwrap()).await.unwrap().logged_in_at.is_some());
    }
}
