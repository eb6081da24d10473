//! Fallback routing by recipient address.

use crate::inbox::{Inbox, InboxRepository};
use crate::{Error, Result};

/// Finds the inbox that owns a receiver address.
#[derive(Debug, Clone)]
pub struct InboxResolver {
    inboxes: InboxRepository,
}

impl InboxResolver {
    /// Create a resolver over the given inbox repository.
    #[must_use]
    pub const fn new(inboxes: InboxRepository) -> Self {
        Self { inboxes }
    }

    /// Resolve `receiver` (already normalized) to its inbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressNotRecognized`] if no inbox has that address,
    /// or a storage error if the lookup fails.
    pub async fn resolve(&self, receiver: &str) -> Result<Inbox> {
        self.inboxes
            .find_by_email(receiver)
            .await?
            .ok_or_else(|| Error::AddressNotRecognized(receiver.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::project::{Project, ProjectRepository};
    use crate::storage::{Database, Repository};

    #[tokio::test]
    async fn test_resolve() {
        let db = Database::in_memory().await.unwrap();
        let project = ProjectRepository::new(&db)
            .create(Project::new("P1"))
            .await
            .unwrap();
        let inboxes = InboxRepository::new(&db);
        let inbox = inboxes
            .create(Inbox::new(project.id.unwrap(), "b@x.com"))
            .await
            .unwrap();
        let resolver = InboxResolver::new(inboxes);

        assert_eq!(resolver.resolve("b@x.com").await.unwrap().id, inbox.id);

        let err = resolver.resolve("c@x.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AddressNotRecognized);
    }
}
