//! Forward rule operations.

use tracing::{debug, info};

use crate::Result;
use crate::id::{InboxId, RuleId};
use crate::rule::{ForwardRule, RuleRepository, RuleScope};
use crate::storage::{Database, Page, Paginated, Repository};

/// Manages forward rules.
#[derive(Debug, Clone)]
pub struct RuleService {
    rules: RuleRepository,
}

impl RuleService {
    /// Create the service on the shared database.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            rules: RuleRepository::new(db),
        }
    }

    /// Create a rule. Addresses are normalized first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] for malformed addresses or
    /// [`crate::Error::MissingParent`] if the inbox does not exist.
    pub async fn create(&self, mut rule: ForwardRule) -> Result<ForwardRule> {
        rule.normalize();
        let inbox_id = rule.inbox_id;
        rule.validate()
            .inspect_err(|e| e.log("Create forward rule", &inbox_id))?;
        let rule = self
            .rules
            .create(rule)
            .await
            .inspect_err(|e| e.log("Create forward rule", &inbox_id))?;
        info!(
            rule_id = ?rule.id,
            inbox_id = %inbox_id,
            "Created forward rule {} -> {} ({:?})",
            rule.sender,
            rule.receiver,
            rule.subject
        );
        Ok(rule)
    }

    /// Get a rule by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the rule does not exist.
    pub async fn get(&self, id: RuleId) -> Result<ForwardRule> {
        debug!("Loading forward rule {id}");
        self.rules
            .get(id)
            .await
            .inspect_err(|e| e.log("Get forward rule", &id))
    }

    /// Save changes to a rule.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the rule does not exist, or
    /// [`crate::Error::Validation`] for malformed addresses.
    pub async fn update(&self, rule: &mut ForwardRule) -> Result<()> {
        rule.normalize();
        let inbox_id = rule.inbox_id;
        rule.validate()
            .inspect_err(|e| e.log("Update forward rule", &inbox_id))?;
        self.rules
            .update(rule)
            .await
            .inspect_err(|e| e.log("Update forward rule", &inbox_id))?;
        info!(rule_id = ?rule.id, "Updated forward rule");
        Ok(())
    }

    /// Delete a rule.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the rule does not exist.
    pub async fn delete(&self, id: RuleId) -> Result<()> {
        self.rules
            .delete(id)
            .await
            .inspect_err(|e| e.log("Delete forward rule", &id))?;
        info!("Deleted forward rule {id}");
        Ok(())
    }

    /// List every rule in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, page: Page) -> Result<Paginated<ForwardRule>> {
        self.rules
            .list(RuleScope::All, page)
            .await
            .inspect_err(|e| e.log("List forward rules", &"all"))
    }

    /// List the rules targeting one inbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_inbox(
        &self,
        inbox_id: InboxId,
        page: Page,
    ) -> Result<Paginated<ForwardRule>> {
        self.rules
            .list(RuleScope::Inbox(inbox_id), page)
            .await
            .inspect_err(|e| e.log("List forward rules", &inbox_id))
    }
}
