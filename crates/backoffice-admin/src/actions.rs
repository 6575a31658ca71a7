//! Admin actions for bulk operations on model objects.
//!
//! This module provides the [`AdminAction`] trait for defining custom admin
//! actions, and a built-in [`DeleteSelectedAction`] that deletes the selected
//! objects. Every model's [`ActionRegistry`] starts with `delete_selected`.

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_core::{AdminError, AdminResult};
use serde::{Deserialize, Serialize};

use crate::auth::UserContext;
use crate::db::{AdminDbExecutor, DependentMap};
use crate::model_admin::ModelAdmin;

/// The result of executing an admin action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action completed successfully.
    pub success: bool,
    /// A message describing the outcome.
    pub message: String,
    /// The number of objects affected by the action.
    pub affected_count: usize,
}

impl ActionResult {
    /// Creates a successful action result.
    pub fn success(message: impl Into<String>, affected_count: usize) -> Self {
        Self {
            success: true,
            message: message.into(),
            affected_count,
        }
    }

    /// Creates a failed action result.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            affected_count: 0,
        }
    }

    /// The result reported when nothing was selected.
    pub fn nothing_selected() -> Self {
        Self::failure(
            "Items must be selected in order to perform actions on them. No items have been changed.",
        )
    }
}

/// Everything an action may touch.
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    /// The store.
    pub db: &'a dyn AdminDbExecutor,
    /// The admin of the model the action runs on.
    pub admin: &'a ModelAdmin,
    /// Delete dependents of every registered model.
    pub dependents: &'a DependentMap,
    /// The user running the action.
    pub user: &'a UserContext,
}

/// A trait for admin actions that can be executed on selected model objects.
///
/// # Examples
///
/// ```
/// use backoffice_admin::actions::{ActionContext, ActionResult, AdminAction};
/// use backoffice_core::AdminResult;
/// use async_trait::async_trait;
///
/// struct ArchiveAction;
///
/// #[async_trait]
/// impl AdminAction for ArchiveAction {
///     fn name(&self) -> &str { "archive" }
///     fn description(&self) -> &str { "Archive selected articles" }
///     async fn execute(
///         &self,
///         ctx: &ActionContext<'_>,
///         selected_ids: &[i64],
///     ) -> AdminResult<ActionResult> {
///         let data = serde_json::json!({"archived": true});
///         let n = ctx
///             .db
///             .bulk_update(ctx.admin, selected_ids, data.as_object().unwrap())
///             .await?;
///         Ok(ActionResult::success(format!("Archived {n} articles."), n))
///     }
/// }
/// ```
#[async_trait]
pub trait AdminAction: Send + Sync {
    /// Returns the unique identifier for this action.
    fn name(&self) -> &str;

    /// Returns a human-readable description of what this action does.
    fn description(&self) -> &str;

    /// Executes the action on the selected objects.
    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        selected_ids: &[i64],
    ) -> AdminResult<ActionResult>;
}

/// Built-in action that deletes the selected objects.
///
/// Deleting follows the model's dependents: referencing rows are deleted or
/// unlinked in the same write.
#[derive(Debug)]
pub struct DeleteSelectedAction;

#[async_trait]
impl AdminAction for DeleteSelectedAction {
    fn name(&self) -> &'static str {
        "delete_selected"
    }

    fn description(&self) -> &'static str {
        "Delete selected objects"
    }

    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        selected_ids: &[i64],
    ) -> AdminResult<ActionResult> {
        if selected_ids.is_empty() {
            return Ok(ActionResult::nothing_selected());
        }

        let deleted = ctx
            .db
            .delete_objects(&ctx.admin.model_key(), selected_ids, ctx.dependents)
            .await?;
        let items = if deleted == 1 {
            &ctx.admin.verbose_name
        } else {
            &ctx.admin.verbose_name_plural
        };
        Ok(ActionResult::success(
            format!("Successfully deleted {deleted} {items}."),
            deleted,
        ))
    }
}

/// The actions available for one admin model.
pub struct ActionRegistry {
    actions: Vec<Arc<dyn AdminAction>>,
}

impl ActionRegistry {
    /// Creates a registry with only the default `delete_selected` action.
    pub fn new() -> Self {
        Self {
            actions: vec![Arc::new(DeleteSelectedAction)],
        }
    }

    /// Creates the registry of a model: `delete_selected` then its own actions.
    pub fn for_admin(admin: &ModelAdmin) -> Self {
        let mut registry = Self::new();
        for action in &admin.actions {
            registry.register(Arc::clone(action));
        }
        registry
    }

    /// Registers an action, replacing one with the same name.
    pub fn register(&mut self, action: Arc<dyn AdminAction>) {
        self.actions.retain(|a| a.name() != action.name());
        self.actions.push(action);
    }

    /// Returns the names of all registered actions.
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    /// Returns descriptions of all registered actions as (name, description) pairs.
    pub fn action_descriptions(&self) -> Vec<(&str, &str)> {
        self.actions
            .iter()
            .map(|a| (a.name(), a.description()))
            .collect()
    }

    /// Finds and executes an action by name.
    pub async fn execute(
        &self,
        action_name: &str,
        ctx: &ActionContext<'_>,
        selected_ids: &[i64],
    ) -> AdminResult<ActionResult> {
        let action = self
            .actions
            .iter()
            .find(|a| a.name() == action_name)
            .ok_or_else(|| AdminError::NotFound(format!("Action '{action_name}' not found")))?;

        tracing::info!(
            action = action_name,
            model = %ctx.admin.model_key(),
            user = %ctx.user.username,
            selected = selected_ids.len(),
            "running admin action"
        );
        action.execute(ctx, selected_ids).await
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("action_count", &self.actions.len())
            .field("actions", &self.action_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryAdminDb;
    use crate::model_admin::{FieldSchema, FieldType};
    use serde_json::json;

    struct FlagAction;

    #[async_trait]
    impl AdminAction for FlagAction {
        fn name(&self) -> &'static str {
            "flag"
        }

        fn description(&self) -> &'static str {
            "Flag selected articles"
        }

        async fn execute(
            &self,
            ctx: &ActionContext<'_>,
            selected_ids: &[i64],
        ) -> AdminResult<ActionResult> {
            let data = json!({"flagged": true});
            let n = ctx
                .db
                .bulk_update(ctx.admin, selected_ids, data.as_object().unwrap())
                .await?;
            Ok(ActionResult::success("flagged", n))
        }
    }

    fn admin() -> ModelAdmin {
        ModelAdmin::new("news", "article")
            .fields_schema(vec![
                FieldSchema::new("id", FieldType::AutoField).primary_key(),
                FieldSchema::new("flagged", FieldType::BooleanField),
            ])
            .actions(vec![Arc::new(FlagAction)])
    }

    fn seeded(n: usize) -> InMemoryAdminDb {
        let db = InMemoryAdminDb::new();
        for _ in 0..n {
            db.insert_raw("news.article", json!({"flagged": false}).as_object().cloned().unwrap());
        }
        db
    }

    #[test]
    fn test_action_result_success() {
        let result = ActionResult::success("Done", 5);
        assert!(result.success);
        assert_eq!(result.message, "Done");
        assert_eq!(result.affected_count, 5);
    }

    #[test]
    fn test_action_result_failure() {
        let result = ActionResult::failure("Error");
        assert!(!result.success);
        assert_eq!(result.affected_count, 0);
    }

    #[test]
    fn test_action_result_serialization() {
        let result = ActionResult::success("Deleted 3 objects", 3);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"affected_count\":3"));
    }

    #[test]
    fn test_registry_for_admin_starts_with_delete() {
        let registry = ActionRegistry::for_admin(&admin());
        assert_eq!(registry.action_names(), vec!["delete_selected", "flag"]);
        assert_eq!(
            registry.action_descriptions()[1],
            ("flag", "Flag selected articles")
        );
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(DeleteSelectedAction));
        assert_eq!(registry.action_names(), vec!["delete_selected"]);
    }

    #[tokio::test]
    async fn test_delete_selected_deletes() {
        let db = seeded(3);
        let admin = admin();
        let deps = DependentMap::new();
        let user = UserContext::new("staff").staff(true);
        let ctx = ActionContext { db: &db, admin: &admin, dependents: &deps, user: &user };

        let result = DeleteSelectedAction.execute(&ctx, &[1, 3]).await.unwrap();
        assert!(result.success);
        assert_eq!(result.affected_count, 2);
        assert_eq!(result.message, "Successfully deleted 2 articles.");
        assert_eq!(db.count("news.article"), 1);

        let result = DeleteSelectedAction.execute(&ctx, &[2]).await.unwrap();
        assert_eq!(result.message, "Successfully deleted 1 article.");
    }

    #[tokio::test]
    async fn test_delete_selected_empty() {
        let db = seeded(1);
        let admin = admin();
        let deps = DependentMap::new();
        let user = UserContext::new("staff");
        let ctx = ActionContext { db: &db, admin: &admin, dependents: &deps, user: &user };
        let result = DeleteSelectedAction.execute(&ctx, &[]).await.unwrap();
        assert!(!result.success);
        assert_eq!(db.count("news.article"), 1);
    }

    #[tokio::test]
    async fn test_registry_execute_custom_and_unknown() {
        let db = seeded(2);
        let admin = admin();
        let deps = DependentMap::new();
        let user = UserContext::new("staff");
        let ctx = ActionContext { db: &db, admin: &admin, dependents: &deps, user: &user };
        let registry = ActionRegistry::for_admin(&admin);

        let result = registry.execute("flag", &ctx, &[2]).await.unwrap();
        assert_eq!(result.affected_count, 1);
        let all = db.all_objects("news.article").await.unwrap();
        assert_eq!(all[0]["flagged"], false);
        assert_eq!(all[1]["flagged"], true);

        let err = registry.execute("explode", &ctx, &[1]).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
