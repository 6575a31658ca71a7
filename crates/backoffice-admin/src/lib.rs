//! # backoffice-admin
//!
//! A small admin framework: models are registered with a [`ModelAdmin`]
//! configuration and each [`AdminSite`] serves a JSON API for listing,
//! filtering, searching, editing and bulk-updating their objects.
//!
//! ## Modules
//!
//! - [`model_admin`] - Per-model admin configuration and its checks
//! - [`registry`] - Registered model admins of a site
//! - [`db`] - The storage trait and the in-memory store
//! - [`lookups`] - Related-object loading and relation traversal
//! - [`filters`] - Sidebar filters and search
//! - [`changelist`] - The list view pipeline
//! - [`forms`] - Submission cleaning and custom admin forms
//! - [`hooks`] - Callbacks around saves
//! - [`actions`] - Bulk actions
//! - [`auth`] - Users, sessions and site permissions
//! - [`api`] - Request and response types of the JSON API
//! - [`site`] - The admin site builder and its Axum router

pub mod actions;
pub mod api;
pub mod auth;
pub mod changelist;
pub mod db;
pub mod filters;
pub mod forms;
pub mod hooks;
pub mod lookups;
pub mod model_admin;
pub mod registry;
pub mod site;

// Re-export the most commonly used types at the crate root.
pub use actions::{ActionContext, ActionResult, AdminAction};
pub use auth::{active_required, staff_required, UserContext, UserStore};
pub use changelist::{AdminListParams, ChangeList};
pub use db::{AdminDbExecutor, InMemoryAdminDb};
pub use filters::SimpleListFilter;
pub use forms::AdminForm;
pub use hooks::SaveHook;
pub use model_admin::{AdminModel, FieldSchema, FieldType, ListFilter, ModelAdmin};
pub use site::AdminSite;
