//! Save hooks.
//!
//! A [`SaveHook`] attached to a [`ModelAdmin`](crate::model_admin::ModelAdmin)
//! runs around every save made through that admin: create, update and
//! in-place list edits.

use serde_json::{Map, Value};

/// Callbacks fired around persisting an object.
///
/// Both methods default to doing nothing.
pub trait SaveHook: Send + Sync {
    /// Called with the cleaned values before they are written.
    ///
    /// `change` is `false` when the object is being created.
    fn before_save(&self, model_key: &str, data: &Map<String, Value>, change: bool) {
        let _ = (model_key, data, change);
    }

    /// Called with the stored object after it was written.
    fn after_save(&self, model_key: &str, obj: &Value, change: bool) {
        let _ = (model_key, obj, change);
    }
}
