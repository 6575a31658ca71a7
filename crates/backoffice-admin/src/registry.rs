//! The set of models registered with one admin site.
//!
//! Relations between registered models are resolved through the registry:
//! string forms of related objects and the delete dependents of a model.

use std::collections::btree_map::Values;
use std::collections::{BTreeMap, HashMap};

use crate::db::{Dependent, DependentKind, DependentMap};
use crate::model_admin::{FieldType, ModelAdmin};

/// Registered model admins keyed by `"app_label.model_name"`.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    admins: BTreeMap<String, ModelAdmin>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model admin, replacing any previous registration.
    pub fn insert(&mut self, admin: ModelAdmin) -> Option<ModelAdmin> {
        self.admins.insert(admin.model_key(), admin)
    }

    /// Looks up a model admin by key.
    pub fn get(&self, model_key: &str) -> Option<&ModelAdmin> {
        self.admins.get(model_key)
    }

    /// Looks up a model admin by app label and model name.
    pub fn find(&self, app_label: &str, model_name: &str) -> Option<&ModelAdmin> {
        self.admins.get(&format!("{app_label}.{model_name}"))
    }

    /// Returns `true` if the model is registered.
    pub fn contains(&self, model_key: &str) -> bool {
        self.admins.contains_key(model_key)
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }

    /// Iterates over registered admins in key order.
    pub fn iter(&self) -> Values<'_, String, ModelAdmin> {
        self.admins.values()
    }

    /// Returns the string form of an object of the given model.
    ///
    /// Unregistered models render as `"<model_key> object (<pk>)"`.
    pub fn object_str(&self, model_key: &str, obj: &serde_json::Value) -> String {
        self.admins.get(model_key).map_or_else(
            || {
                let pk = obj.get("id").map(ToString::to_string).unwrap_or_default();
                format!("{model_key} object ({pk})")
            },
            |admin| admin.object_str(obj),
        )
    }

    /// Computes, for every registered model, the relations pointing at it.
    ///
    /// Foreign keys cascade on delete; many-to-many references are unlinked.
    pub fn dependents(&self) -> DependentMap {
        let mut map: DependentMap = HashMap::new();
        for admin in self.admins.values() {
            for field in &admin.fields_schema {
                let Some(target) = field.related_model.as_ref() else {
                    continue;
                };
                let kind = match field.field_type {
                    FieldType::ForeignKey => DependentKind::Cascade,
                    FieldType::ManyToManyField => DependentKind::Unlink,
                    _ => continue,
                };
                map.entry(target.clone()).or_default().push(Dependent {
                    model_key: admin.model_key(),
                    field: field.name.clone(),
                    kind,
                });
            }
        }
        map
    }
}

impl<'a> IntoIterator for &'a ModelRegistry {
    type Item = &'a ModelAdmin;
    type IntoIter = Values<'a, String, ModelAdmin>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
