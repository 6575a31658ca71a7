//! Relation lookups for list views.
//!
//! [`RelatedObjects`] caches rows of related tables for the duration of one
//! request, so each related table is read at most once when it is loaded in
//! full. Paths such as `category__name` follow one relation hop.

use std::collections::{BTreeMap, HashMap};

use backoffice_core::AdminResult;
use serde_json::Value;

use crate::db::{object_pk, AdminDbExecutor};
use crate::model_admin::{FieldType, ModelAdmin};
use crate::registry::ModelRegistry;

/// Key under which resolved objects carry their string form.
pub const STR_KEY: &str = "__str__";

#[derive(Debug, Default)]
struct CachedTable {
    complete: bool,
    rows: BTreeMap<i64, Value>,
}

/// Per-request cache of related objects, keyed by model key then primary key.
///
/// Cached objects carry their string form under [`STR_KEY`].
#[derive(Debug, Default)]
pub struct RelatedObjects {
    tables: HashMap<String, CachedTable>,
}

impl RelatedObjects {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a whole table unless it is already cached in full.
    pub async fn load_table(
        &mut self,
        db: &dyn AdminDbExecutor,
        registry: &ModelRegistry,
        model_key: &str,
    ) -> AdminResult<()> {
        if self.tables.get(model_key).is_some_and(|t| t.complete) {
            return Ok(());
        }
        let rows = db.all_objects(model_key).await?;
        let table = self.tables.entry(model_key.to_string()).or_default();
        table.complete = true;
        for row in rows {
            insert_row(table, registry, model_key, row);
        }
        Ok(())
    }

    /// Loads the given primary keys with a single read.
    ///
    /// Keys already cached are not fetched again; nothing is read when all
    /// keys are cached.
    pub async fn load_pks(
        &mut self,
        db: &dyn AdminDbExecutor,
        registry: &ModelRegistry,
        model_key: &str,
        pks: &[i64],
    ) -> AdminResult<()> {
        let missing: Vec<i64> = match self.tables.get(model_key) {
            Some(t) if t.complete => return Ok(()),
            Some(t) => pks.iter().copied().filter(|pk| !t.rows.contains_key(pk)).collect(),
            None => pks.to_vec(),
        };
        if missing.is_empty() {
            return Ok(());
        }
        let rows = db.objects_by_pks(model_key, &missing).await?;
        let table = self.tables.entry(model_key.to_string()).or_default();
        for row in rows {
            insert_row(table, registry, model_key, row);
        }
        Ok(())
    }

    /// Returns a cached object.
    pub fn get(&self, model_key: &str, pk: i64) -> Option<&Value> {
        self.tables.get(model_key).and_then(|t| t.rows.get(&pk))
    }

    /// Iterates over the cached objects of a model in primary key order.
    pub fn rows(&self, model_key: &str) -> impl Iterator<Item = &Value> {
        self.tables
            .get(model_key)
            .into_iter()
            .flat_map(|t| t.rows.values())
    }
}

fn insert_row(table: &mut CachedTable, registry: &ModelRegistry, model_key: &str, mut row: Value) {
    let Some(pk) = object_pk(&row) else {
        return;
    };
    let display = registry.object_str(model_key, &row);
    if let Value::Object(map) = &mut row {
        map.insert(STR_KEY.to_string(), Value::String(display));
    }
    table.rows.insert(pk, row);
}

/// Returns the related primary keys stored in a relation field.
///
/// A foreign key yields at most one key; a many-to-many array yields its
/// keys in association order.
pub fn relation_pks(obj: &Value, field: &str) -> Vec<i64> {
    match obj.get(field) {
        Some(Value::Number(n)) => n.as_i64().into_iter().collect(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_i64).collect(),
        _ => Vec::new(),
    }
}

/// Renders a scalar JSON value as lookup text. Arrays are flattened.
pub fn value_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items.iter().flat_map(|v| value_strings(Some(v))).collect(),
        Some(other) => vec![other.to_string()],
    }
}

/// Collects the values reached by `path` from `obj`.
///
/// A plain field name yields its value. `relation__field` yields `field` of
/// every related object; related objects must already be cached.
pub fn lookup_values(
    admin: &ModelAdmin,
    related: &RelatedObjects,
    obj: &Value,
    path: &str,
) -> Vec<String> {
    let Some((head, tail)) = path.split_once("__") else {
        return value_strings(obj.get(path));
    };
    let Some(target) = admin.field(head).and_then(|f| f.related_model.as_deref()) else {
        return Vec::new();
    };
    relation_pks(obj, head)
        .into_iter()
        .filter_map(|pk| related.get(target, pk))
        .flat_map(|rel| value_strings(rel.get(tail)))
        .collect()
}

/// Returns a copy of `obj` with relation fields replaced by related objects.
///
/// Foreign keys become the related object (or `null`); many-to-many fields
/// become an array of related objects in association order. Objects missing
/// from the cache are left out.
pub fn resolve_relations(admin: &ModelAdmin, related: &RelatedObjects, obj: &Value) -> Value {
    let mut resolved = obj.clone();
    let Value::Object(map) = &mut resolved else {
        return resolved;
    };
    for field in admin.fields_schema.iter().filter(|f| f.is_relation()) {
        let Some(target) = field.related_model.as_deref() else {
            continue;
        };
        let objects: Vec<Value> = relation_pks(obj, &field.name)
            .into_iter()
            .filter_map(|pk| related.get(target, pk).cloned())
            .collect();
        let value = match field.field_type {
            FieldType::ManyToManyField => Value::Array(objects),
            _ => objects.into_iter().next().unwrap_or(Value::Null),
        };
        map.insert(field.name.clone(), value);
    }
    resolved
}
