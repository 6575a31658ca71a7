//! Admin storage integration.
//!
//! This module provides the [`AdminDbExecutor`] trait that bridges the admin
//! with a storage backend, and [`InMemoryAdminDb`], the store used by the blog
//! back-office.
//!
//! # Architecture
//!
//! The admin storage layer works with `serde_json::Value` objects rather than
//! typed models, because the admin is generic over any registered model.
//! Write operations take the [`ModelAdmin`] so the store can apply
//! system-managed timestamps and uniqueness from the field schema.
//!
//! Every object has an integer primary key stored under [`PK_FIELD`].
//! Foreign keys store the related primary key; many-to-many fields store an
//! ordered array of related primary keys.
//!
//! # Example
//!
//! ```
//! use backoffice_admin::db::InMemoryAdminDb;
//!
//! let db = InMemoryAdminDb::new();
//! assert_eq!(db.queries_executed(), 0);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use backoffice_core::{AdminError, AdminResult, ValidationError};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::model_admin::ModelAdmin;

/// Name of the primary key field of every model.
pub const PK_FIELD: &str = "id";

/// Returns the current time in the format used for timestamp fields.
///
/// Timestamps are fixed-width RFC 3339 UTC strings, so lexicographic order
/// equals chronological order.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// What happens to a referencing row when its target is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentKind {
    /// The referencing row is deleted too (foreign keys).
    Cascade,
    /// The deleted id is removed from the referencing array (many-to-many).
    Unlink,
}

/// A relation on `model_key.field` pointing at another model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependent {
    /// The referencing model.
    pub model_key: String,
    /// The relation field on the referencing model.
    pub field: String,
    /// Delete behavior.
    pub kind: DependentKind,
}

/// Relations pointing at each model, keyed by target model key.
pub type DependentMap = HashMap<String, Vec<Dependent>>;

/// Trait for admin storage operations.
///
/// Provides CRUD operations on arbitrary models using JSON values. Each
/// method is atomic: writes happen under a single lock acquisition and are
/// applied completely or not at all.
#[async_trait]
pub trait AdminDbExecutor: Send + Sync {
    /// Returns all objects of a model in insertion order.
    async fn all_objects(&self, model_key: &str) -> AdminResult<Vec<Value>>;

    /// Fetches a single object by primary key.
    async fn get_object(&self, model_key: &str, pk: i64) -> AdminResult<Value>;

    /// Fetches the objects with the given primary keys in one read.
    ///
    /// Missing keys are skipped; the result follows storage order.
    async fn objects_by_pks(&self, model_key: &str, pks: &[i64]) -> AdminResult<Vec<Value>>;

    /// Creates a new object from cleaned field values.
    ///
    /// Returns the created object with its generated primary key.
    async fn create_object(&self, admin: &ModelAdmin, data: &Map<String, Value>)
        -> AdminResult<Value>;

    /// Updates an existing object identified by primary key.
    ///
    /// Fields absent from `data` keep their values. Returns the updated object.
    async fn update_object(
        &self,
        admin: &ModelAdmin,
        pk: i64,
        data: &Map<String, Value>,
    ) -> AdminResult<Value>;

    /// Applies the same field values to every object in `pks`.
    ///
    /// Unknown keys are ignored and timestamp fields are left as they are.
    /// Returns the number of objects updated.
    async fn bulk_update(
        &self,
        admin: &ModelAdmin,
        pks: &[i64],
        data: &Map<String, Value>,
    ) -> AdminResult<usize>;

    /// Deletes objects by primary key, following `dependents`.
    ///
    /// Returns the number of objects of `model_key` deleted.
    async fn delete_objects(
        &self,
        model_key: &str,
        pks: &[i64],
        dependents: &DependentMap,
    ) -> AdminResult<usize>;
}

/// Storage entry for a model table in the in-memory database.
#[derive(Debug, Clone)]
struct ModelTable {
    /// Objects in insertion order.
    objects: Vec<Value>,
    /// Auto-incrementing ID counter.
    next_id: i64,
}

impl ModelTable {
    const fn new() -> Self {
        Self {
            objects: Vec::new(),
            next_id: 1,
        }
    }

    fn position(&self, pk: i64) -> Option<usize> {
        self.objects.iter().position(|o| object_pk(o) == Some(pk))
    }
}

/// Returns the primary key of a stored object.
pub fn object_pk(obj: &Value) -> Option<i64> {
    obj.get(PK_FIELD).and_then(Value::as_i64)
}

/// In-memory implementation of [`AdminDbExecutor`].
///
/// Stores all objects in memory using `serde_json::Value` maps. Each model
/// gets its own table backed by a `Vec<Value>`. Thread-safe via
/// `Arc<RwLock<...>>`; clones share the same tables.
///
/// Every read operation increments [`queries_executed`](Self::queries_executed).
#[derive(Debug, Clone, Default)]
pub struct InMemoryAdminDb {
    /// Tables keyed by model key (e.g., "blog.post").
    tables: Arc<RwLock<HashMap<String, ModelTable>>>,
    queries: Arc<AtomicUsize>,
}

impl InMemoryAdminDb {
    /// Creates a new empty in-memory database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of read queries executed so far.
    pub fn queries_executed(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Resets the read query counter.
    pub fn reset_queries(&self) {
        self.queries.store(0, Ordering::SeqCst);
    }

    /// Returns the number of objects in a model's table.
    pub fn count(&self, model_key: &str) -> usize {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.get(model_key).map_or(0, |t| t.objects.len())
    }

    /// Stores an object as-is, assigning the next primary key if it has none.
    ///
    /// No validation or timestamping happens; used for fixtures.
    pub fn insert_raw(&self, model_key: &str, mut obj: Map<String, Value>) -> Value {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables
            .entry(model_key.to_string())
            .or_insert_with(ModelTable::new);
        let pk = match obj.get(PK_FIELD).and_then(Value::as_i64) {
            Some(pk) => pk,
            None => {
                let pk = table.next_id;
                obj.insert(PK_FIELD.to_string(), Value::from(pk));
                pk
            }
        };
        table.next_id = table.next_id.max(pk + 1);
        let value = Value::Object(obj);
        table.objects.push(value.clone());
        value
    }

    fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sets system-managed timestamp fields on an object being written.
fn stamp_timestamps(admin: &ModelAdmin, obj: &mut Map<String, Value>, creating: bool) {
    let now = now_timestamp();
    for field in &admin.fields_schema {
        if field.auto_now || (creating && field.auto_now_add) {
            obj.insert(field.name.clone(), Value::String(now.clone()));
        }
    }
}

/// Fills fields that are missing or null with their schema default.
fn apply_defaults(admin: &ModelAdmin, obj: &mut Map<String, Value>) {
    for field in &admin.fields_schema {
        let Some(default) = &field.default else {
            continue;
        };
        if obj.get(&field.name).map_or(true, Value::is_null) {
            obj.insert(field.name.clone(), default.clone());
        }
    }
}

/// Copies client-writable values into `obj`, skipping system-managed fields.
fn merge_writable(admin: &ModelAdmin, obj: &mut Map<String, Value>, data: &Map<String, Value>) {
    for (key, value) in data {
        if key == PK_FIELD {
            continue;
        }
        let system_managed = admin
            .field(key)
            .is_some_and(|f| f.auto_now || f.auto_now_add || f.primary_key);
        if !system_managed {
            obj.insert(key.clone(), value.clone());
        }
    }
}

fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |c| {
        c.to_uppercase().chain(chars).collect()
    })
}

/// Checks unique fields of `candidate` against the rest of the table.
fn check_unique(
    admin: &ModelAdmin,
    table: &[Value],
    candidates: &[&Map<String, Value>],
) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    for field in admin.fields_schema.iter().filter(|f| f.unique) {
        let mut seen: HashSet<String> = HashSet::new();
        let candidate_pks: HashSet<Option<i64>> = candidates
            .iter()
            .map(|c| c.get(PK_FIELD).and_then(Value::as_i64))
            .collect();
        for existing in table {
            if candidate_pks.contains(&object_pk(existing)) {
                continue;
            }
            if let Some(v) = existing.get(&field.name).filter(|v| !v.is_null()) {
                seen.insert(v.to_string());
            }
        }
        for candidate in candidates {
            let Some(v) = candidate.get(&field.name).filter(|v| !v.is_null()) else {
                continue;
            };
            if !seen.insert(v.to_string()) {
                errors.add(
                    field.name.clone(),
                    format!(
                        "{} with this {} already exists.",
                        capfirst(&admin.verbose_name),
                        capfirst(&field.label)
                    ),
                );
                break;
            }
        }
    }
    errors.into_result()
}

#[async_trait]
impl AdminDbExecutor for InMemoryAdminDb {
    async fn all_objects(&self, model_key: &str) -> AdminResult<Vec<Value>> {
        self.record_query();
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables
            .get(model_key)
            .map_or_else(Vec::new, |t| t.objects.clone()))
    }

    async fn get_object(&self, model_key: &str, pk: i64) -> AdminResult<Value> {
        self.record_query();
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(model_key)
            .and_then(|t| t.objects.iter().find(|o| object_pk(o) == Some(pk)))
            .cloned()
            .ok_or_else(|| AdminError::NotFound(format!("{model_key} with id {pk} does not exist")))
    }

    async fn objects_by_pks(&self, model_key: &str, pks: &[i64]) -> AdminResult<Vec<Value>> {
        self.record_query();
        let wanted: HashSet<i64> = pks.iter().copied().collect();
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.get(model_key).map_or_else(Vec::new, |t| {
            t.objects
                .iter()
                .filter(|o| object_pk(o).is_some_and(|pk| wanted.contains(&pk)))
                .cloned()
                .collect()
        }))
    }

    async fn create_object(
        &self,
        admin: &ModelAdmin,
        data: &Map<String, Value>,
    ) -> AdminResult<Value> {
        let model_key = admin.model_key();
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(model_key).or_insert_with(ModelTable::new);

        let mut obj = Map::new();
        obj.insert(PK_FIELD.to_string(), Value::from(table.next_id));
        merge_writable(admin, &mut obj, data);
        apply_defaults(admin, &mut obj);
        stamp_timestamps(admin, &mut obj, true);
        check_unique(admin, &table.objects, &[&obj])?;

        table.next_id += 1;
        let value = Value::Object(obj);
        table.objects.push(value.clone());
        Ok(value)
    }

    async fn update_object(
        &self,
        admin: &ModelAdmin,
        pk: i64,
        data: &Map<String, Value>,
    ) -> AdminResult<Value> {
        let model_key = admin.model_key();
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let not_found = || AdminError::NotFound(format!("{model_key} with id {pk} does not exist"));
        let table = tables.get_mut(&model_key).ok_or_else(not_found)?;
        let idx = table.position(pk).ok_or_else(not_found)?;

        let mut obj = table.objects[idx].as_object().cloned().unwrap_or_default();
        merge_writable(admin, &mut obj, data);
        stamp_timestamps(admin, &mut obj, false);
        check_unique(admin, &table.objects, &[&obj])?;

        let value = Value::Object(obj);
        table.objects[idx] = value.clone();
        Ok(value)
    }

    async fn bulk_update(
        &self,
        admin: &ModelAdmin,
        pks: &[i64],
        data: &Map<String, Value>,
    ) -> AdminResult<usize> {
        let model_key = admin.model_key();
        let wanted: HashSet<i64> = pks.iter().copied().collect();
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let Some(table) = tables.get_mut(&model_key) else {
            return Ok(0);
        };

        let mut updated: Vec<(usize, Map<String, Value>)> = Vec::new();
        for (idx, existing) in table.objects.iter().enumerate() {
            if !object_pk(existing).is_some_and(|pk| wanted.contains(&pk)) {
                continue;
            }
            let mut obj = existing.as_object().cloned().unwrap_or_default();
            merge_writable(admin, &mut obj, data);
            updated.push((idx, obj));
        }
        let candidates: Vec<&Map<String, Value>> = updated.iter().map(|(_, o)| o).collect();
        check_unique(admin, &table.objects, &candidates)?;

        let count = updated.len();
        for (idx, obj) in updated {
            table.objects[idx] = Value::Object(obj);
        }
        Ok(count)
    }

    async fn delete_objects(
        &self,
        model_key: &str,
        pks: &[i64],
        dependents: &DependentMap,
    ) -> AdminResult<usize> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let mut deleted_root = 0;
        let mut queue: Vec<(String, HashSet<i64>)> =
            vec![(model_key.to_string(), pks.iter().copied().collect())];

        while let Some((key, doomed)) = queue.pop() {
            if doomed.is_empty() {
                continue;
            }
            let removed: HashSet<i64> = match tables.get_mut(&key) {
                Some(table) => {
                    let before: HashSet<i64> =
                        table.objects.iter().filter_map(object_pk).collect();
                    table
                        .objects
                        .retain(|o| !object_pk(o).is_some_and(|pk| doomed.contains(&pk)));
                    let after: HashSet<i64> = table.objects.iter().filter_map(object_pk).collect();
                    before.difference(&after).copied().collect()
                }
                None => HashSet::new(),
            };
            if key == model_key {
                deleted_root += removed.len();
            }
            if removed.is_empty() {
                continue;
            }

            for dependent in dependents.get(&key).into_iter().flatten() {
                let Some(table) = tables.get_mut(&dependent.model_key) else {
                    continue;
                };
                match dependent.kind {
                    DependentKind::Cascade => {
                        let cascaded: HashSet<i64> = table
                            .objects
                            .iter()
                            .filter(|o| {
                                o.get(&dependent.field)
                                    .and_then(Value::as_i64)
                                    .is_some_and(|fk| removed.contains(&fk))
                            })
                            .filter_map(object_pk)
                            .collect();
                        queue.push((dependent.model_key.clone(), cascaded));
                    }
                    DependentKind::Unlink => {
                        for obj in &mut table.objects {
                            if let Some(Value::Array(ids)) = obj.get_mut(&dependent.field) {
                                ids.retain(|id| !id.as_i64().is_some_and(|id| removed.contains(&id)));
                            }
                        }
                    }
                }
            }
        }
        Ok(deleted_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_admin::{FieldSchema, FieldType};
    use serde_json::json;

    fn brand_admin() -> ModelAdmin {
        ModelAdmin::new("shop", "brand").fields_schema(vec![
            FieldSchema::new("id", FieldType::AutoField).primary_key(),
            FieldSchema::new("name", FieldType::CharField).unique(),
        ])
    }

    fn product_admin() -> ModelAdmin {
        ModelAdmin::new("shop", "product").fields_schema(vec![
            FieldSchema::new("id", FieldType::AutoField).primary_key(),
            FieldSchema::new("title", FieldType::CharField),
            FieldSchema::new("active", FieldType::BooleanField).default_value(false),
            FieldSchema::foreign_key("brand", "shop.brand"),
            FieldSchema::many_to_many("labels", "shop.label"),
            FieldSchema::new("created", FieldType::DateTimeField).auto_now_add(),
            FieldSchema::new("updated", FieldType::DateTimeField).auto_now(),
        ])
    }

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_timestamps() {
        let db = InMemoryAdminDb::new();
        let admin = product_admin();
        let first = db
            .create_object(&admin, &data(json!({"title": "A", "created": "1999"})))
            .await
            .unwrap();
        let second = db.create_object(&admin, &data(json!({"title": "B"}))).await.unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);
        assert_ne!(first["created"], "1999");
        assert_eq!(first["created"], first["updated"]);
        assert_eq!(db.count("shop.product"), 2);
    }

    #[tokio::test]
    async fn test_create_fills_defaults() {
        let db = InMemoryAdminDb::new();
        let admin = product_admin();
        let bare = db.create_object(&admin, &data(json!({"title": "A"}))).await.unwrap();
        assert_eq!(bare["active"], false);
        assert_eq!(bare["labels"], json!([]));
        assert!(bare.get("brand").is_none());

        let explicit = db
            .create_object(&admin, &data(json!({"title": "B", "active": true, "labels": null})))
            .await
            .unwrap();
        assert_eq!(explicit["active"], true);
        assert_eq!(explicit["labels"], json!([]));
    }

    #[tokio::test]
    async fn test_update_keeps_created_and_bumps_updated() {
        let db = InMemoryAdminDb::new();
        let admin = product_admin();
        let created = db.create_object(&admin, &data(json!({"title": "A"}))).await.unwrap();
        let updated = db
            .update_object(&admin, 1, &data(json!({"title": "B"})))
            .await
            .unwrap();
        assert_eq!(updated["title"], "B");
        assert_eq!(updated["created"], created["created"]);
        assert!(updated["updated"].as_str() >= created["updated"].as_str());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = InMemoryAdminDb::new();
        let err = db
            .update_object(&product_admin(), 9, &Map::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_unique_enforced_on_create_and_update() {
        let db = InMemoryAdminDb::new();
        let admin = brand_admin();
        db.create_object(&admin, &data(json!({"name": "Acme"}))).await.unwrap();
        db.create_object(&admin, &data(json!({"name": "Zeta"}))).await.unwrap();

        let err = db
            .create_object(&admin, &data(json!({"name": "Acme"})))
            .await
            .unwrap_err();
        match err {
            AdminError::Validation(v) => {
                assert_eq!(v.messages_for("name"), ["Brand with this Name already exists."]);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(db
            .update_object(&admin, 2, &data(json!({"name": "Acme"})))
            .await
            .is_err());
        // Saving an object with its own value is fine.
        assert!(db
            .update_object(&admin, 1, &data(json!({"name": "Acme"})))
            .await
            .is_ok());
        assert_eq!(db.count("shop.brand"), 2);
    }

    #[tokio::test]
    async fn test_bulk_update_ignores_unknown_ids() {
        let db = InMemoryAdminDb::new();
        let admin = product_admin();
        for title in ["A", "B", "C"] {
            db.create_object(&admin, &data(json!({"title": title, "active": false})))
                .await
                .unwrap();
        }
        let n = db
            .bulk_update(&admin, &[1, 3, 99], &data(json!({"active": true})))
            .await
            .unwrap();
        assert_eq!(n, 2);
        let all = db.all_objects("shop.product").await.unwrap();
        let flags: Vec<_> = all.iter().map(|o| o["active"].as_bool().unwrap()).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[tokio::test]
    async fn test_bulk_update_leaves_timestamps_alone() {
        let db = InMemoryAdminDb::new();
        let admin = product_admin();
        let before = db
            .create_object(&admin, &data(json!({"title": "A", "active": false})))
            .await
            .unwrap();
        let n = db
            .bulk_update(
                &admin,
                &[1],
                &data(json!({"active": true, "updated": "2000-01-01T00:00:00.000000Z"})),
            )
            .await
            .unwrap();
        assert_eq!(n, 1);
        let after = db.get_object("shop.product", 1).await.unwrap();
        assert_eq!(after["active"], true);
        assert_eq!(after["updated"], before["updated"]);
        assert_eq!(after["created"], before["created"]);
    }

    #[tokio::test]
    async fn test_bulk_update_unique_conflict_changes_nothing() {
        let db = InMemoryAdminDb::new();
        let admin = brand_admin();
        db.create_object(&admin, &data(json!({"name": "A"}))).await.unwrap();
        db.create_object(&admin, &data(json!({"name": "B"}))).await.unwrap();
        assert!(db
            .bulk_update(&admin, &[1, 2], &data(json!({"name": "C"})))
            .await
            .is_err());
        let names: Vec<_> = db
            .all_objects("shop.brand")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("A"), json!("B")]);
    }

    #[tokio::test]
    async fn test_reads_are_counted() {
        let db = InMemoryAdminDb::new();
        db.insert_raw("shop.brand", data(json!({"name": "Acme"})));
        assert_eq!(db.queries_executed(), 0);
        db.all_objects("shop.brand").await.unwrap();
        db.get_object("shop.brand", 1).await.unwrap();
        db.objects_by_pks("shop.brand", &[1, 2]).await.unwrap();
        assert_eq!(db.queries_executed(), 3);
        db.reset_queries();
        assert_eq!(db.queries_executed(), 0);
    }

    #[tokio::test]
    async fn test_objects_by_pks_skips_missing() {
        let db = InMemoryAdminDb::new();
        for name in ["a", "b", "c"] {
            db.insert_raw("shop.brand", data(json!({"name": name})));
        }
        let found = db.objects_by_pks("shop.brand", &[3, 1, 7]).await.unwrap();
        let ids: Vec<_> = found.iter().filter_map(object_pk).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_insert_raw_respects_explicit_ids() {
        let db = InMemoryAdminDb::new();
        db.insert_raw("shop.brand", data(json!({"id": 10, "name": "x"})));
        let next = db.insert_raw("shop.brand", data(json!({"name": "y"})));
        assert_eq!(next["id"], 11);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_unlinks() {
        let db = InMemoryAdminDb::new();
        db.insert_raw("shop.brand", data(json!({"name": "Acme"})));
        db.insert_raw("shop.brand", data(json!({"name": "Zeta"})));
        db.insert_raw("shop.label", data(json!({"name": "new"})));
        db.insert_raw("shop.label", data(json!({"name": "sale"})));
        db.insert_raw("shop.product", data(json!({"title": "p1", "brand": 1, "labels": [1, 2]})));
        db.insert_raw("shop.product", data(json!({"title": "p2", "brand": 2, "labels": [2]})));

        let mut deps = DependentMap::new();
        deps.insert(
            "shop.brand".into(),
            vec![Dependent {
                model_key: "shop.product".into(),
                field: "brand".into(),
                kind: DependentKind::Cascade,
            }],
        );
        deps.insert(
            "shop.label".into(),
            vec![Dependent {
                model_key: "shop.product".into(),
                field: "labels".into(),
                kind: DependentKind::Unlink,
            }],
        );

        assert_eq!(db.delete_objects("shop.label", &[2], &deps).await.unwrap(), 1);
        let products = db.all_objects("shop.product").await.unwrap();
        assert_eq!(products[0]["labels"], json!([1]));
        assert_eq!(products[1]["labels"], json!([]));

        assert_eq!(db.delete_objects("shop.brand", &[1, 5], &deps).await.unwrap(), 1);
        let products = db.all_objects("shop.product").await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["title"], "p2");
    }

    #[test]
    fn test_now_timestamp_is_fixed_width_utc() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000000Z".len());
    }

    #[test]
    fn test_capfirst() {
        assert_eq!(capfirst("category"), "Category");
        assert_eq!(capfirst(""), "");
    }
}
