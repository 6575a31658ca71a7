//! The admin list view.
//!
//! [`ChangeList::build`] runs the list pipeline for one request:
//!
//! 1. load the model's table;
//! 2. apply the active list filters (all must match);
//! 3. apply the search query;
//! 4. sort by the requested or configured ordering (stable, multi-key);
//! 5. paginate;
//! 6. resolve relations of the page rows and render the `list_display`
//!    columns.
//!
//! Related tables named in `list_select_related` or `prefetch_related` are
//! fetched once for the whole page. Other relations are fetched row by row.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use backoffice_core::{AdminError, AdminResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::actions::ActionRegistry;
use crate::api::{ActionInfo, JsonListResponse};
use crate::db::{object_pk, AdminDbExecutor, PK_FIELD};
use crate::filters::{apply_search, matches_field, DateRange, FilterSpec};
use crate::lookups::{relation_pks, resolve_relations, value_strings, RelatedObjects, STR_KEY};
use crate::model_admin::{FieldType, FilterChoice, ListFilter, ModelAdmin};
use crate::registry::ModelRegistry;

/// Query parameter selecting the page.
pub const PAGE_VAR: &str = "page";
/// Query parameter overriding the page size.
pub const PAGE_SIZE_VAR: &str = "page_size";
/// Query parameter carrying the search query.
pub const SEARCH_VAR: &str = "q";
/// Query parameter overriding the ordering (comma-separated).
pub const ORDER_VAR: &str = "o";

/// Parameters for an admin list query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminListParams {
    /// The page number (1-indexed).
    pub page: usize,
    /// The number of items per page; `None` uses `list_per_page`.
    pub page_size: Option<usize>,
    /// Optional search query applied across `search_fields`.
    pub search: Option<String>,
    /// Optional ordering override (prefix with "-" for descending).
    pub ordering: Vec<String>,
    /// Filter selections keyed by filter parameter.
    pub filters: BTreeMap<String, String>,
}

impl AdminListParams {
    /// Creates list parameters for the first page.
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Self::default()
        }
    }

    /// Reads parameters from a query string map.
    ///
    /// Unparseable page numbers fall back to the first page.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let mut params = Self::new();
        for (key, value) in query {
            match key.as_str() {
                PAGE_VAR => params.page = value.parse().unwrap_or(1),
                PAGE_SIZE_VAR => params.page_size = value.parse().ok().filter(|n| *n > 0),
                SEARCH_VAR => params.search = Some(value.clone()),
                ORDER_VAR => {
                    params.ordering = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect();
                }
                _ => {
                    params.filters.insert(key.clone(), value.clone());
                }
            }
        }
        params
    }

    /// Sets the page number.
    #[must_use]
    pub const fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Sets the search query.
    #[must_use]
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    /// Sets the ordering override.
    #[must_use]
    pub fn ordering(mut self, fields: Vec<&str>) -> Self {
        self.ordering = fields.into_iter().map(String::from).collect();
        self
    }

    /// Adds a filter selection.
    #[must_use]
    pub fn filter(mut self, parameter: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(parameter.into(), value.into());
        self
    }

    fn selected(&self, parameter: &str) -> Option<&str> {
        self.filters
            .get(parameter)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// A column of the list view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListColumn {
    /// Entry of `list_display`.
    pub name: String,
    /// Header text.
    pub label: String,
    /// Whether the column is editable in place.
    pub editable: bool,
    /// Whether the column links to the detail view.
    pub link: bool,
}

/// The list view response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeListResponse {
    /// Column headers.
    pub columns: Vec<ListColumn>,
    /// Sidebar filters.
    pub filters: Vec<FilterSpec>,
    /// Available bulk actions.
    pub actions: Vec<ActionInfo>,
    /// The effective ordering.
    pub ordering: Vec<String>,
    /// The search query, if any.
    pub search_query: Option<String>,
    /// Rendered rows (`pk`, `values` by column, raw `object`) and paging.
    #[serde(flatten)]
    pub page: JsonListResponse,
}

/// Builds list views for one model.
pub struct ChangeList<'a> {
    db: &'a dyn AdminDbExecutor,
    registry: &'a ModelRegistry,
    admin: &'a ModelAdmin,
}

impl<'a> ChangeList<'a> {
    /// Creates a change list over `admin`.
    pub fn new(db: &'a dyn AdminDbExecutor, registry: &'a ModelRegistry, admin: &'a ModelAdmin) -> Self {
        Self { db, registry, admin }
    }

    /// Runs the list pipeline.
    pub async fn build(&self, params: &AdminListParams) -> AdminResult<ChangeListResponse> {
        let admin = self.admin;
        let mut related = RelatedObjects::new();
        let mut objects = self.db.all_objects(&admin.model_key()).await?;

        let mut specs = Vec::with_capacity(admin.list_filter.len());
        for filter in &admin.list_filter {
            let (spec, narrowed) = self.apply_filter(filter, params, &mut related, objects).await?;
            specs.push(spec);
            objects = narrowed;
        }

        let search_query = params.search.as_deref().map(str::trim).filter(|q| !q.is_empty());
        if let Some(query) = search_query {
            for path in &admin.search_fields {
                let Some((head, _)) = path.split_once("__") else {
                    continue;
                };
                if let Some(target) = admin.field(head).and_then(|f| f.related_model.as_deref()) {
                    related.load_table(self.db, self.registry, target).await?;
                }
            }
            objects = apply_search(admin, &related, objects, query);
        }

        let ordering = self.ordering(params)?;
        sort_objects(&mut objects, &ordering);

        let page_size = params.page_size.unwrap_or(admin.list_per_page);
        let mut page = JsonListResponse::paginate(&objects, params.page, page_size);

        self.load_page_relations(&page.results, &mut related).await?;
        page.results = page
            .results
            .iter()
            .map(|obj| self.render_row(&related, obj))
            .collect();

        Ok(ChangeListResponse {
            columns: self.columns(),
            filters: specs,
            actions: ActionInfo::from_registry(&ActionRegistry::for_admin(admin)),
            ordering,
            search_query: search_query.map(String::from),
            page,
        })
    }

    /// Resolves one filter: its sidebar spec and the narrowed objects.
    async fn apply_filter(
        &self,
        filter: &ListFilter,
        params: &AdminListParams,
        related: &mut RelatedObjects,
        objects: Vec<Value>,
    ) -> AdminResult<(FilterSpec, Vec<Value>)> {
        let selected = params.selected(filter.parameter_name());
        match filter {
            ListFilter::Simple(custom) => {
                let spec = FilterSpec::new(custom.parameter_name(), custom.title())
                    .add_choices(custom.lookups())
                    .selected(selected);
                let objects = match selected {
                    Some(value) => custom.queryset(value, objects),
                    None => objects,
                };
                Ok((spec, objects))
            }
            ListFilter::Date(name) => {
                let spec = FilterSpec::date(name, self.admin.label_for(name)).selected(selected);
                let Some(value) = selected else {
                    return Ok((spec, objects));
                };
                let range = DateRange::parse(value).ok_or_else(|| {
                    AdminError::BadRequest(format!("Invalid value '{value}' for filter '{name}'"))
                })?;
                let now = Utc::now();
                let objects = objects
                    .into_iter()
                    .filter(|o| o.get(name).and_then(Value::as_str).is_some_and(|ts| range.contains(ts, now)))
                    .collect();
                Ok((spec, objects))
            }
            ListFilter::Field(name) => {
                let field = self.admin.field(name).ok_or_else(|| {
                    AdminError::Configuration(format!(
                        "{} has no field '{name}' to filter on",
                        self.admin.model_key()
                    ))
                })?;
                let title = self.admin.label_for(name);
                let spec = match (field.field_type, field.related_model.as_deref()) {
                    (FieldType::ForeignKey | FieldType::ManyToManyField, Some(target)) => {
                        related.load_table(self.db, self.registry, target).await?;
                        let choices: Vec<FilterChoice> = related
                            .rows(target)
                            .filter_map(|row| {
                                let pk = object_pk(row)?;
                                let display = row.get(STR_KEY)?.as_str()?.to_string();
                                Some(FilterChoice::new(display, pk.to_string()))
                            })
                            .collect();
                        FilterSpec::new(name, title).add_choices(choices)
                    }
                    (FieldType::BooleanField, _) => FilterSpec::boolean(name, title),
                    _ => {
                        let mut values: Vec<String> = objects
                            .iter()
                            .flat_map(|o| value_strings(o.get(name)))
                            .collect();
                        values.sort();
                        values.dedup();
                        FilterSpec::new(name, title)
                            .add_choices(values.into_iter().map(|v| FilterChoice::new(v.clone(), v)))
                    }
                }
                .selected(selected);
                let objects = match selected {
                    Some(value) => objects
                        .into_iter()
                        .filter(|o| matches_field(field, o, value))
                        .collect(),
                    None => objects,
                };
                Ok((spec, objects))
            }
        }
    }

    /// The effective ordering, with the primary key as final tie-breaker.
    fn ordering(&self, params: &AdminListParams) -> AdminResult<Vec<String>> {
        let mut ordering = if params.ordering.is_empty() {
            self.admin.ordering.clone()
        } else {
            params.ordering.clone()
        };
        for entry in &ordering {
            let name = entry.trim_start_matches('-');
            if self.admin.field(name).is_none() {
                return Err(AdminError::BadRequest(format!(
                    "Cannot resolve keyword '{name}' into field."
                )));
            }
        }
        if !ordering.iter().any(|o| o.trim_start_matches('-') == PK_FIELD) {
            ordering.push(format!("-{PK_FIELD}"));
        }
        Ok(ordering)
    }

    async fn load_page_relations(
        &self,
        rows: &[Value],
        related: &mut RelatedObjects,
    ) -> AdminResult<()> {
        for field in self.admin.fields_schema.iter().filter(|f| f.is_relation()) {
            let Some(target) = field.related_model.as_deref() else {
                continue;
            };
            let bulk = self.admin.list_select_related.contains(&field.name)
                || self.admin.prefetch_related.contains(&field.name);
            if bulk {
                let pks: Vec<i64> = rows.iter().flat_map(|r| relation_pks(r, &field.name)).collect();
                related.load_pks(self.db, self.registry, target, &pks).await?;
            } else {
                for row in rows {
                    let pks = relation_pks(row, &field.name);
                    related.load_pks(self.db, self.registry, target, &pks).await?;
                }
            }
        }
        Ok(())
    }

    fn columns(&self) -> Vec<ListColumn> {
        let admin = self.admin;
        admin
            .list_display
            .iter()
            .enumerate()
            .map(|(i, name)| ListColumn {
                name: name.clone(),
                label: if name == "__str__" {
                    admin.verbose_name.clone()
                } else {
                    admin.label_for(name)
                },
                editable: admin.list_editable.contains(name),
                link: if admin.list_display_links.is_empty() {
                    i == 0
                } else {
                    admin.list_display_links.contains(name)
                },
            })
            .collect()
    }

    fn render_row(&self, related: &RelatedObjects, obj: &Value) -> Value {
        let admin = self.admin;
        let resolved = resolve_relations(admin, related, obj);
        let mut values = Map::new();
        for name in &admin.list_display {
            let value = if name == "__str__" {
                Value::String(admin.object_str(obj))
            } else if let Some(column) = admin.display_column(name) {
                Value::String(column.render(&resolved))
            } else {
                match (admin.field(name).map(|f| f.field_type), resolved.get(name)) {
                    (Some(FieldType::ForeignKey), Some(rel)) => {
                        rel.get(STR_KEY).cloned().unwrap_or(Value::Null)
                    }
                    (Some(FieldType::ManyToManyField), Some(Value::Array(items))) => Value::Array(
                        items.iter().filter_map(|i| i.get(STR_KEY).cloned()).collect(),
                    ),
                    (_, value) => value.cloned().unwrap_or(Value::Null),
                }
            };
            values.insert(name.clone(), value);
        }
        serde_json::json!({
            "pk": obj.get(PK_FIELD).cloned().unwrap_or(Value::Null),
            "values": values,
            "object": obj,
        })
    }
}

/// Sorts objects by a sequence of fields (`-` prefix for descending).
///
/// The sort is stable, so objects equal on every key keep their order.
pub fn sort_objects(objects: &mut [Value], ordering: &[String]) {
    let keys: Vec<(&str, bool)> = ordering
        .iter()
        .map(|o| {
            o.strip_prefix('-')
                .map_or((o.as_str(), false), |stripped| (stripped, true))
        })
        .collect();
    objects.sort_by(|a, b| {
        for (field, descending) in &keys {
            let cmp = compare_json_values(a.get(*field), b.get(*field));
            let cmp = if *descending { cmp.reverse() } else { cmp };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });
}

/// Compares two optional JSON values for ordering. Missing and null sort first.
fn compare_json_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            if let (Some(a_str), Some(b_str)) = (a.as_str(), b.as_str()) {
                a_str.cmp(b_str)
            } else if let (Some(a_num), Some(b_num)) = (a.as_f64(), b.as_f64()) {
                a_num.partial_cmp(&b_num).unwrap_or(Ordering::Equal)
            } else if let (Some(a_bool), Some(b_bool)) = (a.as_bool(), b.as_bool()) {
                a_bool.cmp(&b_bool)
            } else {
                a.to_string().cmp(&b.to_string())
            }
        }
    }
}
