//! Model administration configuration.
//!
//! This module provides [`ModelAdmin`] and related types for configuring how
//! a model is listed, searched, filtered and edited in an admin site. All
//! options are plain values set through consuming builder methods; the few
//! behavioral callbacks (custom filters, actions, form validation, save hooks)
//! are trait objects.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use backoffice_core::checks::CheckMessage;
use serde::{Deserialize, Serialize};

use crate::actions::AdminAction;
use crate::db::PK_FIELD;
use crate::filters::SimpleListFilter;
use crate::forms::AdminForm;
use crate::hooks::SaveHook;

/// A model type that can be registered with an admin site.
///
/// Implementors describe their storage shape; [`ModelAdmin::for_model`]
/// turns that into the default (unconfigured) admin presentation.
pub trait AdminModel {
    /// Application label, e.g. `"blog"`.
    const APP_LABEL: &'static str;
    /// Lowercase model name, e.g. `"post"`.
    const MODEL_NAME: &'static str;

    /// Field definitions, primary key first.
    fn fields_schema() -> Vec<FieldSchema>;

    /// Field whose value is the object's string form.
    fn str_field() -> Option<&'static str> {
        None
    }

    /// Plural human-readable name.
    fn verbose_name_plural() -> String {
        format!("{}s", Self::MODEL_NAME.replace('_', " "))
    }
}

/// A computed list column.
///
/// The render function receives the object with its relations resolved:
/// foreign keys hold the related object, many-to-many fields hold an array
/// of related objects. Every resolved object carries a `"__str__"` key.
#[derive(Clone)]
pub struct DisplayColumn {
    /// Name used in `list_display`.
    pub name: String,
    /// Column header.
    pub short_description: String,
    render: Arc<dyn Fn(&serde_json::Value) -> String + Send + Sync>,
}

impl DisplayColumn {
    /// Creates a computed column.
    pub fn new(
        name: impl Into<String>,
        short_description: impl Into<String>,
        render: impl Fn(&serde_json::Value) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            short_description: short_description.into(),
            render: Arc::new(render),
        }
    }

    /// Renders the column for one resolved object.
    pub fn render(&self, obj: &serde_json::Value) -> String {
        (self.render)(obj)
    }
}

impl fmt::Debug for DisplayColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayColumn")
            .field("name", &self.name)
            .field("short_description", &self.short_description)
            .finish_non_exhaustive()
    }
}

/// Configuration for how a model is displayed and managed in an admin site.
///
/// # Examples
///
/// ```
/// use backoffice_admin::model_admin::{FieldSchema, FieldType, ModelAdmin};
///
/// let admin = ModelAdmin::new("blog", "article")
///     .fields_schema(vec![
///         FieldSchema::new("id", FieldType::AutoField).primary_key(),
///         FieldSchema::new("title", FieldType::CharField).max_length(200),
///     ])
///     .list_display(vec!["id", "title"])
///     .search_fields(vec!["title"])
///     .ordering(vec!["-id"])
///     .list_per_page(25);
/// assert!(admin.check().is_empty());
/// ```
#[derive(Clone)]
pub struct ModelAdmin {
    /// The application label (e.g., "blog").
    pub app_label: String,
    /// The model name in lowercase (e.g., "post").
    pub model_name: String,
    /// The human-readable verbose name.
    pub verbose_name: String,
    /// The human-readable plural verbose name.
    pub verbose_name_plural: String,
    /// Field used as the object's string form.
    pub str_field: Option<String>,
    /// Schema of the model's fields.
    pub fields_schema: Vec<FieldSchema>,
    /// Form fields in display order (empty means derived from fieldsets or schema).
    pub fields: Vec<String>,
    /// Fieldset groupings for the detail view.
    pub fieldsets: Vec<Fieldset>,
    /// Fields shown but never accepted from submissions.
    pub readonly_fields: Vec<String>,
    /// Columns of the list view.
    pub list_display: Vec<String>,
    /// Columns that link to the detail view.
    pub list_display_links: Vec<String>,
    /// Columns editable directly in the list view.
    pub list_editable: Vec<String>,
    /// Sidebar filters of the list view.
    pub list_filter: Vec<ListFilter>,
    /// Fields searched by the search box (`__` traverses one relation).
    pub search_fields: Vec<String>,
    /// Default ordering (prefix with "-" for descending).
    pub ordering: Vec<String>,
    /// Number of items per page in list view.
    pub list_per_page: usize,
    /// Foreign keys fetched in bulk together with a list page.
    pub list_select_related: Vec<String>,
    /// Many-to-many fields prefetched in bulk for a list page.
    pub prefetch_related: Vec<String>,
    /// Inline editors for related models.
    pub inlines: Vec<InlineAdmin>,
    /// Many-to-many fields edited with the two-pane selector widget.
    pub filter_horizontal: Vec<String>,
    /// Script files attached to the edit screen.
    pub media_js: Vec<String>,
    /// Computed list columns.
    pub display_columns: Vec<DisplayColumn>,
    /// Bulk actions in addition to `delete_selected`.
    pub actions: Vec<Arc<dyn AdminAction>>,
    /// Custom form (labels and cross-field validation).
    pub form: Option<Arc<dyn AdminForm>>,
    /// Before/after persist hook.
    pub save_hook: Option<Arc<dyn SaveHook>>,
}

impl ModelAdmin {
    /// Creates a new `ModelAdmin` with default configuration.
    pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
        let model = model_name.into();
        let app = app_label.into();
        let verbose = model.replace('_', " ");
        let verbose_plural = format!("{verbose}s");
        Self {
            app_label: app,
            model_name: model,
            verbose_name: verbose,
            verbose_name_plural: verbose_plural,
            str_field: None,
            fields_schema: Vec::new(),
            fields: Vec::new(),
            fieldsets: Vec::new(),
            readonly_fields: Vec::new(),
            list_display: vec!["__str__".to_string()],
            list_display_links: Vec::new(),
            list_editable: Vec::new(),
            list_filter: Vec::new(),
            search_fields: Vec::new(),
            ordering: Vec::new(),
            list_per_page: 100,
            list_select_related: Vec::new(),
            prefetch_related: Vec::new(),
            inlines: Vec::new(),
            filter_horizontal: Vec::new(),
            media_js: Vec::new(),
            display_columns: Vec::new(),
            actions: Vec::new(),
            form: None,
            save_hook: None,
        }
    }

    /// Creates the default admin presentation for a model type.
    pub fn for_model<M: AdminModel>() -> Self {
        let mut admin = Self::new(M::APP_LABEL, M::MODEL_NAME)
            .verbose_name_plural(M::verbose_name_plural())
            .fields_schema(M::fields_schema());
        admin.str_field = M::str_field().map(String::from);
        admin
    }

    /// Sets the verbose name.
    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = name.into();
        self
    }

    /// Sets the plural verbose name.
    #[must_use]
    pub fn verbose_name_plural(mut self, name: impl Into<String>) -> Self {
        self.verbose_name_plural = name.into();
        self
    }

    /// Sets the field used as the string form.
    #[must_use]
    pub fn str_field(mut self, field: &str) -> Self {
        self.str_field = Some(field.to_string());
        self
    }

    /// Sets the field schema.
    #[must_use]
    pub fn fields_schema(mut self, schema: Vec<FieldSchema>) -> Self {
        self.fields_schema = schema;
        self
    }

    /// Sets the form fields in display order.
    #[must_use]
    pub fn fields(mut self, fields: Vec<&str>) -> Self {
        self.fields = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the fieldsets for the detail view.
    #[must_use]
    pub fn fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
        self.fieldsets = fieldsets;
        self
    }

    /// Sets the read-only fields.
    #[must_use]
    pub fn readonly_fields(mut self, fields: Vec<&str>) -> Self {
        self.readonly_fields = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the columns of the list view.
    #[must_use]
    pub fn list_display(mut self, fields: Vec<&str>) -> Self {
        self.list_display = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the columns that link to the detail view.
    #[must_use]
    pub fn list_display_links(mut self, fields: Vec<&str>) -> Self {
        self.list_display_links = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the columns editable in the list view.
    #[must_use]
    pub fn list_editable(mut self, fields: Vec<&str>) -> Self {
        self.list_editable = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the list filters from field names.
    #[must_use]
    pub fn list_filter_fields(mut self, fields: Vec<&str>) -> Self {
        self.list_filter = fields
            .into_iter()
            .map(|f| ListFilter::Field(f.to_string()))
            .collect();
        self
    }

    /// Sets the list filters.
    #[must_use]
    pub fn list_filter(mut self, filters: Vec<ListFilter>) -> Self {
        self.list_filter = filters;
        self
    }

    /// Sets the fields to search over.
    #[must_use]
    pub fn search_fields(mut self, fields: Vec<&str>) -> Self {
        self.search_fields = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the default ordering.
    #[must_use]
    pub fn ordering(mut self, fields: Vec<&str>) -> Self {
        self.ordering = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the number of items per page.
    #[must_use]
    pub const fn list_per_page(mut self, count: usize) -> Self {
        self.list_per_page = count;
        self
    }

    /// Sets the foreign keys fetched together with a list page.
    #[must_use]
    pub fn list_select_related(mut self, fields: Vec<&str>) -> Self {
        self.list_select_related = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the many-to-many fields prefetched for a list page.
    #[must_use]
    pub fn prefetch_related(mut self, fields: Vec<&str>) -> Self {
        self.prefetch_related = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the inline model editors.
    #[must_use]
    pub fn inlines(mut self, inlines: Vec<InlineAdmin>) -> Self {
        self.inlines = inlines;
        self
    }

    /// Sets the fields edited with the horizontal selector widget.
    #[must_use]
    pub fn filter_horizontal(mut self, fields: Vec<&str>) -> Self {
        self.filter_horizontal = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the script files attached to the edit screen.
    #[must_use]
    pub fn media_js(mut self, files: Vec<&str>) -> Self {
        self.media_js = files.into_iter().map(String::from).collect();
        self
    }

    /// Adds a computed list column.
    #[must_use]
    pub fn display(mut self, column: DisplayColumn) -> Self {
        self.display_columns.push(column);
        self
    }

    /// Adds bulk actions.
    #[must_use]
    pub fn actions(mut self, actions: Vec<Arc<dyn AdminAction>>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Sets the custom form.
    #[must_use]
    pub fn form(mut self, form: Arc<dyn AdminForm>) -> Self {
        self.form = Some(form);
        self
    }

    /// Sets the save hook.
    #[must_use]
    pub fn save_hook(mut self, hook: Arc<dyn SaveHook>) -> Self {
        self.save_hook = Some(hook);
        self
    }

    /// Returns the model key in `"app_label.model_name"` format.
    pub fn model_key(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }

    /// Looks up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields_schema.iter().find(|f| f.name == name)
    }

    /// Looks up a computed column by name.
    pub fn display_column(&self, name: &str) -> Option<&DisplayColumn> {
        self.display_columns.iter().find(|c| c.name == name)
    }

    /// Returns the string form of an object.
    ///
    /// Falls back to `"<verbose name> object (<pk>)"` when no string field
    /// is configured or the value is missing.
    pub fn object_str(&self, obj: &serde_json::Value) -> String {
        self.str_field
            .as_deref()
            .and_then(|f| obj.get(f))
            .and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .unwrap_or_else(|| {
                let pk = obj
                    .get(PK_FIELD)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                format!("{} object ({pk})", self.verbose_name)
            })
    }

    /// Returns the fields shown on the edit form, in order.
    pub fn form_fields(&self) -> Vec<String> {
        if !self.fields.is_empty() {
            return self.fields.clone();
        }
        if !self.fieldsets.is_empty() {
            return self
                .fieldsets
                .iter()
                .flat_map(|fs| fs.fields.iter().cloned())
                .collect();
        }
        self.fields_schema
            .iter()
            .filter(|f| !f.primary_key)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Returns `true` if the field is never accepted from a submission.
    pub fn is_readonly(&self, name: &str) -> bool {
        self.readonly_fields.iter().any(|f| f == name)
            || self
                .field(name)
                .is_some_and(|f| f.read_only || f.auto_now || f.auto_now_add)
    }

    /// Returns the form fields that accept submitted values.
    pub fn editable_fields(&self) -> Vec<String> {
        self.form_fields()
            .into_iter()
            .filter(|f| !self.is_readonly(f) && self.field(f).is_some())
            .collect()
    }

    /// Returns the display label of a field, honoring form overrides.
    pub fn label_for(&self, name: &str) -> String {
        if let Some(label) = self.form.as_ref().and_then(|form| form.label(name)) {
            return label.to_string();
        }
        if let Some(column) = self.display_column(name) {
            return column.short_description.clone();
        }
        self.field(name)
            .map_or_else(|| name.replace('_', " "), |f| f.label.clone())
    }

    /// Validates the configuration, returning one message per problem.
    pub fn check(&self) -> Vec<CheckMessage> {
        let key = self.model_key();
        let obj = Some(key.as_str());
        let mut messages = Vec::new();

        for (i, name) in self.list_display.iter().enumerate() {
            if name == "__str__" || self.display_column(name).is_some() {
                continue;
            }
            match self.field(name) {
                None => messages.push(CheckMessage::error(
                    format!(
                        "The value of 'list_display[{i}]' refers to '{name}', which is not a field or a display column."
                    ),
                    None,
                    obj,
                    Some("admin.E108"),
                )),
                Some(f) if f.field_type == FieldType::ManyToManyField => {
                    messages.push(CheckMessage::error(
                        format!(
                            "The value of 'list_display[{i}]' must not be a many-to-many field."
                        ),
                        Some("Use a display column that renders the related objects."),
                        obj,
                        Some("admin.E109"),
                    ));
                }
                Some(_) => {}
            }
        }

        for (i, name) in self.list_editable.iter().enumerate() {
            if self.field(name).is_none() {
                messages.push(CheckMessage::error(
                    format!("The value of 'list_editable[{i}]' refers to '{name}', which is not a field."),
                    None,
                    obj,
                    Some("admin.E121"),
                ));
            } else if !self.list_display.contains(name) {
                messages.push(CheckMessage::error(
                    format!(
                        "The value of 'list_editable[{i}]' refers to '{name}', which is not contained in 'list_display'."
                    ),
                    None,
                    obj,
                    Some("admin.E122"),
                ));
            } else if self.list_display_links.is_empty()
                && self.list_display.first() == Some(name)
            {
                messages.push(CheckMessage::error(
                    format!(
                        "The value of 'list_editable[{i}]' refers to the first field in 'list_display' ('{name}'), which cannot be used unless 'list_display_links' is set."
                    ),
                    None,
                    obj,
                    Some("admin.E124"),
                ));
            } else if self.list_display_links.contains(name) {
                messages.push(CheckMessage::error(
                    format!(
                        "The value of 'list_editable[{i}]' refers to '{name}', which is also in 'list_display_links'."
                    ),
                    None,
                    obj,
                    Some("admin.E123"),
                ));
            }
        }

        for (i, filter) in self.list_filter.iter().enumerate() {
            let name = match filter {
                ListFilter::Field(name) | ListFilter::Date(name) => name,
                ListFilter::Simple(_) => continue,
            };
            match self.field(name) {
                None => messages.push(CheckMessage::error(
                    format!("The value of 'list_filter[{i}]' refers to '{name}', which does not refer to a field."),
                    None,
                    obj,
                    Some("admin.E116"),
                )),
                Some(f) if matches!(filter, ListFilter::Date(_)) && f.field_type != FieldType::DateTimeField => {
                    messages.push(CheckMessage::error(
                        format!("The value of 'list_filter[{i}]' refers to '{name}', which is not a date field."),
                        None,
                        obj,
                        Some("admin.E116"),
                    ));
                }
                Some(_) => {}
            }
        }

        for (i, entry) in self.ordering.iter().enumerate() {
            let name = entry.trim_start_matches('-');
            if self.field(name).is_none() {
                messages.push(CheckMessage::error(
                    format!("The value of 'ordering[{i}]' refers to '{name}', which is not a field."),
                    None,
                    obj,
                    Some("admin.E033"),
                ));
            }
        }

        for (i, name) in self.readonly_fields.iter().enumerate() {
            if self.field(name).is_none() && self.display_column(name).is_none() {
                messages.push(CheckMessage::error(
                    format!("The value of 'readonly_fields[{i}]' refers to '{name}', which is not a field."),
                    None,
                    obj,
                    Some("admin.E035"),
                ));
            }
        }

        for (i, name) in self.search_fields.iter().enumerate() {
            let head = name.split("__").next().unwrap_or(name);
            let problem = match self.field(head) {
                None => true,
                Some(f) => name.contains("__") && !f.is_relation(),
            };
            if problem {
                messages.push(CheckMessage::error(
                    format!("The value of 'search_fields[{i}]' refers to '{name}', which cannot be resolved."),
                    None,
                    obj,
                    Some("admin.E040"),
                ));
            }
        }

        let relation_options = [
            ("list_select_related", &self.list_select_related, FieldType::ForeignKey),
            ("prefetch_related", &self.prefetch_related, FieldType::ManyToManyField),
            ("filter_horizontal", &self.filter_horizontal, FieldType::ManyToManyField),
        ];
        for (option, names, expected) in relation_options {
            for (i, name) in names.iter().enumerate() {
                if !self.field(name).is_some_and(|f| f.field_type == expected) {
                    messages.push(CheckMessage::error(
                        format!(
                            "The value of '{option}[{i}]' refers to '{name}', which is not a {} field.",
                            expected.as_str()
                        ),
                        None,
                        obj,
                        Some("admin.E020"),
                    ));
                }
            }
        }

        let mut seen = HashSet::new();
        for fieldset in &self.fieldsets {
            for name in &fieldset.fields {
                if !seen.insert(name.as_str()) {
                    messages.push(CheckMessage::error(
                        format!("There are duplicate field(s) in 'fieldsets': '{name}'."),
                        None,
                        obj,
                        Some("admin.E012"),
                    ));
                }
            }
        }

        messages
    }
}

impl fmt::Debug for ModelAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<&str> = self.actions.iter().map(|a| a.name()).collect();
        f.debug_struct("ModelAdmin")
            .field("model", &self.model_key())
            .field("list_display", &self.list_display)
            .field("list_editable", &self.list_editable)
            .field("list_filter", &self.list_filter)
            .field("search_fields", &self.search_fields)
            .field("ordering", &self.ordering)
            .field("inlines", &self.inlines)
            .field("actions", &actions)
            .field("has_form", &self.form.is_some())
            .field("has_save_hook", &self.save_hook.is_some())
            .finish_non_exhaustive()
    }
}

/// A grouping of fields in the detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fieldset {
    /// Optional display name for this fieldset group.
    pub name: Option<String>,
    /// The fields included in this fieldset.
    pub fields: Vec<String>,
    /// CSS classes to apply to this fieldset (e.g., `"collapse"`, `"wide"`).
    pub classes: Vec<String>,
    /// Optional description text displayed below the fieldset title.
    pub description: Option<String>,
}

impl Fieldset {
    /// Creates a new fieldset with the given fields and no title.
    pub fn new(fields: Vec<&str>) -> Self {
        Self {
            name: None,
            fields: fields.into_iter().map(String::from).collect(),
            classes: Vec::new(),
            description: None,
        }
    }

    /// Sets the fieldset title.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the CSS classes.
    #[must_use]
    pub fn classes(mut self, classes: Vec<&str>) -> Self {
        self.classes = classes.into_iter().map(String::from).collect();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// Configuration for editing related objects within a parent's detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineAdmin {
    /// The app label of the inline model.
    pub app_label: String,
    /// The model name of the inline model.
    pub model_name: String,
    /// Foreign key on the inline model pointing at the parent.
    pub fk_name: String,
    /// The display layout for the inline editor.
    pub inline_type: InlineType,
    /// Number of extra empty forms to display.
    pub extra: usize,
    /// Minimum number of inline forms.
    pub min_num: usize,
    /// Maximum number of inline forms, if any.
    pub max_num: Option<usize>,
    /// Fields to display in the inline form.
    pub fields: Vec<String>,
}

impl InlineAdmin {
    /// Creates a new inline admin configuration.
    pub fn new(
        app_label: impl Into<String>,
        model_name: impl Into<String>,
        fk_name: impl Into<String>,
        inline_type: InlineType,
    ) -> Self {
        Self {
            app_label: app_label.into(),
            model_name: model_name.into(),
            fk_name: fk_name.into(),
            inline_type,
            extra: 3,
            min_num: 0,
            max_num: None,
            fields: Vec::new(),
        }
    }

    /// Sets the number of extra empty forms.
    #[must_use]
    pub const fn extra(mut self, n: usize) -> Self {
        self.extra = n;
        self
    }

    /// Sets the minimum number of forms.
    #[must_use]
    pub const fn min_num(mut self, n: usize) -> Self {
        self.min_num = n;
        self
    }

    /// Sets the maximum number of forms.
    #[must_use]
    pub const fn max_num(mut self, n: Option<usize>) -> Self {
        self.max_num = n;
        self
    }

    /// Sets the fields to display.
    #[must_use]
    pub fn fields(mut self, fields: Vec<&str>) -> Self {
        self.fields = fields.into_iter().map(String::from).collect();
        self
    }

    /// Returns the inline model key.
    pub fn model_key(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }
}

/// The visual layout style for inline model editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineType {
    /// Table-based layout with each inline as a row.
    Tabular,
    /// Form-based layout with each inline as a full form block.
    Stacked,
}

/// A filter in the list view sidebar.
#[derive(Clone)]
pub enum ListFilter {
    /// Filter by value of a field. Relations filter by related primary key.
    Field(String),
    /// Relative date ranges on a datetime field.
    Date(String),
    /// A custom filter with fixed lookups.
    Simple(Arc<dyn SimpleListFilter>),
}

impl ListFilter {
    /// Wraps a custom filter.
    pub fn simple(filter: impl SimpleListFilter + 'static) -> Self {
        Self::Simple(Arc::new(filter))
    }

    /// The query parameter that carries this filter's selection.
    pub fn parameter_name(&self) -> &str {
        match self {
            Self::Field(name) | Self::Date(name) => name,
            Self::Simple(filter) => filter.parameter_name(),
        }
    }
}

impl fmt::Debug for ListFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Self::Date(name) => f.debug_tuple("Date").field(name).finish(),
            Self::Simple(filter) => f.debug_tuple("Simple").field(&filter.parameter_name()).finish(),
        }
    }
}

/// A single choice within a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterChoice {
    /// The display label shown to the user.
    pub display: String,
    /// The value sent as a query parameter.
    pub value: String,
}

impl FilterChoice {
    /// Creates a new filter choice.
    pub fn new(display: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            value: value.into(),
        }
    }
}

/// Storage type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Auto-incrementing integer primary key.
    AutoField,
    /// Bounded text.
    CharField,
    /// Unbounded text.
    TextField,
    /// Boolean flag.
    BooleanField,
    /// Integer.
    IntegerField,
    /// RFC 3339 timestamp.
    DateTimeField,
    /// Primary key of one related object.
    ForeignKey,
    /// Ordered primary keys of related objects.
    ManyToManyField,
}

impl FieldType {
    /// Returns the type name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoField => "AutoField",
            Self::CharField => "CharField",
            Self::TextField => "TextField",
            Self::BooleanField => "BooleanField",
            Self::IntegerField => "IntegerField",
            Self::DateTimeField => "DateTimeField",
            Self::ForeignKey => "ForeignKey",
            Self::ManyToManyField => "ManyToManyField",
        }
    }
}

/// Schema information about a single model field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct FieldSchema {
    /// The field name.
    pub name: String,
    /// The field type.
    pub field_type: FieldType,
    /// Whether this field is required (non-null, non-blank).
    pub required: bool,
    /// Whether this field is read-only.
    pub read_only: bool,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Maximum character length, if applicable.
    pub max_length: Option<usize>,
    /// Human-readable label.
    pub label: String,
    /// Help text for the field.
    pub help_text: String,
    /// The target model for relational fields (e.g., "blog.category").
    pub related_model: Option<String>,
    /// Set to the current time on every save.
    pub auto_now: bool,
    /// Set to the current time when the object is created.
    pub auto_now_add: bool,
    /// Values must be unique across the table.
    pub unique: bool,
    /// Allowed values, if restricted.
    pub choices: Vec<FilterChoice>,
    /// Value stored on creation when none is submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl FieldSchema {
    /// Creates a new field schema entry.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let n = name.into();
        let label = n.replace('_', " ");
        Self {
            name: n,
            field_type,
            required: !matches!(field_type, FieldType::BooleanField | FieldType::ManyToManyField),
            read_only: false,
            primary_key: false,
            max_length: None,
            label,
            help_text: String::new(),
            related_model: None,
            auto_now: false,
            auto_now_add: false,
            unique: false,
            choices: Vec::new(),
            default: None,
        }
    }

    /// Creates a foreign key to `related_model`.
    pub fn foreign_key(name: impl Into<String>, related_model: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldType::ForeignKey);
        field.related_model = Some(related_model.into());
        field
    }

    /// Creates a many-to-many relation to `related_model`.
    ///
    /// New objects start with no related objects.
    pub fn many_to_many(name: impl Into<String>, related_model: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldType::ManyToManyField);
        field.related_model = Some(related_model.into());
        field.default = Some(serde_json::Value::Array(Vec::new()));
        field
    }

    /// Marks this field as optional (not required).
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Marks this field as read-only.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.read_only = true;
        self.required = false;
        self
    }

    /// Sets the maximum length.
    #[must_use]
    pub const fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Sets the human-readable label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Stamps the field with the current time on every save.
    #[must_use]
    pub const fn auto_now(mut self) -> Self {
        self.auto_now = true;
        self.required = false;
        self
    }

    /// Stamps the field with the current time on creation.
    #[must_use]
    pub const fn auto_now_add(mut self) -> Self {
        self.auto_now_add = true;
        self.required = false;
        self
    }

    /// Sets the value stored when an object is created without one.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Requires values to be unique across the table.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Restricts values to the given `(value, display)` pairs.
    #[must_use]
    pub fn choices(mut self, choices: Vec<(&str, &str)>) -> Self {
        self.choices = choices
            .into_iter()
            .map(|(value, display)| FilterChoice::new(display, value))
            .collect();
        self
    }

    /// Returns `true` for foreign keys and many-to-many fields.
    pub const fn is_relation(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::ForeignKey | FieldType::ManyToManyField
        )
    }
}
