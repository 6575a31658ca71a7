//! JSON request and response types of the admin API.
//!
//! Handlers in [`site`](crate::site) exchange these types with clients. The
//! list view's own response lives in [`changelist`](crate::changelist).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::actions::ActionRegistry;
use crate::auth::UserContext;
use crate::model_admin::{FieldSchema, Fieldset, InlineAdmin, ModelAdmin};

/// A paginated JSON response for list views.
///
/// Contains the result set along with pagination metadata used to render
/// page controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonListResponse {
    /// The rows of the current page.
    pub results: Vec<Value>,
    /// Total number of matching objects (across all pages).
    pub count: usize,
    /// The current page number (1-indexed).
    pub page: usize,
    /// The number of items per page.
    pub page_size: usize,
    /// Total number of pages.
    pub total_pages: usize,
    /// Whether there is a next page.
    pub has_next: bool,
    /// Whether there is a previous page.
    pub has_previous: bool,
}

impl JsonListResponse {
    /// Creates a paginated response from a full result set and pagination parameters.
    ///
    /// Out-of-range pages are clamped to the nearest valid page.
    pub fn paginate(all_results: &[Value], page: usize, page_size: usize) -> Self {
        let count = all_results.len();
        let page_size = if page_size == 0 { 1 } else { page_size };
        let total_pages = count.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);

        let start = (page - 1) * page_size;
        let end = (start + page_size).min(count);
        let results = if start < count {
            all_results[start..end].to_vec()
        } else {
            Vec::new()
        };

        Self {
            results,
            count,
            page,
            page_size,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

/// Branding and registered models of a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteIndexResponse {
    /// Text at the top of every page.
    pub site_header: String,
    /// Browser title suffix.
    pub site_title: String,
    /// Heading of the index page.
    pub index_title: String,
    /// Link to the public site, if any.
    pub site_url: Option<String>,
    /// The registered models grouped by app label.
    pub apps: Vec<AppModels>,
}

/// Response listing registered models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelIndexResponse {
    /// The registered models grouped by app label.
    pub apps: Vec<AppModels>,
}

/// Models grouped under an application label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppModels {
    /// The application label.
    pub app_label: String,
    /// The models registered under this app.
    pub models: Vec<ModelInfo>,
}

/// Summary information about a registered model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// The model name.
    pub name: String,
    /// The human-readable name.
    pub verbose_name: String,
    /// The plural human-readable name.
    pub verbose_name_plural: String,
    /// The API URL for this model's list view.
    pub url: String,
}

/// Builds the model index response from registered model admins.
pub fn build_model_index<'a>(
    admins: impl IntoIterator<Item = &'a ModelAdmin>,
    url_prefix: &str,
) -> ModelIndexResponse {
    let mut apps_map: HashMap<String, Vec<ModelInfo>> = HashMap::new();

    for admin in admins {
        let info = ModelInfo {
            name: admin.model_name.clone(),
            verbose_name: admin.verbose_name.clone(),
            verbose_name_plural: admin.verbose_name_plural.clone(),
            url: format!("{}/{}/{}/", url_prefix, admin.app_label, admin.model_name),
        };
        apps_map
            .entry(admin.app_label.clone())
            .or_default()
            .push(info);
    }

    let mut apps: Vec<AppModels> = apps_map
        .into_iter()
        .map(|(app_label, mut models)| {
            models.sort_by(|a, b| a.name.cmp(&b.name));
            AppModels { app_label, models }
        })
        .collect();
    apps.sort_by(|a, b| a.app_label.cmp(&b.app_label));

    ModelIndexResponse { apps }
}

/// Name and description of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInfo {
    /// Identifier passed to the action endpoint.
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

impl ActionInfo {
    /// Lists the actions of a registry.
    pub fn from_registry(registry: &ActionRegistry) -> Vec<Self> {
        registry
            .action_descriptions()
            .into_iter()
            .map(|(name, description)| Self {
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect()
    }
}

/// Schema response for a model, used by clients for form rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSchemaResponse {
    /// The application label.
    pub app_label: String,
    /// The model name.
    pub model_name: String,
    /// Human-readable name.
    pub verbose_name: String,
    /// Plural human-readable name.
    pub verbose_name_plural: String,
    /// Form fields in display order, labels resolved.
    pub fields: Vec<FieldSchema>,
    /// Field groupings of the edit screen.
    pub fieldsets: Vec<Fieldset>,
    /// Fields shown but not editable.
    pub readonly_fields: Vec<String>,
    /// Columns of the list view.
    pub list_display: Vec<String>,
    /// Columns editable in the list view.
    pub list_editable: Vec<String>,
    /// Query parameters of the sidebar filters.
    pub list_filter: Vec<String>,
    /// Fields that are searchable.
    pub search_fields: Vec<String>,
    /// Default ordering.
    pub ordering: Vec<String>,
    /// Available actions.
    pub actions: Vec<ActionInfo>,
    /// Number of items per page.
    pub list_per_page: usize,
    /// Inline editors of related models.
    pub inlines: Vec<InlineAdmin>,
    /// Many-to-many fields using the horizontal selector.
    pub filter_horizontal: Vec<String>,
    /// Script URLs of the edit screen.
    pub media_js: Vec<String>,
}

impl ModelSchemaResponse {
    /// Creates a schema response from a `ModelAdmin`.
    ///
    /// Script files are resolved against `static_url`.
    pub fn from_model_admin(admin: &ModelAdmin, static_url: &str) -> Self {
        let fields = admin
            .form_fields()
            .iter()
            .filter_map(|name| {
                let mut field = admin.field(name)?.clone();
                field.label = admin.label_for(name);
                field.read_only = field.read_only || admin.is_readonly(name);
                Some(field)
            })
            .collect();
        let fieldsets = if admin.fieldsets.is_empty() {
            let names = admin.form_fields();
            vec![Fieldset::new(names.iter().map(String::as_str).collect())]
        } else {
            admin.fieldsets.clone()
        };
        let static_url = static_url.trim_end_matches('/');

        Self {
            app_label: admin.app_label.clone(),
            model_name: admin.model_name.clone(),
            verbose_name: admin.verbose_name.clone(),
            verbose_name_plural: admin.verbose_name_plural.clone(),
            fields,
            fieldsets,
            readonly_fields: admin.readonly_fields.clone(),
            list_display: admin.list_display.clone(),
            list_editable: admin.list_editable.clone(),
            list_filter: admin
                .list_filter
                .iter()
                .map(|f| f.parameter_name().to_string())
                .collect(),
            search_fields: admin.search_fields.clone(),
            ordering: admin.ordering.clone(),
            actions: ActionInfo::from_registry(&ActionRegistry::for_admin(admin)),
            list_per_page: admin.list_per_page,
            inlines: admin.inlines.clone(),
            filter_horizontal: admin.filter_horizontal.clone(),
            media_js: admin
                .media_js
                .iter()
                .map(|file| format!("{static_url}/{file}"))
                .collect(),
        }
    }
}

/// Related rows edited inline on a detail screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineFormset {
    /// Model key of the inline model.
    pub model: String,
    /// Foreign key pointing at the parent.
    pub fk_name: String,
    /// Fields shown per row.
    pub fields: Vec<String>,
    /// Existing related rows, projected to `id` plus the fields.
    pub rows: Vec<Value>,
    /// Number of blank rows offered for new objects.
    pub extra: usize,
}

/// Response of the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
    /// The stored object.
    pub object: Value,
    /// Its string form.
    pub display: String,
    /// Inline formsets, one per configured inline.
    pub inlines: Vec<InlineFormset>,
}

/// Request body of the update endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Field values.
    #[serde(flatten)]
    pub data: Map<String, Value>,
    /// Inline rows keyed by inline model key.
    #[serde(default)]
    pub inlines: HashMap<String, Vec<Map<String, Value>>>,
}

/// Current user info response.
pub type CurrentUserResponse = UserContext;

/// Request body of the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Response of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The logged-in user.
    pub user: CurrentUserResponse,
}

/// Request body of the action endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Action name.
    pub action: String,
    /// Primary keys of the selected objects.
    #[serde(default)]
    pub selected_ids: Vec<i64>,
}

/// Request body of the in-place list edit endpoint.
///
/// Each row carries `id` and values for `list_editable` columns only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEditRequest {
    /// Edited rows.
    pub rows: Vec<Map<String, Value>>,
}

/// Response of the in-place list edit endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEditResponse {
    /// Number of rows saved.
    pub updated: usize,
    /// The saved objects.
    pub objects: Vec<Value>,
}
