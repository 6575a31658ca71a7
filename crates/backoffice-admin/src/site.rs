//! Admin site registry and router generation.
//!
//! The [`AdminSite`] is the builder where models are registered with their
//! [`ModelAdmin`] configurations at startup. [`AdminSite::into_axum_router`]
//! consumes it into an immutable shared state and an Axum router serving the
//! JSON admin API. Several sites can share one store and one user store while
//! keeping their own registrations, branding, sessions and permission
//! predicate.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use backoffice_core::checks::CheckMessage;
use backoffice_core::logging::request_span;
use backoffice_core::{AdminError, AdminResult, ValidationError};
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::actions::{ActionContext, ActionRegistry, ActionResult};
use crate::api::{
    build_model_index, ActionRequest, CurrentUserResponse, DetailResponse, InlineFormset,
    ListEditRequest, ListEditResponse, LoginRequest, LoginResponse, ModelSchemaResponse,
    SiteIndexResponse, UpdateRequest,
};
use crate::auth::{staff_required, LoginFailure, PermissionFn, SessionStore, UserContext, UserStore};
use crate::changelist::{AdminListParams, ChangeList, ChangeListResponse};
use crate::db::{object_pk, AdminDbExecutor, DependentMap, InMemoryAdminDb, PK_FIELD};
use crate::forms::ModelForm;
use crate::lookups::relation_pks;
use crate::model_admin::{FieldType, InlineAdmin, ModelAdmin};
use crate::registry::ModelRegistry;

/// Refusal for unknown usernames and wrong passwords.
pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
/// Refusal for correct credentials of an inactive account.
pub const INACTIVE_ACCOUNT: &str = "This account is inactive.";
/// Refusal for users the site predicate rejects.
pub const NO_SITE_PERMISSION: &str = "You don't have permission to access this site.";

/// The admin site, responsible for model registration and route generation.
///
/// # Examples
///
/// ```
/// use backoffice_admin::site::AdminSite;
/// use backoffice_admin::model_admin::ModelAdmin;
///
/// let mut site = AdminSite::new("admin").site_header("Back office");
/// site.register(ModelAdmin::new("blog", "article"));
/// assert!(site.is_registered("blog.article"));
/// let router = site.into_axum_router();
/// ```
pub struct AdminSite {
    /// The site name, used in logs.
    name: String,
    /// The URL prefix the router is mounted under.
    url_prefix: String,
    site_header: String,
    site_title: String,
    index_title: String,
    site_url: Option<String>,
    /// Prefix of `media_js` script URLs.
    static_url: String,
    registry: ModelRegistry,
    permission: PermissionFn,
    db: Option<Arc<dyn AdminDbExecutor>>,
    users: Option<UserStore>,
}

impl AdminSite {
    /// Creates a new admin site with the given name.
    ///
    /// The site is mounted at `/<name>`, uses the staff-only predicate and
    /// the default branding.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url_prefix: format!("/{name}"),
            site_header: "Site administration".to_string(),
            site_title: "Site admin".to_string(),
            index_title: "Site administration".to_string(),
            site_url: Some("/".to_string()),
            static_url: "/static/".to_string(),
            registry: ModelRegistry::new(),
            permission: Arc::new(staff_required),
            db: None,
            users: None,
        }
    }

    /// Sets the URL prefix used in generated model URLs.
    #[must_use]
    pub fn url_prefix(mut self, prefix: &str) -> Self {
        self.url_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    /// Sets the header shown at the top of every page.
    #[must_use]
    pub fn site_header(mut self, header: impl Into<String>) -> Self {
        self.site_header = header.into();
        self
    }

    /// Sets the browser title suffix.
    #[must_use]
    pub fn site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = title.into();
        self
    }

    /// Sets the heading of the index page.
    #[must_use]
    pub fn index_title(mut self, title: impl Into<String>) -> Self {
        self.index_title = title.into();
        self
    }

    /// Sets the "view site" link. `None` hides it.
    #[must_use]
    pub fn site_url(mut self, url: Option<&str>) -> Self {
        self.site_url = url.map(String::from);
        self
    }

    /// Sets the prefix of static asset URLs.
    #[must_use]
    pub fn static_url(mut self, url: &str) -> Self {
        self.static_url = url.to_string();
        self
    }

    /// Sets the predicate deciding who may use the site.
    #[must_use]
    pub fn permission(mut self, predicate: impl Fn(&UserContext) -> bool + Send + Sync + 'static) -> Self {
        self.permission = Arc::new(predicate);
        self
    }

    /// Sets the store backing the site.
    #[must_use]
    pub fn db(mut self, db: Arc<dyn AdminDbExecutor>) -> Self {
        self.db = Some(db);
        self
    }

    /// Sets the accounts that may log in.
    #[must_use]
    pub fn users(mut self, users: UserStore) -> Self {
        self.users = Some(users);
        self
    }

    /// Returns the site name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the URL prefix.
    pub fn url_prefix_str(&self) -> &str {
        &self.url_prefix
    }

    /// Registers a model admin, replacing any previous registration.
    pub fn register(&mut self, admin: ModelAdmin) {
        tracing::debug!(site = %self.name, model = %admin.model_key(), "registering model");
        self.registry.insert(admin);
    }

    /// Returns the model admin registered under `model_key`.
    pub fn get_model_admin(&self, model_key: &str) -> Option<&ModelAdmin> {
        self.registry.get(model_key)
    }

    /// Returns the registered model keys, sorted.
    pub fn registered_models(&self) -> Vec<String> {
        self.registry.iter().map(ModelAdmin::model_key).collect()
    }

    /// Returns the number of registered models.
    pub fn model_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if the model is registered.
    pub fn is_registered(&self, model_key: &str) -> bool {
        self.registry.contains(model_key)
    }

    /// Validates every registration.
    pub fn check(&self) -> Vec<CheckMessage> {
        let mut messages = Vec::new();
        for admin in &self.registry {
            messages.extend(admin.check());
            for inline in &admin.inlines {
                messages.extend(self.check_inline(admin, inline));
            }
        }
        messages
    }

    fn check_inline(&self, parent: &ModelAdmin, inline: &InlineAdmin) -> Option<CheckMessage> {
        let obj = parent.model_key();
        let inline_key = inline.model_key();
        let Some(child) = self.registry.get(&inline_key) else {
            return Some(CheckMessage::error(
                format!("The inline model '{inline_key}' is not registered."),
                Some("Register the inline model on the same site."),
                Some(obj.as_str()),
                Some("admin.E201"),
            ));
        };
        let points_at_parent = child.field(&inline.fk_name).is_some_and(|f| {
            f.field_type == FieldType::ForeignKey && f.related_model.as_deref() == Some(obj.as_str())
        });
        if points_at_parent {
            None
        } else {
            Some(CheckMessage::error(
                format!("'{inline_key}' has no ForeignKey '{}' to '{obj}'.", inline.fk_name),
                None,
                Some(obj.as_str()),
                Some("admin.E202"),
            ))
        }
    }

    /// Generates the Axum router with all admin API endpoints.
    ///
    /// The generated routes are:
    ///
    /// - `POST /login/` - Authenticate and get token
    /// - `POST /logout/` - Invalidate session
    /// - `GET /` - Branding and registered models
    /// - `GET /me/` - Current user info
    /// - `GET /:app/:model/schema` - Model schema/introspection
    /// - `GET /:app/:model/` - List objects (paginated, filtered, searched)
    /// - `POST /:app/:model/` - Create a new object
    /// - `POST /:app/:model/action/` - Execute bulk action
    /// - `POST /:app/:model/list-edit/` - Edit list columns in place
    /// - `GET /:app/:model/:pk/` - Get single object with inlines
    /// - `PUT /:app/:model/:pk/` - Update an object and its inlines
    /// - `DELETE /:app/:model/:pk/` - Delete an object
    ///
    /// Every route except login requires a bearer token of a user accepted
    /// by the site's predicate.
    pub fn into_axum_router(self) -> Router {
        let db: Arc<dyn AdminDbExecutor> =
            self.db.unwrap_or_else(|| Arc::new(InMemoryAdminDb::new()));
        let dependents = self.registry.dependents();

        let shared = Arc::new(AdminSiteState {
            name: self.name,
            url_prefix: self.url_prefix,
            site_header: self.site_header,
            site_title: self.site_title,
            index_title: self.index_title,
            site_url: self.site_url,
            static_url: self.static_url,
            registry: self.registry,
            dependents,
            permission: self.permission,
            db,
            users: self.users.unwrap_or_default(),
            sessions: SessionStore::new(),
        });

        Router::new()
            .route("/login/", post(handle_login))
            .route("/logout/", post(handle_logout))
            .route("/", get(handle_index))
            .route("/me/", get(handle_me))
            .route("/{app}/{model}/schema", get(handle_schema))
            .route("/{app}/{model}/", get(handle_list).post(handle_create))
            .route("/{app}/{model}/action/", post(handle_action))
            .route("/{app}/{model}/list-edit/", post(handle_list_edit))
            .route(
                "/{app}/{model}/{pk}/",
                get(handle_detail).put(handle_update).delete(handle_delete),
            )
            .layer(middleware::from_fn_with_state(Arc::clone(&shared), trace_request))
            .with_state(shared)
    }
}

impl std::fmt::Debug for AdminSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSite")
            .field("name", &self.name)
            .field("url_prefix", &self.url_prefix)
            .field("model_count", &self.registry.len())
            .field("models", &self.registered_models().join(", "))
            .finish_non_exhaustive()
    }
}

/// Shared state for Axum handlers.
struct AdminSiteState {
    name: String,
    url_prefix: String,
    site_header: String,
    site_title: String,
    index_title: String,
    site_url: Option<String>,
    static_url: String,
    registry: ModelRegistry,
    dependents: DependentMap,
    permission: PermissionFn,
    db: Arc<dyn AdminDbExecutor>,
    users: UserStore,
    sessions: SessionStore,
}

impl AdminSiteState {
    fn model_admin(&self, app: &str, model: &str) -> Result<&ModelAdmin, ApiError> {
        self.registry
            .find(app, model)
            .ok_or_else(|| AdminError::NotFound(format!("Model '{app}.{model}' not found")).into())
    }

    /// Resolves the bearer token to a user the site admits.
    ///
    /// The account is re-read on every request, so deactivating a user
    /// revokes access immediately.
    async fn authorize(&self, headers: &HeaderMap) -> Result<UserContext, ApiError> {
        let token = bearer_token(headers).ok_or_else(|| {
            AdminError::Unauthorized("Authentication credentials were not provided.".to_string())
        })?;
        let username = self
            .sessions
            .username(token)
            .await
            .ok_or_else(|| AdminError::Unauthorized("Invalid token.".to_string()))?;
        let user = self
            .users
            .get(&username)
            .await
            .ok_or_else(|| AdminError::Unauthorized("Invalid token.".to_string()))?;
        if !user.is_active {
            tracing::warn!(site = %self.name, username = %user.username, "inactive user refused");
            return Err(AdminError::PermissionDenied(INACTIVE_ACCOUNT.to_string()).into());
        }
        if !(self.permission)(&user) {
            tracing::warn!(site = %self.name, username = %user.username, "permission denied");
            return Err(AdminError::PermissionDenied(NO_SITE_PERMISSION.to_string()).into());
        }
        Ok(user)
    }

    /// Fires the save hook around one write.
    async fn save(
        &self,
        admin: &ModelAdmin,
        pk: Option<i64>,
        data: &Map<String, Value>,
    ) -> AdminResult<Value> {
        let key = admin.model_key();
        let change = pk.is_some();
        if let Some(hook) = &admin.save_hook {
            hook.before_save(&key, data, change);
        }
        let obj = match pk {
            Some(pk) => self.db.update_object(admin, pk, data).await?,
            None => self.db.create_object(admin, data).await?,
        };
        if let Some(hook) = &admin.save_hook {
            hook.after_save(&key, &obj, change);
        }
        tracing::info!(
            site = %self.name,
            model = %key,
            pk = object_pk(&obj),
            change,
            "object saved"
        );
        Ok(obj)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn parse_pk(pk: &str) -> Result<i64, ApiError> {
    pk.parse()
        .map_err(|_| AdminError::NotFound(format!("No object with primary key '{pk}'")).into())
}

/// An [`AdminError`] rendered as a JSON response.
///
/// Validation errors become `{"errors": {field: [messages]}}`; everything
/// else becomes `{"error": message}`. The status follows
/// [`AdminError::status_code`].
#[derive(Debug)]
pub struct ApiError(pub AdminError);

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "admin request failed");
        }
        let body = match self.0 {
            AdminError::Validation(errors) => serde_json::json!({ "errors": errors.errors }),
            AdminError::BadRequest(msg)
            | AdminError::Unauthorized(msg)
            | AdminError::PermissionDenied(msg)
            | AdminError::NotFound(msg)
            | AdminError::Conflict(msg) => serde_json::json!({ "error": msg }),
            other => serde_json::json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Runs every request inside a span naming the site.
async fn trace_request(
    State(state): State<Arc<AdminSiteState>>,
    request: Request,
    next: Next,
) -> Response {
    let span = request_span(&state.name, request.method().as_str(), request.uri().path());
    next.run(request).instrument(span).await
}

// ── Authentication Handlers ────────────────────────────────────────

/// Handler for `POST /login/` - authenticate with username/password.
async fn handle_login(
    State(state): State<Arc<AdminSiteState>>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = match state.users.authenticate(&payload.username, &payload.password).await? {
        Ok(user) => user,
        Err(LoginFailure::InvalidCredentials) => {
            tracing::warn!(site = %state.name, username = %payload.username, "login failed");
            return Err(AdminError::Unauthorized(INVALID_LOGIN.to_string()).into());
        }
        Err(LoginFailure::Inactive) => {
            tracing::warn!(site = %state.name, username = %payload.username, "inactive login refused");
            return Err(AdminError::PermissionDenied(INACTIVE_ACCOUNT.to_string()).into());
        }
    };
    if !(state.permission)(&user) {
        tracing::warn!(site = %state.name, username = %user.username, "login refused by site permission");
        return Err(AdminError::PermissionDenied(NO_SITE_PERMISSION.to_string()).into());
    }
    let token = state.sessions.create(&user.username).await;
    tracing::info!(site = %state.name, username = %user.username, "logged in");
    Ok(Json(LoginResponse { token, user }))
}

/// Handler for `POST /logout/` - invalidate session.
async fn handle_logout(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let token = bearer_token(&headers).ok_or_else(|| {
        AdminError::Unauthorized("Authentication credentials were not provided.".to_string())
    })?;
    state.sessions.remove(token).await;
    Ok(StatusCode::NO_CONTENT)
}

// ── Index / Me Handlers ────────────────────────────────────────────

/// Handler for `GET /` - branding and registered models.
async fn handle_index(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
) -> ApiResult<Json<SiteIndexResponse>> {
    state.authorize(&headers).await?;
    let index = build_model_index(&state.registry, &state.url_prefix);
    Ok(Json(SiteIndexResponse {
        site_header: state.site_header.clone(),
        site_title: state.site_title.clone(),
        index_title: state.index_title.clone(),
        site_url: state.site_url.clone(),
        apps: index.apps,
    }))
}

/// Handler for `GET /me/` - current user info.
async fn handle_me(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
) -> ApiResult<Json<CurrentUserResponse>> {
    Ok(Json(state.authorize(&headers).await?))
}

// ── Schema / List Handlers ─────────────────────────────────────────

/// Handler for `GET /:app/:model/schema` - model schema introspection.
async fn handle_schema(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
    Path((app, model)): Path<(String, String)>,
) -> ApiResult<Json<ModelSchemaResponse>> {
    state.authorize(&headers).await?;
    let admin = state.model_admin(&app, &model)?;
    Ok(Json(ModelSchemaResponse::from_model_admin(admin, &state.static_url)))
}

/// Handler for `GET /:app/:model/` - list objects.
async fn handle_list(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
    Path((app, model)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ChangeListResponse>> {
    state.authorize(&headers).await?;
    let admin = state.model_admin(&app, &model)?;
    let params = AdminListParams::from_query(&query);
    let response = ChangeList::new(state.db.as_ref(), &state.registry, admin)
        .build(&params)
        .await?;
    Ok(Json(response))
}

// ── CRUD Handlers ──────────────────────────────────────────────────

/// Handler for `POST /:app/:model/` - create a new object.
async fn handle_create(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
    Path((app, model)): Path<(String, String)>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    state.authorize(&headers).await?;
    let admin = state.model_admin(&app, &model)?;
    let cleaned = ModelForm::for_admin(admin)
        .validate(state.db.as_ref(), None, &body)
        .await?;
    let obj = state.save(admin, None, &cleaned).await?;
    Ok((StatusCode::CREATED, Json(obj)))
}

/// Handler for `GET /:app/:model/:pk/` - get single object with inlines.
async fn handle_detail(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
    Path((app, model, pk)): Path<(String, String, String)>,
) -> ApiResult<Json<DetailResponse>> {
    state.authorize(&headers).await?;
    let admin = state.model_admin(&app, &model)?;
    let pk = parse_pk(&pk)?;
    let object = state.db.get_object(&admin.model_key(), pk).await?;

    let mut inlines = Vec::with_capacity(admin.inlines.len());
    for inline in &admin.inlines {
        inlines.push(inline_formset(&state, inline, pk).await?);
    }

    Ok(Json(DetailResponse {
        display: admin.object_str(&object),
        object,
        inlines,
    }))
}

async fn inline_formset(
    state: &AdminSiteState,
    inline: &InlineAdmin,
    parent_pk: i64,
) -> AdminResult<InlineFormset> {
    let fields = inline_fields(state, inline)?;
    let rows: Vec<Value> = state
        .db
        .all_objects(&inline.model_key())
        .await?
        .into_iter()
        .filter(|row| relation_pks(row, &inline.fk_name).contains(&parent_pk))
        .map(|row| {
            let mut projected = Map::new();
            for name in std::iter::once(PK_FIELD).chain(fields.iter().map(String::as_str)) {
                projected.insert(name.to_string(), row.get(name).cloned().unwrap_or(Value::Null));
            }
            Value::Object(projected)
        })
        .collect();
    let extra = inline
        .max_num
        .map_or(inline.extra, |max| inline.extra.min(max.saturating_sub(rows.len())));
    Ok(InlineFormset {
        model: inline.model_key(),
        fk_name: inline.fk_name.clone(),
        fields,
        rows,
        extra,
    })
}

/// The inline's configured fields, or the inline model's editable fields.
fn inline_fields(state: &AdminSiteState, inline: &InlineAdmin) -> AdminResult<Vec<String>> {
    if !inline.fields.is_empty() {
        return Ok(inline.fields.clone());
    }
    let child = inline_admin(state, inline)?;
    Ok(child
        .editable_fields()
        .into_iter()
        .filter(|f| *f != inline.fk_name)
        .collect())
}

fn inline_admin<'a>(state: &'a AdminSiteState, inline: &InlineAdmin) -> AdminResult<&'a ModelAdmin> {
    state.registry.get(&inline.model_key()).ok_or_else(|| {
        AdminError::Configuration(format!(
            "Inline model '{}' is not registered",
            inline.model_key()
        ))
    })
}

/// Handler for `PUT /:app/:model/:pk/` - update an object and its inlines.
async fn handle_update(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
    Path((app, model, pk)): Path<(String, String, String)>,
    Json(body): Json<UpdateRequest>,
) -> ApiResult<Json<Value>> {
    state.authorize(&headers).await?;
    let admin = state.model_admin(&app, &model)?;
    let pk = parse_pk(&pk)?;
    let existing = state.db.get_object(&admin.model_key(), pk).await?;

    let mut errors = ValidationError::default();
    let cleaned = collect_errors(
        ModelForm::for_admin(admin)
            .validate(state.db.as_ref(), Some(&existing), &body.data)
            .await,
        None,
        &mut errors,
    )?;

    let mut inline_writes = Vec::new();
    for (inline_key, rows) in &body.inlines {
        let inline = admin
            .inlines
            .iter()
            .find(|i| i.model_key() == *inline_key)
            .ok_or_else(|| AdminError::BadRequest(format!("Unknown inline '{inline_key}'")))?;
        inline_writes.extend(clean_inline(&state, inline, pk, rows, &mut errors).await?);
    }

    if !errors.is_empty() {
        return Err(AdminError::Validation(errors).into());
    }
    let cleaned = cleaned.unwrap_or_default();
    let obj = state.save(admin, Some(pk), &cleaned).await?;

    for (child, row_pk, data) in inline_writes {
        match row_pk {
            Some(row_pk) => state.db.update_object(child, row_pk, &data).await?,
            None => state.db.create_object(child, &data).await?,
        };
    }
    Ok(Json(obj))
}

/// Keeps a successful form result, or moves its validation messages into
/// `errors` under `prefix`.
fn collect_errors(
    result: AdminResult<Map<String, Value>>,
    prefix: Option<&str>,
    errors: &mut ValidationError,
) -> AdminResult<Option<Map<String, Value>>> {
    match result {
        Ok(cleaned) => Ok(Some(cleaned)),
        Err(AdminError::Validation(form_errors)) => {
            for (field, messages) in form_errors.errors {
                let key = prefix.map_or_else(|| field.clone(), |p| format!("{p}-{field}"));
                for message in messages {
                    errors.add(key.clone(), message);
                }
            }
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

type InlineWrite<'a> = (&'a ModelAdmin, Option<i64>, Map<String, Value>);

/// Validates the submitted rows of one inline.
///
/// Rows with an `id` change that related object; rows without one create a
/// new object pointing at the parent unless every field is blank.
async fn clean_inline<'a>(
    state: &'a AdminSiteState,
    inline: &InlineAdmin,
    parent_pk: i64,
    rows: &[Map<String, Value>],
    errors: &mut ValidationError,
) -> AdminResult<Vec<InlineWrite<'a>>> {
    let child = inline_admin(state, inline)?;
    let fields = inline_fields(state, inline)?;
    let form = ModelForm::plain(child, &fields);
    let inline_key = inline.model_key();
    let mut writes = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let prefix = format!("{inline_key}-{i}");
        match row.get(PK_FIELD).and_then(Value::as_i64) {
            Some(row_pk) => {
                let existing = state.db.get_object(&inline_key, row_pk).await?;
                if !relation_pks(&existing, &inline.fk_name).contains(&parent_pk) {
                    return Err(AdminError::BadRequest(format!(
                        "'{inline_key}' {row_pk} does not belong to this object"
                    )));
                }
                let result = form.validate(state.db.as_ref(), Some(&existing), row).await;
                if let Some(cleaned) = collect_errors(result, Some(&prefix), errors)? {
                    writes.push((child, Some(row_pk), cleaned));
                }
            }
            None if is_blank_row(row, form.fields()) => {}
            None => {
                let result = form.validate(state.db.as_ref(), None, row).await;
                if let Some(mut cleaned) = collect_errors(result, Some(&prefix), errors)? {
                    cleaned.insert(inline.fk_name.clone(), Value::from(parent_pk));
                    writes.push((child, None, cleaned));
                }
            }
        }
    }

    if let Some(max) = inline.max_num {
        let existing = state
            .db
            .all_objects(&inline_key)
            .await?
            .iter()
            .filter(|row| relation_pks(row, &inline.fk_name).contains(&parent_pk))
            .count();
        let added = writes.iter().filter(|(_, pk, _)| pk.is_none()).count();
        if existing + added > max {
            errors.add(
                format!("{inline_key}-{}", backoffice_core::NON_FIELD_ERRORS),
                format!("Please submit at most {max} forms."),
            );
        }
    }
    Ok(writes)
}

fn is_blank_row(row: &Map<String, Value>, fields: &[String]) -> bool {
    fields.iter().all(|f| match row.get(f) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    })
}

/// Handler for `DELETE /:app/:model/:pk/` - delete an object.
async fn handle_delete(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
    Path((app, model, pk)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let user = state.authorize(&headers).await?;
    let admin = state.model_admin(&app, &model)?;
    let pk = parse_pk(&pk)?;
    let key = admin.model_key();
    state.db.get_object(&key, pk).await?;
    state.db.delete_objects(&key, &[pk], &state.dependents).await?;
    tracing::info!(site = %state.name, model = %key, pk, user = %user.username, "object deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ── Action / List-edit Handlers ────────────────────────────────────

/// Handler for `POST /:app/:model/action/` - execute a bulk action.
async fn handle_action(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
    Path((app, model)): Path<(String, String)>,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Json<ActionResult>> {
    let user = state.authorize(&headers).await?;
    let admin = state.model_admin(&app, &model)?;
    let ctx = ActionContext {
        db: state.db.as_ref(),
        admin,
        dependents: &state.dependents,
        user: &user,
    };
    let result = ActionRegistry::for_admin(admin)
        .execute(&request.action, &ctx, &request.selected_ids)
        .await?;
    Ok(Json(result))
}

/// Handler for `POST /:app/:model/list-edit/` - edit `list_editable` columns.
///
/// Every row is validated before any is written.
async fn handle_list_edit(
    State(state): State<Arc<AdminSiteState>>,
    headers: HeaderMap,
    Path((app, model)): Path<(String, String)>,
    Json(request): Json<ListEditRequest>,
) -> ApiResult<Json<ListEditResponse>> {
    state.authorize(&headers).await?;
    let admin = state.model_admin(&app, &model)?;
    let key = admin.model_key();
    let form = ModelForm::plain(admin, &admin.list_editable);

    let mut errors = ValidationError::default();
    let mut writes = Vec::with_capacity(request.rows.len());
    for (i, row) in request.rows.iter().enumerate() {
        let pk = row
            .get(PK_FIELD)
            .and_then(Value::as_i64)
            .ok_or_else(|| AdminError::BadRequest(format!("Row {i} has no '{PK_FIELD}'.")))?;
        if let Some(column) = row
            .keys()
            .find(|k| *k != PK_FIELD && !admin.list_editable.contains(*k))
        {
            return Err(AdminError::BadRequest(format!(
                "Field '{column}' is not editable in the list."
            ))
            .into());
        }
        let existing = state.db.get_object(&key, pk).await?;
        let result = form.validate(state.db.as_ref(), Some(&existing), row).await;
        if let Some(cleaned) = collect_errors(result, Some(&format!("form-{i}")), &mut errors)? {
            writes.push((pk, cleaned));
        }
    }
    if !errors.is_empty() {
        return Err(AdminError::Validation(errors).into());
    }

    let mut objects = Vec::with_capacity(writes.len());
    for (pk, cleaned) in writes {
        objects.push(state.save(admin, Some(pk), &cleaned).await?);
    }
    Ok(Json(ListEditResponse {
        updated: objects.len(),
        objects,
    }))
}
