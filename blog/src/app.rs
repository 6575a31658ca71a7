//! Application assembly: shared store, accounts, both admin sites and the
//! static file service combined into one router.

use std::sync::Arc;

use axum::Router;
use backoffice_admin::auth::{UserContext, UserStore};
use backoffice_admin::db::{AdminDbExecutor, InMemoryAdminDb};
use backoffice_admin::model_admin::ModelAdmin;
use backoffice_admin::site::AdminSite;
use backoffice_core::checks::CheckMessage;
use backoffice_core::{AdminError, AdminResult, Settings};
use serde_json::{json, Map, Value};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::admin::{mypage_site, primary_site};
use crate::models::{Category, Post, Tag};

/// The blog back-office.
///
/// Both sites share one store and one account table; each keeps its own
/// login sessions.
#[derive(Debug, Clone)]
pub struct BlogApp {
    settings: Settings,
    db: InMemoryAdminDb,
    users: UserStore,
}

impl BlogApp {
    /// Creates the application over an empty store.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            db: InMemoryAdminDb::new(),
            users: UserStore::new(),
        }
    }

    /// Returns the settings the application was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the shared store.
    pub fn db(&self) -> &InMemoryAdminDb {
        &self.db
    }

    /// Returns the shared account table.
    pub fn users(&self) -> &UserStore {
        &self.users
    }

    /// Builds the staff site and the "my page" site, in that order.
    pub fn sites(&self) -> [AdminSite; 2] {
        let db: Arc<dyn AdminDbExecutor> = Arc::new(self.db.clone());
        [
            primary_site(&self.settings, Arc::clone(&db), self.users.clone()),
            mypage_site(&self.settings, db, self.users.clone()),
        ]
    }

    /// Runs the configuration checks of both sites and of the static
    /// asset mount.
    pub fn check(&self) -> Vec<CheckMessage> {
        let mut messages: Vec<CheckMessage> =
            self.sites().iter().flat_map(AdminSite::check).collect();
        let static_url = &self.settings.static_url;
        if !static_url.starts_with('/') || self.settings.static_mount().is_empty() {
            messages.push(CheckMessage::error(
                format!("The static_url setting '{static_url}' must be a path below the root."),
                Some("Use a value such as '/static/'."),
                None,
                Some("blog.E001"),
            ));
        }
        messages
    }

    /// Creates the configured superuser and, if enabled, the demo content.
    pub async fn bootstrap(&self) -> AdminResult<()> {
        let account = &self.settings.superuser;
        self.users
            .create_user(
                UserContext::new(account.username.as_str())
                    .staff(true)
                    .superuser(true),
                &account.password,
            )
            .await?;
        if self.settings.seed_demo_data {
            seed_demo_data(&self.db).await?;
        }
        Ok(())
    }

    /// Converts the application into an axum router.
    pub fn into_axum_router(self) -> Router {
        let [primary, mypage] = self.sites();
        Router::new()
            .nest(&self.settings.admin_prefix, primary.into_axum_router())
            .nest(&self.settings.mypage_prefix, mypage.into_axum_router())
            .nest_service(self.settings.static_mount(), ServeDir::new(&self.settings.static_dir))
            .layer(TraceLayer::new_for_http())
    }

    /// Serves the application on the configured address until the process
    /// is stopped.
    pub async fn run(self) -> AdminResult<()> {
        let addr = self.settings.bind_address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AdminError::Configuration(format!("Failed to bind to {addr}: {e}")))?;
        tracing::info!(
            admin = %self.settings.admin_prefix,
            mypage = %self.settings.mypage_prefix,
            "serving back-office at http://{addr}/"
        );
        axum::serve(listener, self.into_axum_router())
            .await
            .map_err(|e| AdminError::Internal(format!("Server error: {e}")))
    }
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Loads two categories, three tags and three posts.
///
/// The post bodies are the ones the body filter looks for.
pub async fn seed_demo_data(db: &dyn AdminDbExecutor) -> AdminResult<()> {
    let categories = ModelAdmin::for_model::<Category>();
    let tags = ModelAdmin::for_model::<Tag>();
    let posts = ModelAdmin::for_model::<Post>();

    let mut category_ids = Vec::new();
    for name in ["Programming", "Daily life"] {
        let obj = db.create_object(&categories, &fields(json!({"name": name}))).await?;
        category_ids.push(obj["id"].clone());
    }
    let mut tag_ids = Vec::new();
    for name in ["python", "django", "rust"] {
        let obj = db.create_object(&tags, &fields(json!({"name": name}))).await?;
        tag_ids.push(obj["id"].clone());
    }

    let demo = [
        ("Hello", "My Blog entry", &category_ids[0], vec![&tag_ids[0], &tag_ids[1]], true),
        ("Today", "Diary of today", &category_ids[1], vec![], true),
        ("Notes", "Development notes", &category_ids[0], vec![&tag_ids[2]], false),
    ];
    for (title, body, category, post_tags, published) in demo {
        let data = json!({
            "title": title,
            "body": body,
            "category": category,
            "tags": post_tags,
            "published": published,
        });
        db.create_object(&posts, &fields(data)).await?;
    }
    tracing::info!("demo data loaded");
    Ok(())
}
