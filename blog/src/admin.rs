//! Admin registrations of the blog models.
//!
//! [`primary_site`] is the staff back-office with the customized post
//! screens. [`mypage_site`] exposes the same models with default
//! presentation to every active user.

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_admin::actions::{ActionContext, ActionResult, AdminAction};
use backoffice_admin::auth::{active_required, UserStore};
use backoffice_admin::db::AdminDbExecutor;
use backoffice_admin::filters::SimpleListFilter;
use backoffice_admin::forms::AdminForm;
use backoffice_admin::hooks::SaveHook;
use backoffice_admin::lookups::STR_KEY;
use backoffice_admin::model_admin::{
    DisplayColumn, Fieldset, FilterChoice, InlineAdmin, InlineType, ListFilter,
    ModelAdmin,
};
use backoffice_admin::site::AdminSite;
use backoffice_core::{AdminResult, Settings, ValidationError};
use serde_json::{Map, Value};

use crate::models::{Category, Post, Tag};

/// Form-level error for bodies containing markup.
pub const HTML_NOT_ALLOWED: &str = "HTML tags are not allowed.";

/// Edit form of posts: relabels the title and rejects HTML in the body.
#[derive(Debug, Default)]
pub struct PostAdminForm;

impl AdminForm for PostAdminForm {
    fn label(&self, field: &str) -> Option<&str> {
        (field == "title").then_some("Blog Title")
    }

    fn clean(&self, cleaned: &Map<String, Value>) -> Result<(), ValidationError> {
        match cleaned.get("body").and_then(Value::as_str) {
            Some(body) if body.contains('<') => Err(ValidationError::new(HTML_NOT_ALLOWED)),
            _ => Ok(()),
        }
    }
}

/// Sidebar filter keeping posts whose body contains a fixed word.
#[derive(Debug, Default)]
pub struct PostTitleFilter;

impl PostTitleFilter {
    const WORDS: [&'static str; 3] = ["Blog", "Diary", "Development"];
}

impl SimpleListFilter for PostTitleFilter {
    fn title(&self) -> &str {
        "Body"
    }

    fn parameter_name(&self) -> &str {
        "body_contains"
    }

    fn lookups(&self) -> Vec<FilterChoice> {
        Self::WORDS
            .iter()
            .map(|word| FilterChoice::new(format!("Contains '{word}'"), *word))
            .collect()
    }

    fn queryset(&self, value: &str, objects: Vec<Value>) -> Vec<Value> {
        let needle = value.to_lowercase();
        objects
            .into_iter()
            .filter(|post| {
                post.get("body")
                    .and_then(Value::as_str)
                    .is_some_and(|body| body.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

/// The "tags" list column: tag names in association order.
pub fn tags_summary() -> DisplayColumn {
    DisplayColumn::new("tags_summary", "tags", |post| {
        post.get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| tag.get(STR_KEY).and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    })
}

async fn set_published(
    ctx: &ActionContext<'_>,
    selected_ids: &[i64],
    published: bool,
) -> AdminResult<usize> {
    let mut data = Map::new();
    data.insert("published".to_string(), Value::Bool(published));
    ctx.db.bulk_update(ctx.admin, selected_ids, &data).await
}

fn posts(n: usize) -> &'static str {
    if n == 1 {
        "post"
    } else {
        "posts"
    }
}

/// Marks the selected posts as published.
#[derive(Debug, Default)]
pub struct PublishAction;

#[async_trait]
impl AdminAction for PublishAction {
    fn name(&self) -> &'static str {
        "publish"
    }

    fn description(&self) -> &'static str {
        "Publish selected posts"
    }

    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        selected_ids: &[i64],
    ) -> AdminResult<ActionResult> {
        if selected_ids.is_empty() {
            return Ok(ActionResult::nothing_selected());
        }
        let n = set_published(ctx, selected_ids, true).await?;
        Ok(ActionResult::success(format!("Published {n} {}.", posts(n)), n))
    }
}

/// Reverts the selected posts to draft.
#[derive(Debug, Default)]
pub struct UnpublishAction;

#[async_trait]
impl AdminAction for UnpublishAction {
    fn name(&self) -> &'static str {
        "unpublish"
    }

    fn description(&self) -> &'static str {
        "Revert selected posts to draft"
    }

    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        selected_ids: &[i64],
    ) -> AdminResult<ActionResult> {
        if selected_ids.is_empty() {
            return Ok(ActionResult::nothing_selected());
        }
        let n = set_published(ctx, selected_ids, false).await?;
        Ok(ActionResult::success(
            format!("Reverted {n} {} to draft.", posts(n)),
            n,
        ))
    }
}

/// Traces every post save.
#[derive(Debug, Default)]
pub struct PostSaveHook;

impl SaveHook for PostSaveHook {
    fn before_save(&self, model_key: &str, _data: &Map<String, Value>, change: bool) {
        tracing::info!(model = model_key, change, "before save");
    }

    fn after_save(&self, model_key: &str, obj: &Value, change: bool) {
        tracing::info!(model = model_key, pk = ?obj.get("id"), change, "after save");
    }
}

/// Category screen: posts of the category are edited inline.
pub fn category_admin() -> ModelAdmin {
    ModelAdmin::for_model::<Category>().inlines(vec![InlineAdmin::new(
        "blog",
        "post",
        "category",
        InlineType::Tabular,
    )
    .fields(vec!["title", "body"])
    .extra(1)])
}

/// Tag screen: defaults.
pub fn tag_admin() -> ModelAdmin {
    ModelAdmin::for_model::<Tag>()
}

/// The customized post screen of the staff site.
pub fn post_admin() -> ModelAdmin {
    ModelAdmin::for_model::<Post>()
        .form(Arc::new(PostAdminForm))
        .readonly_fields(vec!["created", "updated"])
        .fieldsets(vec![
            Fieldset::new(vec!["title"]),
            Fieldset::new(vec!["body"]).name("Content"),
            Fieldset::new(vec!["category", "tags"]).name("Classification"),
            Fieldset::new(vec!["published", "created", "updated"]).name("Meta"),
        ])
        .filter_horizontal(vec!["tags"])
        .save_hook(Arc::new(PostSaveHook))
        .media_js(vec!["post.js"])
        .display(tags_summary())
        .list_display(vec![
            "id",
            "title",
            "category",
            "tags_summary",
            "published",
            "created",
            "updated",
        ])
        .list_select_related(vec!["category"])
        .prefetch_related(vec!["tags"])
        .list_editable(vec!["title", "category"])
        .search_fields(vec!["title", "category__name", "tags__name", "created", "updated"])
        .ordering(vec!["-updated", "-created"])
        .list_filter(vec![
            ListFilter::simple(PostTitleFilter),
            ListFilter::Field("category".into()),
            ListFilter::Field("tags".into()),
            ListFilter::Date("created".into()),
            ListFilter::Date("updated".into()),
        ])
        .actions(vec![Arc::new(PublishAction), Arc::new(UnpublishAction)])
}

/// The staff back-office mounted at `settings.admin_prefix`.
pub fn primary_site(
    settings: &Settings,
    db: Arc<dyn AdminDbExecutor>,
    users: UserStore,
) -> AdminSite {
    let mut site = AdminSite::new("admin")
        .url_prefix(&settings.admin_prefix)
        .static_url(&settings.static_url)
        .db(db)
        .users(users);
    for admin in [category_admin(), tag_admin(), post_admin()] {
        site.register(admin.list_per_page(settings.list_per_page));
    }
    site
}

/// The "My Page" site for every active user, mounted at
/// `settings.mypage_prefix`.
pub fn mypage_site(
    settings: &Settings,
    db: Arc<dyn AdminDbExecutor>,
    users: UserStore,
) -> AdminSite {
    let mut site = AdminSite::new("mypage")
        .url_prefix(&settings.mypage_prefix)
        .static_url(&settings.static_url)
        .site_header("My Page")
        .site_title("My Page")
        .index_title("My Page")
        .site_url(None)
        .permission(active_required)
        .db(db)
        .users(users);
    site.register(ModelAdmin::for_model::<Post>().list_per_page(settings.list_per_page));
    site.register(ModelAdmin::for_model::<Tag>().list_per_page(settings.list_per_page));
    site.register(ModelAdmin::for_model::<Category>().list_per_page(settings.list_per_page));
    site
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_admin::db::InMemoryAdminDb;
    use backoffice_core::checks::has_errors;
    use backoffice_core::NON_FIELD_ERRORS;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_form_rejects_html() {
        let form = PostAdminForm;
        let err = form
            .clean(&map(json!({"title": "t", "body": "<b>hi</b>"})))
            .unwrap_err();
        assert_eq!(err.messages_for(NON_FIELD_ERRORS), [HTML_NOT_ALLOWED]);
        assert!(form.clean(&map(json!({"body": "a > b"}))).is_ok());
        assert!(form.clean(&map(json!({"title": "no body"}))).is_ok());
    }

    #[test]
    fn test_form_label() {
        assert_eq!(PostAdminForm.label("title"), Some("Blog Title"));
        assert_eq!(PostAdminForm.label("body"), None);
        assert_eq!(post_admin().label_for("title"), "Blog Title");
        assert_eq!(post_admin().label_for("tags_summary"), "tags");
    }

    #[test]
    fn test_title_filter() {
        let filter = PostTitleFilter;
        let choices = filter.lookups();
        assert_eq!(choices.len(), 3);
        assert_eq!(choices[0], FilterChoice::new("Contains 'Blog'", "Blog"));
        assert_eq!(choices[2].display, "Contains 'Development'");

        let objects = vec![
            json!({"body": "My Blog entry"}),
            json!({"body": "Diary of today"}),
            json!({"body": "Development notes"}),
        ];
        let kept = filter.queryset("Blog", objects.clone());
        assert_eq!(kept, vec![json!({"body": "My Blog entry"})]);
        let kept = filter.queryset("development", objects);
        assert_eq!(kept, vec![json!({"body": "Development notes"})]);
    }

    #[test]
    fn test_tags_summary() {
        let column = tags_summary();
        let post = json!({"tags": [{"id": 2, STR_KEY: "python"}, {"id": 1, STR_KEY: "django"}]});
        assert_eq!(column.render(&post), "python, django");
        assert_eq!(column.render(&json!({"tags": []})), "");
        assert_eq!(column.render(&json!({})), "");
    }

    #[test]
    fn test_post_admin_configuration() {
        let admin = post_admin();
        assert!(admin.check().is_empty(), "{:?}", admin.check());
        assert_eq!(admin.ordering, vec!["-updated", "-created"]);
        let filters: Vec<_> = admin.list_filter.iter().map(ListFilter::parameter_name).collect();
        assert_eq!(
            filters,
            vec!["body_contains", "category", "tags", "created", "updated"]
        );
        assert_eq!(
            admin.form_fields(),
            vec!["title", "body", "category", "tags", "published", "created", "updated"]
        );
        assert_eq!(
            admin.editable_fields(),
            vec!["title", "body", "category", "tags", "published"]
        );
    }

    #[test]
    fn test_sites_check_clean() {
        let settings = Settings::default();
        let db: Arc<dyn AdminDbExecutor> = Arc::new(InMemoryAdminDb::new());
        let primary = primary_site(&settings, Arc::clone(&db), UserStore::new());
        let mypage = mypage_site(&settings, db, UserStore::new());
        assert!(!has_errors(&primary.check()));
        assert!(!has_errors(&mypage.check()));
        assert_eq!(primary.model_count(), 3);
        assert_eq!(
            mypage.registered_models(),
            vec!["blog.category", "blog.post", "blog.tag"]
        );
        assert_eq!(mypage.url_prefix_str(), "/mypage");
    }

    #[test]
    fn test_action_names() {
        assert_eq!(PublishAction.name(), "publish");
        assert_eq!(UnpublishAction.description(), "Revert selected posts to draft");
    }
}
