//! The blog data model.
//!
//! Objects are stored as JSON documents; these types only describe their
//! shape. A post belongs to one category (`category` holds its id) and has
//! any number of tags (`tags` holds their ids in association order).

use backoffice_admin::model_admin::{AdminModel, FieldSchema, FieldType};

/// Application label shared by every blog model.
pub const APP_LABEL: &str = "blog";

/// A post category. Names are unique.
#[derive(Debug, Clone, Copy)]
pub struct Category;

impl AdminModel for Category {
    const APP_LABEL: &'static str = APP_LABEL;
    const MODEL_NAME: &'static str = "category";

    fn fields_schema() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("id", FieldType::AutoField).primary_key(),
            FieldSchema::new("name", FieldType::CharField)
                .max_length(255)
                .unique(),
        ]
    }

    fn str_field() -> Option<&'static str> {
        Some("name")
    }

    fn verbose_name_plural() -> String {
        "categories".to_string()
    }
}

/// A post tag. Names are unique.
#[derive(Debug, Clone, Copy)]
pub struct Tag;

impl AdminModel for Tag {
    const APP_LABEL: &'static str = APP_LABEL;
    const MODEL_NAME: &'static str = "tag";

    fn fields_schema() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("id", FieldType::AutoField).primary_key(),
            FieldSchema::new("name", FieldType::CharField)
                .max_length(255)
                .unique(),
        ]
    }

    fn str_field() -> Option<&'static str> {
        Some("name")
    }
}

/// A blog post.
///
/// `created` is stamped on insert, `updated` on every save. Posts start as
/// drafts.
#[derive(Debug, Clone, Copy)]
pub struct Post;

impl AdminModel for Post {
    const APP_LABEL: &'static str = APP_LABEL;
    const MODEL_NAME: &'static str = "post";

    fn fields_schema() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("id", FieldType::AutoField).primary_key(),
            FieldSchema::new("title", FieldType::CharField).max_length(255),
            FieldSchema::new("body", FieldType::TextField),
            FieldSchema::foreign_key("category", Category::model_key()),
            FieldSchema::many_to_many("tags", Tag::model_key()),
            FieldSchema::new("published", FieldType::BooleanField).default_value(false),
            FieldSchema::new("created", FieldType::DateTimeField).auto_now_add(),
            FieldSchema::new("updated", FieldType::DateTimeField).auto_now(),
        ]
    }

    fn str_field() -> Option<&'static str> {
        Some("title")
    }
}

/// Returns `"app.model"` for a model type.
pub trait ModelKey {
    /// The key models are registered and stored under.
    fn model_key() -> String;
}

impl<M: AdminModel> ModelKey for M {
    fn model_key() -> String {
        format!("{}.{}", M::APP_LABEL, M::MODEL_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_admin::model_admin::ModelAdmin;

    #[test]
    fn test_model_keys() {
        assert_eq!(Category::model_key(), "blog.category");
        assert_eq!(Tag::model_key(), "blog.tag");
        assert_eq!(Post::model_key(), "blog.post");
    }

    #[test]
    fn test_post_relations() {
        let admin = ModelAdmin::for_model::<Post>();
        let category = admin.field("category").unwrap();
        assert_eq!(category.field_type, FieldType::ForeignKey);
        assert_eq!(category.related_model.as_deref(), Some("blog.category"));
        let tags = admin.field("tags").unwrap();
        assert_eq!(tags.related_model.as_deref(), Some("blog.tag"));
        assert!(!tags.required);
        assert!(admin.is_readonly("created"));
        assert!(admin.is_readonly("updated"));
    }

    #[test]
    fn test_default_presentations_check_clean() {
        assert!(ModelAdmin::for_model::<Category>().check().is_empty());
        assert!(ModelAdmin::for_model::<Tag>().check().is_empty());
        assert!(ModelAdmin::for_model::<Post>().check().is_empty());
        assert_eq!(
            ModelAdmin::for_model::<Category>().verbose_name_plural,
            "categories"
        );
    }
}
