//! The customized post screens of the staff site, driven over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use backoffice_admin::db::AdminDbExecutor;
use backoffice_admin::forms::REQUIRED;
use blog::admin::HTML_NOT_ALLOWED;
use blog::app::seed_demo_data;
use common::{app, login, send, send_raw, titles};
use serde_json::{json, Map, Value};

const POSTS: &str = "/admin/blog/post/";

async fn seeded() -> (axum::Router, blog::BlogApp, String) {
    let (router, app) = app().await;
    seed_demo_data(app.db()).await.unwrap();
    let token = login(&router, "/admin", "editor").await;
    (router, app, token)
}

fn published(objects: &[Value]) -> Vec<bool> {
    objects.iter().map(|o| o["published"].as_bool().unwrap()).collect()
}

fn fixture(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_body_with_markup_is_rejected_and_not_stored() {
    let (router, app, token) = seeded().await;
    let before = app.db().count("blog.post");

    let (status, body) = send(
        &router,
        Method::POST,
        POSTS,
        Some(&token),
        Some(json!({"title": "Bold", "body": "<b>hi</b>", "category": 1, "published": false})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["__all__"], json!([HTML_NOT_ALLOWED]));
    assert_eq!(app.db().count("blog.post"), before);

    let (status, body) = send(
        &router,
        Method::PUT,
        &format!("{POSTS}1/"),
        Some(&token),
        Some(json!({"body": "a <script>"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["__all__"], json!([HTML_NOT_ALLOWED]));
    let stored = app.db().get_object("blog.post", 1).await.unwrap();
    assert_eq!(stored["body"], "My Blog entry");
}

#[tokio::test]
async fn test_plain_body_is_saved() {
    let (router, app, token) = seeded().await;
    let (status, created) = send(
        &router,
        Method::POST,
        POSTS,
        Some(&token),
        Some(json!({
            "title": "Plain",
            "body": "a > b is fine",
            "category": 2,
            "tags": [3, 1],
            "published": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let pk = created["id"].as_i64().unwrap();

    let stored = app.db().get_object("blog.post", pk).await.unwrap();
    assert_eq!(stored["body"], "a > b is fine");
    assert_eq!(stored["tags"], json!([3, 1]));
    assert!(stored["created"].is_string());
    assert_eq!(stored["created"], stored["updated"]);
}

#[tokio::test]
async fn test_body_filter() {
    let (router, _, token) = seeded().await;

    let (status, list) = send(&router, Method::GET, &format!("{POSTS}?body_contains=Blog"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&list), vec!["Hello"]);

    let (_, list) = send(&router, Method::GET, &format!("{POSTS}?body_contains=Development"), Some(&token), None).await;
    assert_eq!(titles(&list), vec!["Notes"]);

    let (_, list) = send(&router, Method::GET, POSTS, Some(&token), None).await;
    assert_eq!(list["count"], 3);
    let body_filter = &list["filters"][0];
    assert_eq!(body_filter["parameter"], "body_contains");
    assert_eq!(body_filter["title"], "Body");
}

#[tokio::test]
async fn test_tags_column() {
    let (router, _, token) = seeded().await;
    let (_, list) = send(&router, Method::GET, &format!("{POSTS}?o=id"), Some(&token), None).await;
    let rows = list["results"].as_array().unwrap();
    assert_eq!(rows[0]["values"]["tags_summary"], "python, django");
    assert_eq!(rows[1]["values"]["tags_summary"], "");
    assert_eq!(rows[0]["values"]["category"], "Programming");

    let columns: Vec<&str> = list["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["label"].as_str().unwrap())
        .collect();
    assert_eq!(
        columns,
        vec!["id", "Blog Title", "category", "tags", "published", "created", "updated"]
    );
}

#[tokio::test]
async fn test_publish_and_unpublish_actions() {
    let (router, app, token) = seeded().await;
    assert_eq!(published(&app.db().all_objects("blog.post").await.unwrap()), [true, true, false]);

    let (status, result) = send(
        &router,
        Method::POST,
        &format!("{POSTS}action/"),
        Some(&token),
        Some(json!({"action": "publish", "selected_ids": [3, 99]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["success"], true);
    assert_eq!(result["affected_count"], 1);
    assert_eq!(published(&app.db().all_objects("blog.post").await.unwrap()), [true, true, true]);

    let (_, result) = send(
        &router,
        Method::POST,
        &format!("{POSTS}action/"),
        Some(&token),
        Some(json!({"action": "unpublish", "selected_ids": [1, 3]})),
    )
    .await;
    assert_eq!(result["affected_count"], 2);
    assert_eq!(published(&app.db().all_objects("blog.post").await.unwrap()), [false, true, false]);

    let (_, result) = send(
        &router,
        Method::POST,
        &format!("{POSTS}action/"),
        Some(&token),
        Some(json!({"action": "publish", "selected_ids": []})),
    )
    .await;
    assert_eq!(result["success"], false);
    assert_eq!(result["affected_count"], 0);
}

#[tokio::test]
async fn test_default_ordering_is_updated_then_created_descending() {
    let (router, _, token) = seeded().await;
    let (status, _) = send(
        &router,
        Method::PUT,
        &format!("{POSTS}2/"),
        Some(&token),
        Some(json!({"title": "Today, edited"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = send(&router, Method::GET, POSTS, Some(&token), None).await;
    assert_eq!(list["ordering"], json!(["-updated", "-created", "-id"]));
    let rows = list["results"].as_array().unwrap();
    assert_eq!(rows[0]["pk"], 2);
    let keys: Vec<(String, String)> = rows
        .iter()
        .map(|row| {
            let obj = &row["object"];
            (
                obj["updated"].as_str().unwrap().to_string(),
                obj["created"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert!(keys.windows(2).all(|pair| pair[0] >= pair[1]), "{keys:?}");
}

#[tokio::test]
async fn test_equal_updated_falls_back_to_created() {
    let (router, app) = app().await;
    let token = login(&router, "/admin", "editor").await;
    let db = app.db();
    db.insert_raw("blog.category", fixture(json!({"name": "Misc"})));
    for (title, created, updated) in [
        ("Older edit, later draft", "2024-02-01T00:00:00.000000Z", "2024-03-01T00:00:00.000000Z"),
        ("Older edit, earlier draft", "2024-01-01T00:00:00.000000Z", "2024-03-01T00:00:00.000000Z"),
        ("Latest edit", "2024-01-15T00:00:00.000000Z", "2024-04-01T00:00:00.000000Z"),
    ] {
        db.insert_raw(
            "blog.post",
            fixture(json!({
                "title": title,
                "body": "text",
                "category": 1,
                "tags": [],
                "published": false,
                "created": created,
                "updated": updated,
            })),
        );
    }

    let (status, list) = send(&router, Method::GET, POSTS, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        titles(&list),
        ["Latest edit", "Older edit, later draft", "Older edit, earlier draft"]
    );
}

#[tokio::test]
async fn test_bulk_actions_keep_updated_and_list_order() {
    let (router, app, token) = seeded().await;
    let (_, before) = send(&router, Method::GET, POSTS, Some(&token), None).await;
    let stamps: Vec<Value> = app
        .db()
        .all_objects("blog.post")
        .await
        .unwrap()
        .iter()
        .map(|p| p["updated"].clone())
        .collect();

    for (action, ids) in [("publish", json!([1, 3])), ("unpublish", json!([2]))] {
        let (status, result) = send(
            &router,
            Method::POST,
            &format!("{POSTS}action/"),
            Some(&token),
            Some(json!({"action": action, "selected_ids": ids})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["success"], true);
    }

    let posts = app.db().all_objects("blog.post").await.unwrap();
    assert_eq!(published(&posts), [true, false, true]);
    let after: Vec<Value> = posts.iter().map(|p| p["updated"].clone()).collect();
    assert_eq!(after, stamps);
    let (_, list) = send(&router, Method::GET, POSTS, Some(&token), None).await;
    assert_eq!(titles(&list), titles(&before));
}

#[tokio::test]
async fn test_new_posts_start_as_drafts() {
    let (router, app, token) = seeded().await;
    let (status, created) = send(
        &router,
        Method::POST,
        POSTS,
        Some(&token),
        Some(json!({"title": "Untagged", "body": "b", "category": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["published"], false);
    assert_eq!(created["tags"], json!([]));

    let (status, _) = send(
        &router,
        Method::PUT,
        "/admin/blog/category/1/",
        Some(&token),
        Some(json!({
            "name": "Programming",
            "inlines": {"blog.post": [{"title": "From inline", "body": "x"}]},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let posts = app.db().all_objects("blog.post").await.unwrap();
    let inline = posts.iter().find(|p| p["title"] == "From inline").unwrap();
    assert_eq!(inline["published"], false);
    assert_eq!(inline["tags"], json!([]));
}

#[tokio::test]
async fn test_listing_reads_each_related_table_once() {
    let (router, app, token) = seeded().await;
    let mut reads = Vec::new();
    for extra in [0, 9] {
        for i in 0..extra {
            let (status, _) = send(
                &router,
                Method::POST,
                POSTS,
                Some(&token),
                Some(json!({"title": format!("Extra {i}"), "body": "x", "category": 2, "tags": [1, 2, 3], "published": false})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        app.db().reset_queries();
        let (status, list) = send(&router, Method::GET, POSTS, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["count"], 3 + extra);
        reads.push(app.db().queries_executed());
    }
    // One read each for posts, categories and tags.
    assert_eq!(reads, vec![3, 3]);
}

#[tokio::test]
async fn test_list_edit_only_accepts_editable_columns() {
    let (router, app, token) = seeded().await;
    let uri = format!("{POSTS}list-edit/");

    let (status, body) = send(
        &router,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({"rows": [{"id": 1, "body": "sneaky"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Field 'body' is not editable in the list.");

    let (status, body) = send(
        &router,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({"rows": [{"id": 1, "title": "Renamed", "category": 2}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["updated"], 1);
    let stored = app.db().get_object("blog.post", 1).await.unwrap();
    assert_eq!(stored["title"], "Renamed");
    assert_eq!(stored["category"], 2);
    assert_eq!(stored["body"], "My Blog entry");
}

#[tokio::test]
async fn test_search_and_relation_filters() {
    let (router, _, token) = seeded().await;

    let (_, list) = send(&router, Method::GET, &format!("{POSTS}?q=daily&o=id"), Some(&token), None).await;
    assert_eq!(titles(&list), vec!["Today"]);
    let (_, list) = send(&router, Method::GET, &format!("{POSTS}?q=rust"), Some(&token), None).await;
    assert_eq!(titles(&list), vec!["Notes"]);

    let (_, list) = send(&router, Method::GET, &format!("{POSTS}?category=1&o=id"), Some(&token), None).await;
    assert_eq!(titles(&list), vec!["Hello", "Notes"]);
    let (_, list) = send(&router, Method::GET, &format!("{POSTS}?tags=2"), Some(&token), None).await;
    assert_eq!(titles(&list), vec!["Hello"]);

    let (status, body) = send(&router, Method::GET, &format!("{POSTS}?created=someday"), Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let (_, list) = send(&router, Method::GET, &format!("{POSTS}?created=today"), Some(&token), None).await;
    assert_eq!(list["count"], 3);
}

#[tokio::test]
async fn test_schema_and_script() {
    let (router, _, token) = seeded().await;
    let (status, schema) = send(&router, Method::GET, "/admin/blog/post/schema", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(schema["media_js"], json!(["/static/post.js"]));
    assert_eq!(schema["filter_horizontal"], json!(["tags"]));
    assert_eq!(schema["fields"][0]["name"], "title");
    assert_eq!(schema["fields"][0]["label"], "Blog Title");
    let fieldset_names: Vec<Value> = schema["fieldsets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|fs| fs["name"].clone())
        .collect();
    assert_eq!(
        fieldset_names,
        vec![Value::Null, json!("Content"), json!("Classification"), json!("Meta")]
    );
    let actions: Vec<&str> = schema["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"publish") && actions.contains(&"unpublish"));

    let (status, script) = send_raw(&router, Method::GET, "/static/post.js", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&script).contains("HTML tags are not allowed."));
}

#[tokio::test]
async fn test_category_inline_edits_posts() {
    let (router, app, token) = seeded().await;
    let (status, detail) = send(&router, Method::GET, "/admin/blog/category/2/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let inline = &detail["inlines"][0];
    assert_eq!(inline["rows"].as_array().unwrap().len(), 1);
    assert_eq!(inline["rows"][0]["title"], "Today");

    let (status, body) = send(
        &router,
        Method::PUT,
        "/admin/blog/category/2/",
        Some(&token),
        Some(json!({
            "name": "Daily life",
            "inlines": {"blog.post": [
                {"id": 2, "title": "", "body": "Diary of today"},
            ]},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["errors"]["blog.post-0-title"], json!([REQUIRED]));

    let (status, _) = send(
        &router,
        Method::PUT,
        "/admin/blog/category/2/",
        Some(&token),
        Some(json!({
            "name": "Daily life",
            "inlines": {"blog.post": [
                {"title": "Tomorrow", "body": "Plans"},
            ]},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let posts = app.db().all_objects("blog.post").await.unwrap();
    let tomorrow = posts.iter().find(|p| p["title"] == "Tomorrow").unwrap();
    assert_eq!(tomorrow["category"], 2);
}

#[tokio::test]
async fn test_deleting_a_category_removes_its_posts() {
    let (router, app, token) = seeded().await;
    let (status, _) = send(&router, Method::DELETE, "/admin/blog/category/1/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let remaining = app.db().all_objects("blog.post").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["title"], "Today");

    let (status, _) = send(&router, Method::DELETE, "/admin/blog/tag/1/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.db().count("blog.post"), 1);
}
