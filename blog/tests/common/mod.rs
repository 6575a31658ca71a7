#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use backoffice_admin::auth::UserContext;
use backoffice_core::Settings;
use blog::BlogApp;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PASSWORD: &str = "pw";

/// Settings with an empty store and the crate's static directory.
pub fn settings() -> Settings {
    Settings {
        seed_demo_data: false,
        static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        ..Settings::default()
    }
}

/// A bootstrapped app with three accounts besides the superuser:
/// `editor` (staff), `writer` (active, not staff) and `ghost` (inactive staff).
pub async fn app_with(settings: Settings) -> (Router, BlogApp) {
    let app = BlogApp::new(settings);
    app.bootstrap().await.unwrap();
    let users = app.users();
    users
        .create_user(UserContext::new("editor").staff(true), PASSWORD)
        .await
        .unwrap();
    users.create_user(UserContext::new("writer"), PASSWORD).await.unwrap();
    users
        .create_user(UserContext::new("ghost").staff(true).active(false), PASSWORD)
        .await
        .unwrap();
    (app.clone().into_axum_router(), app)
}

pub async fn app() -> (Router, BlogApp) {
    app_with(settings()).await
}

pub async fn send_raw(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };
    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes)
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(router, method, uri, token, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn try_login(router: &Router, site: &str, username: &str) -> (StatusCode, Value) {
    send(
        router,
        Method::POST,
        &format!("{site}/login/"),
        None,
        Some(json!({"username": username, "password": PASSWORD})),
    )
    .await
}

pub async fn login(router: &Router, site: &str, username: &str) -> String {
    let (status, body) = try_login(router, site, username).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

/// Titles of a list response, in row order.
pub fn titles(list: &Value) -> Vec<String> {
    list["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["object"]["title"].as_str().unwrap().to_string())
        .collect()
}
