// path: crates/catalog_stub/tests/helpers.rs
#![allow(dead_code)]

use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;

use catalog_stub::catalog::{course, Catalog};
use catalog_stub::config::StubConfig;
use catalog_stub::http_api::{router, AppState};
use pastexam_api::{FileEntry, User};

/// `n` курсов "Calculus {i}" в MATH, удобно для проверки постраничной выдачи
pub fn calc_catalog(n: usize) -> Catalog {
    Catalog::new(
        (0..n)
            .map(|i| course("MATH", &format!("{:03}", 100 + i), &format!("Calculus {i}"), "Lee"))
            .collect(),
    )
}

pub fn cfg() -> StubConfig {
    StubConfig {
        addr: "127.0.0.1:0".into(),
        catalog_path: None,
        max_limit: 100,
    }
}

pub fn user() -> User {
    User {
        user_id: Some("7".into()),
        username: "amy".into(),
        email: "amy@example.edu".into(),
        avatar: None,
        department: None,
        is_profile_completed: true,
    }
}

pub fn file(id: i64) -> FileEntry {
    FileEntry {
        file_id: id,
        filename: format!("exam-{id}.pdf"),
        file_location: format!("uploads/exam-{id}.pdf"),
        uploader_id: 7,
        timestamp: None,
    }
}

pub fn make_router(catalog: Catalog) -> Router {
    router(AppState::new(catalog, cfg()))
}

pub fn make_logged_in_router(catalog: Catalog) -> Router {
    router(
        AppState::new(catalog, cfg())
            .with_profile(user())
            .with_files(vec![file(1), file(2)]),
    )
}

/// Runs one request and returns the status plus the decoded JSON body.
pub async fn call(app: &Router, method: &str, uri: &str) -> (u16, serde_json::Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn call_json(app: &Router, method: &str, uri: &str, body: serde_json::Value) -> (u16, serde_json::Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, req).await
}

async fn send(app: &Router, req: Request<Body>) -> (u16, serde_json::Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status().as_u16();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let v = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, v)
}
