//! Dispatch-level tests: handler routing, login and preview flows.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use argon2::{Argon2, PasswordHasher};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use password_hash::SaltString;
use serde_json::{json, Value};

use common::{json_body, MemoryStore};
use gitshelf_core::{
    issue_credential, issue_preview_token, verify_credential, ProxyRequest, ResponseBody,
};
use gitshelf_proxy::contents::ContentsService;
use gitshelf_proxy::proxy::ProxyService;

const SECRET: &[u8] = b"dispatch-secret";

fn proxy(store: Arc<MemoryStore>) -> ProxyService<MemoryStore> {
    let contents = ContentsService::new(
        store.clone(),
        "content",
        "http://proxy.local/",
        SECRET.to_vec(),
        Some(900),
    );
    ProxyService::new(store, contents, "content/users", SECRET.to_vec())
}

fn get(params: &[(&str, &str)]) -> ProxyRequest {
    ProxyRequest {
        method: "GET".to_string(),
        query: params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: None,
        authorization: None,
    }
}

fn post(body: Value) -> ProxyRequest {
    ProxyRequest {
        method: "POST".to_string(),
        query: HashMap::new(),
        body: Some(body),
        authorization: None,
    }
}

fn password_hash(password: &str) -> String {
    let salt = SaltString::encode_b64(b"dispatch-salt-16").unwrap();
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn bare_get_answers_with_the_version_banner() {
    let proxy = proxy(Arc::new(MemoryStore::new()));

    let response = proxy.dispatch(get(&[])).await;

    assert_eq!(response.status_code, 200);
    let body = json_body(&response.body);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_handler_is_a_bad_request() {
    let proxy = proxy(Arc::new(MemoryStore::new()));

    let response = proxy.dispatch(get(&[("handler", "releases")])).await;

    assert_eq!(response.status_code, 400);
    assert!(json_body(&response.body)["error"].as_str().is_some());
}

#[tokio::test]
async fn login_issues_a_verifiable_credential_and_strips_the_hash() {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        "content/users/admin@example.com.json",
        &serde_json::to_vec_pretty(&json!({
            "id": "admin@example.com",
            "fullName": "Admin",
            "hash": password_hash("hunter2"),
        }))
        .unwrap(),
    );
    let proxy = proxy(store);

    let response = proxy
        .dispatch(post(json!({
            "handler": "auth",
            "username": "admin@example.com",
            "password": "hunter2",
        })))
        .await;

    assert_eq!(response.status_code, 200);
    let body = json_body(&response.body);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["fullName"], "Admin");
    assert!(body.get("hash").is_none());

    let token = body["token"].as_str().unwrap();
    assert_eq!(verify_credential(token, SECRET).unwrap(), "admin@example.com");
}

#[tokio::test]
async fn login_with_a_wrong_password_is_unauthorized() {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        "content/users/admin@example.com.json",
        &serde_json::to_vec_pretty(&json!({
            "id": "admin@example.com",
            "hash": password_hash("hunter2"),
        }))
        .unwrap(),
    );
    let proxy = proxy(store);

    let response = proxy
        .dispatch(post(json!({
            "handler": "auth",
            "username": "admin@example.com",
            "password": "wrong",
        })))
        .await;

    assert_eq!(response.status_code, 401);
}

#[tokio::test]
async fn missing_user_and_wrong_password_are_indistinguishable() {
    let proxy = proxy(Arc::new(MemoryStore::new()));

    let response = proxy
        .dispatch(post(json!({
            "handler": "auth",
            "username": "ghost@example.com",
            "password": "anything",
        })))
        .await;

    assert_eq!(response.status_code, 401);
    assert_eq!(json_body(&response.body)["error"], "Unauthorized");
}

#[tokio::test]
async fn preview_serves_raw_bytes_for_a_valid_token() {
    let store = Arc::new(MemoryStore::new());
    store.seed("content/uploads/posts/logo.png", b"png-bytes");
    let proxy = proxy(store);

    let token = issue_preview_token("content/uploads/posts/logo.png", Some(900), SECRET);
    let response = proxy
        .dispatch(get(&[
            ("handler", "preview"),
            ("path", "content/uploads/posts/logo.png"),
            ("previewToken", token.as_str()),
        ]))
        .await;

    assert_eq!(response.status_code, 200);
    match &response.body {
        ResponseBody::Binary {
            content_type,
            base64,
        } => {
            assert_eq!(content_type, "image/png");
            assert_eq!(BASE64.decode(base64).unwrap(), b"png-bytes");
        }
        ResponseBody::Json(_) => panic!("expected a binary body"),
    }
}

#[tokio::test]
async fn preview_token_for_another_path_is_denied() {
    let store = Arc::new(MemoryStore::new());
    store.seed("content/uploads/posts/logo.png", b"png-bytes");
    let proxy = proxy(store);

    let token = issue_preview_token("content/uploads/posts/other.png", Some(900), SECRET);
    let response = proxy
        .dispatch(get(&[
            ("handler", "preview"),
            ("path", "content/uploads/posts/logo.png"),
            ("previewToken", token.as_str()),
        ]))
        .await;

    assert_eq!(response.status_code, 401);
}

#[tokio::test]
async fn resource_reads_flow_through_dispatch_with_a_credential() {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        "content/posts/a.json",
        &serde_json::to_vec_pretty(&json!({"title": "a"})).unwrap(),
    );
    let proxy = proxy(store);

    let mut request = get(&[("handler", "json"), ("resource", "posts"), ("id", "a.json")]);
    request.authorization = Some(format!("Bearer {}", issue_credential("editor", SECRET)));
    let response = proxy.dispatch(request).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(json_body(&response.body)["data"]["id"], "a.json");

    let anonymous = get(&[("handler", "json"), ("resource", "posts"), ("id", "a.json")]);
    let response = proxy.dispatch(anonymous).await;
    assert_eq!(response.status_code, 401);
}
