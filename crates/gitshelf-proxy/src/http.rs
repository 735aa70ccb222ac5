//! HTTP handlers for the proxy transport.
//!
//! The transport only marshals: headers, query and body are folded into a
//! `ProxyRequest`, and the dispatcher's `ProxyResponse` is lifted back into
//! an HTTP response (binary preview payloads are decoded to raw bytes).

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use gitshelf_core::{ContentStore, ProxyRequest, ProxyResponse, ResponseBody};

use crate::proxy::ProxyService;

/// Application state shared across handlers.
pub struct AppState<S> {
    pub proxy: Arc<ProxyService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
        }
    }
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
}

/// GET /health - Health check endpoint.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Any method on / - the proxy dispatch entrypoint.
pub async fn proxy_handler<S: ContentStore + 'static>(
    State(state): State<AppState<S>>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = ProxyRequest {
        method: method.to_string(),
        query,
        body: parse_body(&body),
        authorization: bearer_header(&headers),
    };
    lift(state.proxy.dispatch(request).await)
}

/// POST /authenticate - login route for clients that do not speak the
/// handler parameter.
pub async fn authenticate_handler<S: ContentStore + 'static>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Response {
    let mut query = HashMap::new();
    query.insert("handler".to_string(), "auth".to_string());
    let request = ProxyRequest {
        method: "POST".to_string(),
        query,
        body: parse_body(&body),
        authorization: None,
    };
    lift(state.proxy.dispatch(request).await)
}

fn parse_body(body: &Bytes) -> Option<serde_json::Value> {
    if body.is_empty() {
        None
    } else {
        serde_json::from_slice(body).ok()
    }
}

fn bearer_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn lift(response: ProxyResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.body {
        ResponseBody::Json(value) => (status, Json(value)).into_response(),
        ResponseBody::Binary {
            content_type,
            base64,
        } => match BASE64.decode(base64) {
            Ok(bytes) => (status, [(header::CONTENT_TYPE, content_type)], bytes).into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        },
    }
}
