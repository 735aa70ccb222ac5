//! Single dispatch entrypoint for every inbound call.
//!
//! Routes on the `handler` parameter (query first, body as fallback) and
//! the HTTP method. Every failure is classified and mapped to a response
//! here; callers always get a `ProxyResponse` back.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use gitshelf_core::{ContentStore, Error, ProxyRequest, ProxyResponse, Result};

use crate::contents::{ContentsService, Handler};
use crate::{login, preview};

/// Everything one deployment of the proxy needs to answer requests.
pub struct ProxyService<S> {
    store: Arc<S>,
    contents: ContentsService<S>,
    users_dir: String,
    secret: Vec<u8>,
}

impl<S: ContentStore> ProxyService<S> {
    pub fn new(
        store: Arc<S>,
        contents: ContentsService<S>,
        users_dir: impl Into<String>,
        secret: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            store,
            contents,
            users_dir: users_dir.into(),
            secret: secret.into(),
        }
    }

    /// Handles one request, mapping every classified failure to its
    /// response status. Never panics, never retries.
    pub async fn dispatch(&self, request: ProxyRequest) -> ProxyResponse {
        match self.route(&request).await {
            Ok(response) => response,
            Err(error) => {
                debug!("Request failed: {}", error);
                ProxyResponse::from_error(&error)
            }
        }
    }

    async fn route(&self, request: &ProxyRequest) -> Result<ProxyResponse> {
        let handler = request
            .query_param("handler")
            .map(str::to_string)
            .or_else(|| {
                request
                    .body
                    .as_ref()
                    .and_then(|body| body.get("handler"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });

        match handler.as_deref() {
            Some("auth") => {
                login::authenticate(
                    self.store.as_ref(),
                    &self.users_dir,
                    &self.secret,
                    request.body.as_ref(),
                )
                .await
            }
            Some("json") => self.contents.handle(request, Handler::Json).await,
            Some("file") => self.contents.handle(request, Handler::File).await,
            Some("preview") => {
                preview::handle(
                    self.store.as_ref(),
                    request.query_param("path"),
                    request.query_param("previewToken"),
                    &self.secret,
                )
                .await
            }
            None if request.method.eq_ignore_ascii_case("GET") && request.query.is_empty() => {
                Ok(ProxyResponse::with_status(
                    200,
                    json!({
                        "message": "This is the default response by the proxy",
                        "version": env!("CARGO_PKG_VERSION"),
                    }),
                ))
            }
            other => Err(Error::BadRequest(format!(
                "Wrong handler set in HTTP request: {}",
                other.unwrap_or("none")
            ))),
        }
    }
}
