//! Request and response shapes at the proxy boundary.
//!
//! The transport hands the dispatcher an already-parsed [`ProxyRequest`];
//! every operation answers with a [`ProxyResponse`] of `{data?, total?,
//! error?}` JSON, or a base64 binary payload for preview fetches.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::Error;

/// One inbound call, transport details already stripped.
#[derive(Debug, Clone, Default)]
pub struct ProxyRequest {
    /// HTTP method, any case
    pub method: String,
    /// Query string parameters
    pub query: HashMap<String, String>,
    /// Parsed JSON body, when one was sent
    pub body: Option<Value>,
    /// Raw `Authorization` header value
    pub authorization: Option<String>,
}

impl ProxyRequest {
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

/// Status plus body, handed back to the transport verbatim.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone)]
pub enum ResponseBody {
    Json(Value),
    /// Raw bytes for preview fetches, base64-encoded with a derived
    /// content type.
    Binary {
        content_type: String,
        base64: String,
    },
}

impl ProxyResponse {
    /// 200 with a `data` payload.
    pub fn ok(data: Value) -> Self {
        Self::with_status(200, json!({ "data": data }))
    }

    /// A listing page: `data` plus the pre-pagination `total`.
    pub fn list(items: Vec<Value>, total: usize) -> Self {
        Self::with_status(200, json!({ "data": items, "total": total }))
    }

    pub fn with_status(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            body: ResponseBody::Json(body),
        }
    }

    pub fn binary(content_type: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody::Binary {
                content_type: content_type.into(),
                base64: base64.into(),
            },
        }
    }

    /// Maps a classified failure to its response status and `{error}` body.
    pub fn from_error(error: &Error) -> Self {
        let message = match error {
            // Upstream failures carry the backend's message verbatim.
            Error::Upstream { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self::with_status(error.status_code(), json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_responses_carry_status_and_message() {
        let response = ProxyResponse::from_error(&Error::NotFound("content/posts/x".into()));
        assert_eq!(response.status_code, 404);
        let ResponseBody::Json(body) = response.body else {
            panic!("expected json body");
        };
        assert_eq!(body["error"], "Not found: content/posts/x");
    }

    #[test]
    fn upstream_errors_keep_the_backend_message_verbatim() {
        let response = ProxyResponse::from_error(&Error::upstream(502, "bad gateway"));
        assert_eq!(response.status_code, 502);
        let ResponseBody::Json(body) = response.body else {
            panic!("expected json body");
        };
        assert_eq!(body["error"], "bad gateway");
    }
}
