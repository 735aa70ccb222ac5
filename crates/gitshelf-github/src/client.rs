//! GitHub contents API client wrapper.
//!
//! Token is held per-client; the blob SHA returned on reads is the version
//! token for conditional writes and deletes. Files potentially bigger than
//! 1 MB must be requested in raw mode, so preview bytes go through
//! `read_raw` with the raw media type instead of the JSON envelope.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use gitshelf_core::{
    ContentStore, DirEntry, EntryKind, Error, RemoteFile, Result, VersionToken, WriteOutcome,
};

const GITHUB_API: &str = "https://api.github.com";
const MEDIA_TYPE_JSON: &str = "application/vnd.github+json";
const MEDIA_TYPE_RAW: &str = "application/vnd.github.raw";
const USER_AGENT: &str = concat!("gitshelf/", env!("CARGO_PKG_VERSION"));

/// One entry of the contents API envelope, file or directory.
#[derive(Debug, Clone, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    sha: String,
    #[serde(default)]
    size: u64,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WriteEnvelope {
    content: WrittenContent,
}

#[derive(Debug, Deserialize)]
struct WrittenContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// GitHub contents API client.
pub struct GithubContents {
    http: Client,
    api_base: String,
    repo: String,
    token: String,
}

impl GithubContents {
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_api_base(GITHUB_API, repo, token)
    }

    /// Client against a non-default API base (tests, GitHub Enterprise).
    pub fn with_api_base(
        api_base: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            repo: repo.into(),
            token: token.into(),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/repos/{}/contents/{}", self.api_base, self.repo, path)
    }

    /// Reads the error body and classifies the failure.
    async fn failure(&self, path: &str, response: reqwest::Response, conditional: bool) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);

        match status.as_u16() {
            404 => Error::NotFound(path.to_string()),
            // The contents API rejects a stale token with 409 and an absent
            // token against an existing file with 422.
            409 | 422 if conditional => Error::Conflict(message),
            code => Error::upstream(code, message),
        }
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    Error::upstream(502, err.to_string())
}

/// The API wraps content in base64 with embedded newlines.
fn decode_content(content: &str) -> Result<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact)
        .map_err(|e| Error::upstream(502, format!("undecodable content payload: {e}")))
}

#[async_trait]
impl ContentStore for GithubContents {
    #[instrument(skip(self), level = "debug")]
    async fn read_file(&self, path: &str) -> Result<RemoteFile> {
        let response = self
            .http
            .get(self.contents_url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, MEDIA_TYPE_JSON)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(self.failure(path, response, false).await);
        }

        let entry: ContentEntry = response.json().await.map_err(transport_error)?;
        let content = decode_content(entry.content.as_deref().unwrap_or_default())?;
        debug!("Read {} bytes from {}", content.len(), path);

        Ok(RemoteFile {
            name: entry.name,
            path: entry.path,
            size: entry.size,
            version: VersionToken::new(entry.sha),
            content,
        })
    }

    #[instrument(skip(self), level = "debug")]
    async fn read_raw(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.contents_url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, MEDIA_TYPE_RAW)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(self.failure(path, response, false).await);
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        debug!("Read {} raw bytes from {}", bytes.len(), path);
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self), level = "debug")]
    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let response = self
            .http
            .get(self.contents_url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, MEDIA_TYPE_JSON)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(self.failure(path, response, false).await);
        }

        let entries: Vec<ContentEntry> = response.json().await.map_err(transport_error)?;
        debug!("Listed {} entries under {}", entries.len(), path);

        Ok(entries
            .into_iter()
            .map(|e| DirEntry {
                name: e.name,
                path: e.path,
                size: e.size,
                kind: if e.kind == "dir" {
                    EntryKind::Dir
                } else {
                    EntryKind::File
                },
                version: VersionToken::new(e.sha),
            })
            .collect())
    }

    #[instrument(skip(self, content), level = "debug", fields(content_len = content.len()))]
    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        version: Option<&VersionToken>,
    ) -> Result<WriteOutcome> {
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
        });
        if let Some(version) = version {
            body["sha"] = json!(version.as_str());
        }

        let response = self
            .http
            .put(self.contents_url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, MEDIA_TYPE_JSON)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        // 201 is a create, 200 an update; anything else is the backend's
        // problem to explain.
        let status = response.status();
        match status.as_u16() {
            200 | 201 => {
                let envelope: WriteEnvelope = response.json().await.map_err(transport_error)?;
                debug!("Wrote {} ({} bytes)", path, content.len());
                Ok(WriteOutcome {
                    created: status == StatusCode::CREATED,
                    version: VersionToken::new(envelope.content.sha),
                })
            }
            _ => Err(self.failure(path, response, true).await),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_file(&self, path: &str, message: &str, version: &VersionToken) -> Result<()> {
        let response = self
            .http
            .delete(self.contents_url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, MEDIA_TYPE_JSON)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&json!({
                "message": message,
                "sha": version.as_str(),
            }))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() != StatusCode::OK {
            return Err(self.failure(path, response, true).await);
        }

        debug!("Deleted {}", path);
        Ok(())
    }
}
