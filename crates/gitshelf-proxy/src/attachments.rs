//! Attachment extraction and rehydration around document writes and reads.
//!
//! On the write path, every attachment node still carrying a base64
//! `payload` is uploaded to its own remote file and rewritten to a resolved
//! `src` pointer; committed documents never contain raw bytes. On the read
//! path, every node with a `src` gains a short-lived signed preview `url`.
//! A failed upload aborts the whole write; attachments already uploaded by
//! that write are not rolled back.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::debug;

use gitshelf_core::{
    encode, is_attachment, issue_preview_token, walk, AttachmentRef, ContentStore, Error,
    NodeTransform, Result,
};

/// Builds the signed preview URL for one remote path.
pub fn preview_url(base_url: &str, path: &str, secret: &[u8], ttl_secs: Option<i64>) -> String {
    let token = issue_preview_token(path, ttl_secs, secret);
    format!("{base_url}?handler=preview&path={path}&previewToken={token}")
}

struct Uploader<'a, S: ?Sized> {
    store: &'a S,
    content_root: &'a str,
    resource: &'a str,
    uploaded_at: DateTime<Utc>,
}

#[async_trait]
impl<S: ContentStore + ?Sized> NodeTransform for Uploader<'_, S> {
    async fn apply(&self, node: Value) -> Result<Value> {
        let mut attachment: AttachmentRef = serde_json::from_value(node)
            .map_err(|e| Error::Validation(format!("malformed attachment node: {e}")))?;

        let Some(payload) = attachment.payload.take() else {
            // Already resolved on an earlier write; nothing to upload.
            return back_to_value(attachment);
        };

        let bytes = BASE64
            .decode(payload)
            .map_err(|_| Error::Validation("attachment payload is not valid base64".into()))?;

        let source_name = attachment.path.as_deref().unwrap_or("attachment");
        let filename = encode(source_name, Some(self.uploaded_at));
        let target = format!(
            "{}/uploads/{}/{}",
            self.content_root, self.resource, filename
        );

        self.store
            .write_file(
                &target,
                &bytes,
                &format!("Uploaded attachment: {target}"),
                None,
            )
            .await?;
        debug!("Uploaded attachment {} ({} bytes)", target, bytes.len());

        attachment.id = Some(filename);
        attachment.src = Some(target);
        attachment.url = None;
        back_to_value(attachment)
    }
}

fn back_to_value(attachment: AttachmentRef) -> Result<Value> {
    serde_json::to_value(attachment)
        .map_err(|e| Error::Validation(format!("unserializable attachment node: {e}")))
}

struct Rehydrator<'a> {
    base_url: &'a str,
    secret: &'a [u8],
    preview_ttl: Option<i64>,
}

#[async_trait]
impl NodeTransform for Rehydrator<'_> {
    async fn apply(&self, mut node: Value) -> Result<Value> {
        let Some(src) = node.get("src").and_then(Value::as_str).map(str::to_string) else {
            return Ok(node);
        };
        node["url"] = json!(preview_url(
            self.base_url,
            &src,
            self.secret,
            self.preview_ttl
        ));
        Ok(node)
    }
}

/// Uploads every pending attachment in `data`, rewriting payload nodes to
/// resolved `src` pointers.
pub async fn extract<S: ContentStore + ?Sized>(
    store: &S,
    content_root: &str,
    resource: &str,
    data: &mut Value,
    uploaded_at: DateTime<Utc>,
) -> Result<()> {
    let uploader = Uploader {
        store,
        content_root,
        resource,
        uploaded_at,
    };
    walk(data, &is_attachment, &uploader).await
}

/// Attaches a signed preview `url` to every resolved attachment in `data`.
pub async fn rehydrate(
    data: &mut Value,
    base_url: &str,
    secret: &[u8],
    preview_ttl: Option<i64>,
) -> Result<()> {
    let rehydrator = Rehydrator {
        base_url,
        secret,
        preview_ttl,
    };
    walk(data, &is_attachment, &rehydrator).await
}
