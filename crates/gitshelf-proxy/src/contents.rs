//! The resource orchestrator: sequences codec, walker, guard and listing
//! per operation and talks to the opaque backend store.
//!
//! Stateless across calls - no in-process cache, no shared mutable state.
//! GetMany fans out one fetch per id and joins all-or-nothing. Nothing is
//! retried; callers retry idempotent reads and treat `Conflict` on writes
//! as terminal for the attempt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde_json::{json, Value};
use tracing::debug;

use gitshelf_core::{
    decode, encode, page as paginate, ContentStore, DirEntry, EntryKind, Error, ProxyRequest,
    ProxyResponse, Result, SortOrder,
};

use crate::{attachments, auth, guard};

/// How a resource's member files are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Members are JSON documents; bodies are parsed and attachments
    /// rehydrated.
    Json,
    /// Members are opaque files; only filename-derived metadata and a
    /// preview URL are returned.
    File,
}

/// Orchestrates one resource operation per inbound call.
pub struct ContentsService<S> {
    store: Arc<S>,
    content_root: String,
    base_url: String,
    secret: Vec<u8>,
    preview_ttl: Option<i64>,
}

impl<S: ContentStore> ContentsService<S> {
    pub fn new(
        store: Arc<S>,
        content_root: impl Into<String>,
        base_url: impl Into<String>,
        secret: impl Into<Vec<u8>>,
        preview_ttl: Option<i64>,
    ) -> Self {
        Self {
            store,
            content_root: content_root.into(),
            base_url: base_url.into(),
            secret: secret.into(),
            preview_ttl,
        }
    }

    /// Checks the bearer credential, then selects the operation from the
    /// method and query shape.
    pub async fn handle(&self, request: &ProxyRequest, handler: Handler) -> Result<ProxyResponse> {
        auth::authorize(request.authorization.as_deref(), &self.secret)?;

        let resource = request
            .query_param("resource")
            .map(str::to_string)
            .or_else(|| {
                request
                    .body
                    .as_ref()
                    .and_then(|body| body.get("resource"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .ok_or_else(|| Error::Validation("resource is required".into()))?;
        let resource = safe_segment(&resource)?;

        match request.method.to_uppercase().as_str() {
            "GET" => {
                if let Some(id) = request.query_param("id") {
                    self.get_one(resource, id, handler).await
                } else if let Some(ids) = request.query_param("ids") {
                    self.get_many(resource, ids, handler).await
                } else {
                    self.get_list(resource, request, handler).await
                }
            }
            "PUT" => {
                let data = request
                    .body
                    .as_ref()
                    .and_then(|body| body.get("data"))
                    .cloned()
                    .ok_or_else(|| Error::Validation("PUT body needs a data property".into()))?;
                if data.get("id").and_then(Value::as_str).is_some() {
                    self.update_at(resource, data, handler, Utc::now()).await
                } else {
                    self.create_at(resource, data, handler, Utc::now()).await
                }
            }
            "DELETE" => {
                let id = request
                    .query_param("id")
                    .ok_or_else(|| Error::Validation("id is required".into()))?;
                self.delete(resource, id, handler).await
            }
            other => Err(Error::BadRequest(format!(
                "HTTP method not recognized: {other}"
            ))),
        }
    }

    /// Lists a resource: directory fetch, decode, client-side sort and
    /// pagination. A missing directory is an empty resource, not a fault.
    pub async fn get_list(
        &self,
        resource: &str,
        request: &ProxyRequest,
        handler: Handler,
    ) -> Result<ProxyResponse> {
        let page = request
            .query_param("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(1);
        let per_page = request
            .query_param("perPage")
            .and_then(|p| p.parse().ok())
            .unwrap_or(10);
        let sort_field = request.query_param("sortField").unwrap_or("id");
        let sort_order = SortOrder::from(request.query_param("sortOrder").unwrap_or("ASC"));

        let dir = format!("{}/{}", self.content_root, resource);
        let entries = match self.store.list_dir(&dir).await {
            Ok(entries) => entries,
            Err(Error::NotFound(_)) => Vec::new(),
            Err(other) => return Err(other),
        };

        let items: Vec<Value> = entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::File)
            .filter(|entry| handler == Handler::File || entry.name.ends_with(".json"))
            .map(|entry| self.entry_payload(entry, handler))
            .collect();

        let result = paginate(items, sort_field, sort_order, page, per_page);
        debug!(
            "Listed {}/{}: {} of {} entries",
            self.content_root,
            resource,
            result.items.len(),
            result.total
        );
        Ok(ProxyResponse::list(result.items, result.total))
    }

    pub async fn get_one(
        &self,
        resource: &str,
        id: &str,
        handler: Handler,
    ) -> Result<ProxyResponse> {
        let payload = self.one_payload(resource, id, handler).await?;
        Ok(ProxyResponse::ok(payload))
    }

    /// Fans out one fetch per requested id. All-or-nothing: any single
    /// failure fails the whole call with no partial results.
    pub async fn get_many(
        &self,
        resource: &str,
        ids_param: &str,
        handler: Handler,
    ) -> Result<ProxyResponse> {
        let ids: Vec<String> = serde_json::from_str(ids_param)
            .map_err(|_| Error::Validation("ids must be a JSON array of strings".into()))?;

        let data = try_join_all(
            ids.iter()
                .map(|id| self.one_payload(resource, id, handler)),
        )
        .await?;
        Ok(ProxyResponse::ok(json!(data)))
    }

    /// Creates a document at a caller-supplied instant. The path is new, so
    /// no prior read is issued and no version token is sent.
    pub async fn create_at(
        &self,
        resource: &str,
        mut data: Value,
        handler: Handler,
        created_at: DateTime<Utc>,
    ) -> Result<ProxyResponse> {
        let name = data
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("create body needs a name property".into()))?;

        let mut filename = encode(name, Some(created_at));
        if handler == Handler::Json && !filename.contains('.') {
            filename.push_str(".json");
        }

        attachments::extract(
            self.store.as_ref(),
            &self.content_root,
            resource,
            &mut data,
            created_at,
        )
        .await?;

        if let Some(object) = data.as_object_mut() {
            object.insert("name".into(), json!(filename));
            // Identity lives in the filename, never in the body.
            object.remove("id");
        }

        let path = self.document_path(resource, &filename);
        let bytes = to_pretty_bytes(&data)?;
        guard::create_new(
            self.store.as_ref(),
            &path,
            &bytes,
            &format!("Created resource: {path}"),
        )
        .await?;
        debug!("Created {}", path);

        let payload = self.written_payload(&filename, &bytes, handler).await?;
        Ok(ProxyResponse::with_status(201, json!({ "data": payload })))
    }

    /// Updates an existing document behind the concurrency guard.
    pub async fn update_at(
        &self,
        resource: &str,
        mut data: Value,
        handler: Handler,
        updated_at: DateTime<Utc>,
    ) -> Result<ProxyResponse> {
        let id = data
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Validation("update body needs an id property".into()))?;
        let id = safe_segment(&id)?.to_string();

        attachments::extract(
            self.store.as_ref(),
            &self.content_root,
            resource,
            &mut data,
            updated_at,
        )
        .await?;

        if let Some(object) = data.as_object_mut() {
            object.remove("id");
        }

        let path = self.document_path(resource, &id);
        let bytes = to_pretty_bytes(&data)?;
        guard::guarded_write(
            self.store.as_ref(),
            &path,
            &format!("Updated resource: {resource}/{id}"),
            |_prior| Ok(bytes.clone()),
        )
        .await?;
        debug!("Updated {}", path);

        let payload = self.written_payload(&id, &bytes, handler).await?;
        Ok(ProxyResponse::ok(payload))
    }

    /// Deletes behind the concurrency guard; the last-known content is
    /// returned as the confirmation payload.
    pub async fn delete(
        &self,
        resource: &str,
        id: &str,
        handler: Handler,
    ) -> Result<ProxyResponse> {
        let id = safe_segment(id)?;
        let path = self.document_path(resource, id);
        let prior = guard::guarded_delete(
            self.store.as_ref(),
            &path,
            &format!("Delete resource: {resource}/{id}"),
        )
        .await?;
        debug!("Deleted {}", path);

        let payload = match handler {
            Handler::Json => self.document_payload(&prior.name, &prior.content).await?,
            Handler::File => self.metadata_payload(&prior.name, prior.size),
        };
        Ok(ProxyResponse::ok(payload))
    }

    async fn written_payload(&self, name: &str, content: &[u8], handler: Handler) -> Result<Value> {
        match handler {
            Handler::Json => self.document_payload(name, content).await,
            Handler::File => Ok(self.metadata_payload(name, content.len() as u64)),
        }
    }

    async fn one_payload(&self, resource: &str, id: &str, handler: Handler) -> Result<Value> {
        let id = safe_segment(id)?;
        let path = self.document_path(resource, id);
        let file = self.store.read_file(&path).await?;
        match handler {
            Handler::Json => self.document_payload(&file.name, &file.content).await,
            Handler::File => {
                let mut item = self.metadata_payload(&file.name, file.size);
                item["url"] = json!(attachments::preview_url(
                    &self.base_url,
                    &file.path,
                    &self.secret,
                    self.preview_ttl
                ));
                Ok(item)
            }
        }
    }

    /// Parses a stored document body and grafts on the filename-derived
    /// identity, then rehydrates attachment references.
    async fn document_payload(&self, name: &str, content: &[u8]) -> Result<Value> {
        let mut doc: Value = serde_json::from_slice(content)
            .map_err(|e| Error::upstream(500, format!("invalid document body in {name}: {e}")))?;
        if !doc.is_object() {
            return Err(Error::upstream(
                500,
                format!("document body in {name} is not a JSON object"),
            ));
        }

        let info = decode(name);
        doc["id"] = json!(name);
        if doc.get("createdAt").is_none() {
            if let Some(created_at) = info.created_at {
                doc["createdAt"] = json!(created_at);
            }
        }

        attachments::rehydrate(&mut doc, &self.base_url, &self.secret, self.preview_ttl).await?;
        Ok(doc)
    }

    fn metadata_payload(&self, name: &str, size: u64) -> Value {
        let info = decode(name);
        let mut item = json!({
            "id": name,
            "name": name,
            "slug": info.slug,
            "size": size,
        });
        if let Some(ext) = info.ext {
            item["ext"] = json!(ext);
        }
        if let Some(created_at) = info.created_at {
            item["createdAt"] = json!(created_at);
        }
        item
    }

    fn entry_payload(&self, entry: &DirEntry, handler: Handler) -> Value {
        let mut item = self.metadata_payload(&entry.name, entry.size);
        if handler == Handler::File {
            item["url"] = json!(attachments::preview_url(
                &self.base_url,
                &entry.path,
                &self.secret,
                self.preview_ttl
            ));
        }
        item
    }

    fn document_path(&self, resource: &str, id: &str) -> String {
        format!("{}/{}/{}", self.content_root, resource, id)
    }
}

/// Resources and ids become path segments; keep separators and parent
/// references out of them.
fn safe_segment(value: &str) -> Result<&str> {
    if value.is_empty() || value.contains(['/', '\\']) || value.contains("..") {
        return Err(Error::Validation(format!("invalid path segment: {value}")));
    }
    Ok(value)
}

fn to_pretty_bytes(data: &Value) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(data)
        .map_err(|e| Error::Validation(format!("unserializable document body: {e}")))
}
