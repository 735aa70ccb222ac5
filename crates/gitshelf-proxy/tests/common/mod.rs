//! In-memory `ContentStore` double mirroring the backend's conditional
//! write semantics: version tokens advance on every write, and a stale or
//! absent token is rejected as a conflict.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use gitshelf_core::{
    ContentStore, DirEntry, EntryKind, Error, RemoteFile, ResponseBody, Result, VersionToken,
    WriteOutcome,
};

#[derive(Debug, Clone)]
struct StoredFile {
    content: Vec<u8>,
    version: String,
}

#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, StoredFile>>,
    counter: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a file directly, bypassing version checks.
    pub fn seed(&self, path: &str, content: &[u8]) {
        let version = self.next_version();
        self.files.lock().unwrap().insert(
            path.to_string(),
            StoredFile {
                content: content.to_vec(),
                version,
            },
        );
    }

    #[allow(dead_code)]
    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    #[allow(dead_code)]
    pub fn content_of(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|file| file.content.clone())
    }

    fn next_version(&self) -> String {
        format!("v{}", self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

fn basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn read_file(&self, path: &str) -> Result<RemoteFile> {
        let files = self.files.lock().unwrap();
        let file = files
            .get(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        Ok(RemoteFile {
            name: basename(path),
            path: path.to_string(),
            size: file.content.len() as u64,
            version: VersionToken::new(file.version.clone()),
            content: file.content.clone(),
        })
    }

    async fn read_raw(&self, path: &str) -> Result<Vec<u8>> {
        self.read_file(path).await.map(|file| file.content)
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let prefix = format!("{path}/");
        let files = self.files.lock().unwrap();

        let mut entries = Vec::new();
        let mut subdirs = BTreeSet::new();
        for (stored_path, file) in files.iter() {
            let Some(rest) = stored_path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                None => entries.push(DirEntry {
                    name: rest.to_string(),
                    path: stored_path.clone(),
                    size: file.content.len() as u64,
                    kind: EntryKind::File,
                    version: VersionToken::new(file.version.clone()),
                }),
                Some((subdir, _)) => {
                    subdirs.insert(subdir.to_string());
                }
            }
        }
        for subdir in subdirs {
            entries.push(DirEntry {
                name: subdir.clone(),
                path: format!("{path}/{subdir}"),
                size: 0,
                kind: EntryKind::Dir,
                version: VersionToken::new(""),
            });
        }

        if entries.is_empty() {
            return Err(Error::NotFound(path.to_string()));
        }
        Ok(entries)
    }

    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        _message: &str,
        version: Option<&VersionToken>,
    ) -> Result<WriteOutcome> {
        let next = self.next_version();
        let mut files = self.files.lock().unwrap();
        let existing = files.get(path);

        match (existing, version) {
            (None, None) => {
                files.insert(
                    path.to_string(),
                    StoredFile {
                        content: content.to_vec(),
                        version: next.clone(),
                    },
                );
                Ok(WriteOutcome {
                    created: true,
                    version: VersionToken::new(next),
                })
            }
            (None, Some(_)) => Err(Error::Conflict(format!(
                "version token supplied for missing file {path}"
            ))),
            (Some(_), None) => Err(Error::Conflict(format!(
                "no version token supplied for existing file {path}"
            ))),
            (Some(file), Some(token)) => {
                if file.version != token.as_str() {
                    return Err(Error::Conflict(format!("{path} does not match {token}")));
                }
                files.insert(
                    path.to_string(),
                    StoredFile {
                        content: content.to_vec(),
                        version: next.clone(),
                    },
                );
                Ok(WriteOutcome {
                    created: false,
                    version: VersionToken::new(next),
                })
            }
        }
    }

    async fn delete_file(&self, path: &str, _message: &str, version: &VersionToken) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        let file = files
            .get(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        if file.version != version.as_str() {
            return Err(Error::Conflict(format!("{path} does not match {version}")));
        }
        files.remove(path);
        Ok(())
    }
}

/// Unwraps a JSON response body.
pub fn json_body(body: &ResponseBody) -> &serde_json::Value {
    match body {
        ResponseBody::Json(value) => value,
        ResponseBody::Binary { .. } => panic!("expected a JSON body"),
    }
}
