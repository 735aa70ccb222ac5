//! The per-file contract the remote backend is held to.
//!
//! The backend exposes nothing beyond these primitives: read one file, write
//! one file under a version token, delete one file under a version token,
//! list a directory. Listing order, pagination, batching and attachment
//! handling are all emulated on top of this trait by the proxy.

use async_trait::async_trait;

use crate::error::Result;

/// Opaque concurrency-control value tied to a file's current remote state.
///
/// Returned by reads, required as a precondition for update/delete. The
/// backend rejects a conditional write whose token no longer matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One remote file with its decoded content.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    /// Filename (last path segment)
    pub name: String,
    /// Full path relative to the repository root
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Version token for conditional writes
    pub version: VersionToken,
    /// Decoded file content
    pub content: Vec<u8>,
}

/// Entry kind reported by a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One directory listing entry (no content).
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub kind: EntryKind,
    pub version: VersionToken,
}

/// Result of a write: whether the file was created and its new token.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub created: bool,
    pub version: VersionToken,
}

/// Primitive per-file operations against the remote backend.
///
/// Implementations classify backend failures into the core taxonomy: an
/// absent path is `NotFound`, a rejected version token on a conditional
/// write/delete is `Conflict`, anything else is `Upstream` with the
/// backend's status and message carried verbatim.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read one file, content included.
    async fn read_file(&self, path: &str) -> Result<RemoteFile>;

    /// Read one file's raw bytes without JSON envelope decoding.
    async fn read_raw(&self, path: &str) -> Result<Vec<u8>>;

    /// List a directory. Unordered; order is emulated client-side.
    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Write one file. `version` must be the token of the current remote
    /// state for updates, and `None` for brand-new paths.
    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        version: Option<&VersionToken>,
    ) -> Result<WriteOutcome>;

    /// Delete one file under its current version token.
    async fn delete_file(&self, path: &str, message: &str, version: &VersionToken) -> Result<()>;
}
