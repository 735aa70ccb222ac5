//! Core types and logic for gitshelf.
//!
//! This crate defines everything shared between the backend client and the
//! proxy service, with no I/O of its own:
//! - `ContentStore`: the per-file contract the remote backend is held to
//! - `Error`: the failure taxonomy every component classifies into
//! - filename encoding/decoding of document identity
//! - client-side list sorting and pagination
//! - the recursive attachment walker over JSON documents
//! - HMAC-signed credential and preview tokens

mod api;
mod document;
mod error;
mod filename;
mod listing;
mod store;
mod token;
mod walker;

pub use api::{ProxyRequest, ProxyResponse, ResponseBody};
pub use document::{is_attachment, AttachmentRef, ATTACHMENT_KIND};
pub use error::{Error, Result};
pub use filename::{decode, encode, slugify, FileInfo};
pub use listing::{page, Page, SortOrder};
pub use store::{ContentStore, DirEntry, EntryKind, RemoteFile, VersionToken, WriteOutcome};
pub use token::{
    issue_credential, issue_preview_token, verify_credential, verify_preview_token, Claims,
};
pub use walker::{walk, NodeTransform};
