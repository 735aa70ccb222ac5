//! Resource CRUD proxy for gitshelf.
//!
//! Bridges a resource-oriented client (list/get/create/update/delete over
//! named resources) to a backend that only exposes primitive per-file
//! operations. One dispatch entrypoint routes on the `handler` parameter:
//! - `json`/`file` - resource CRUD through the orchestrator
//! - `auth` - password login issuing signed credentials
//! - `preview` - token-gated raw-byte fetch of a single path

pub mod attachments;
pub mod auth;
pub mod config;
pub mod contents;
pub mod guard;
pub mod http;
pub mod login;
pub mod preview;
pub mod proxy;
