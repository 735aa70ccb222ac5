//! GitHub contents API backend for gitshelf.
//!
//! Implements the `ContentStore` contract over `/repos/{repo}/contents/*`:
//! per-file reads and conditional writes/deletes keyed on the blob SHA,
//! which serves as the version token. The API has no sorting, pagination,
//! batching or attachment handling; all of that is emulated by the proxy.

mod client;

pub use client::GithubContents;
