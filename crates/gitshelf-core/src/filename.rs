//! Filename encoding/decoding of document identity.
//!
//! A document's identity (creation time, human slug, extension) lives in its
//! remote filename and nowhere else: `2024-01-02-03-04-05-hello-world.json`.
//! `decode` is the exact left-inverse of `encode` for any slug that does not
//! itself start with a digit-year-shaped prefix (see the ambiguity test).

use chrono::{DateTime, Utc};

/// Characters removed by `slugify`.
const STRIPPED: &[char] = &[
    '*', '+', '~', '[', ']', '{', '}', '(', ')', '¿', '?', '\'', '"', '¡', '!', ':', '@',
];

/// Identity decoded from a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// The filename itself
    pub name: String,
    /// Human slug (stem without the timestamp prefix)
    pub slug: String,
    /// Extension after the last `.`, if any
    pub ext: Option<String>,
    /// ISO-8601 creation time, when the stem carries a timestamp prefix
    pub created_at: Option<String>,
}

/// Lowercases, trims, strips special characters and collapses whitespace
/// runs into single hyphens.
pub fn slugify(source: &str) -> String {
    let mut slug = String::with_capacity(source.len());
    let mut pending_gap = false;
    for ch in source.trim().to_lowercase().chars() {
        if STRIPPED.contains(&ch) {
            continue;
        }
        if ch.is_whitespace() {
            pending_gap = true;
            continue;
        }
        if pending_gap && !slug.is_empty() {
            slug.push('-');
        }
        pending_gap = false;
        slug.push(ch);
    }
    slug
}

/// Encodes a slug source into a filename, prefixing a zero-padded UTC
/// `YYYY-MM-DD-HH-MM-SS-` stamp when a timestamp is given.
pub fn encode(source: &str, timestamp: Option<DateTime<Utc>>) -> String {
    let slug = slugify(source);
    match timestamp {
        Some(at) => format!("{}-{}", at.format("%Y-%m-%d-%H-%M-%S"), slug),
        None => slug,
    }
}

/// Decodes a filename back into slug, extension and creation time.
///
/// The stem is treated as timestamped when it tokenizes into at least seven
/// hyphen-separated segments whose first is a 4-digit token starting `20`.
/// The first six segments are then reassembled into an ISO-8601 timestamp
/// and the rest form the slug.
pub fn decode(filename: &str) -> FileInfo {
    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext.to_string())),
        None => (filename, None),
    };

    let segments: Vec<&str> = stem.split('-').collect();
    let mut info = FileInfo {
        name: filename.to_string(),
        slug: stem.to_string(),
        ext,
        created_at: None,
    };

    if segments.len() >= 7 && segments[0].len() == 4 && segments[0].starts_with("20") {
        info.created_at = Some(format!(
            "{}-{}-{}T{}:{}:{}Z",
            segments[0], segments[1], segments[2], segments[3], segments[4], segments[5]
        ));
        info.slug = segments[6..].join("-");
    }

    info
}
