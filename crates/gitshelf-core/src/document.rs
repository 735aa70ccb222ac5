//! The attachment node embedded in documents.
//!
//! Attachments are tagged nodes checked structurally by their `kind`
//! discriminant, never by shape-sniffing. Exactly one of `payload` (raw
//! bytes awaiting upload) or `src` (resolved pointer after upload) holds
//! content once a node has passed through a write or read cycle.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminant value marking an attachment node.
pub const ATTACHMENT_KIND: &str = "file";

/// Binary content embedded in a document, stored as a separate remote file.
///
/// Exactly one of `payload` and `src` holds content once the node has
/// passed through a write or read cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Always [`ATTACHMENT_KIND`]
    pub kind: String,
    /// Slugified stored filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Client-side filename the upload arrived under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Base64 raw bytes, present only before the upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Repository-relative pointer, present only after the upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Signed preview URL, attached on the read path only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Caller-supplied fields (captions, titles) ride along untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Structural check for attachment nodes: an object whose `kind` field is
/// the attachment discriminant.
pub fn is_attachment(value: &Value) -> bool {
    value
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|kind| kind == ATTACHMENT_KIND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_tagged_nodes_only() {
        assert!(is_attachment(&json!({"kind": "file", "payload": "aGk="})));
        assert!(!is_attachment(&json!({"kind": "image"})));
        assert!(!is_attachment(&json!({"rawFile": {}})));
        assert!(!is_attachment(&json!("file")));
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let node = AttachmentRef {
            kind: ATTACHMENT_KIND.to_string(),
            id: Some("logo.png".into()),
            path: None,
            payload: None,
            src: Some("uploads/posts/logo.png".into()),
            url: None,
            extra: serde_json::Map::new(),
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({"kind": "file", "id": "logo.png", "src": "uploads/posts/logo.png"})
        );
    }

    #[test]
    fn unknown_fields_ride_along_through_the_typed_node() {
        let node: AttachmentRef = serde_json::from_value(json!({
            "kind": "file",
            "payload": "aGk=",
            "caption": "the logo"
        }))
        .unwrap();
        assert_eq!(node.extra["caption"], "the logo");

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["caption"], "the logo");
    }
}
