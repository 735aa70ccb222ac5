//! Preview-token-gated fetch of one remote path's raw bytes.
//!
//! The holder of a preview token needs no bearer credential: the token
//! itself is the capability, scoped to exactly one path and verified
//! against the same signing secret before the backend is touched.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;

use gitshelf_core::{verify_preview_token, ContentStore, Error, ProxyResponse, Result};

pub async fn handle<S: ContentStore + ?Sized>(
    store: &S,
    path: Option<&str>,
    preview_token: Option<&str>,
    secret: &[u8],
) -> Result<ProxyResponse> {
    let (Some(path), Some(token)) = (path, preview_token) else {
        return Err(Error::Validation(
            "preview requires path and previewToken".into(),
        ));
    };

    if !verify_preview_token(token, path, secret) {
        return Err(Error::Unauthorized);
    }

    let bytes = store.read_raw(path).await?;
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();
    debug!("Previewed {} ({} bytes, {})", path, bytes.len(), content_type);

    Ok(ProxyResponse::binary(content_type, BASE64.encode(bytes)))
}
