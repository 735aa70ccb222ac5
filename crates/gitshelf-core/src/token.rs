//! Compact HMAC-SHA256 signed tokens.
//!
//! Two kinds of capability ride on the same codec: credentials (subject
//! claim, issued at login, checked by the auth gate) and preview tokens
//! (path claim plus expiry, scoping raw-byte access to exactly one remote
//! path). Tokens are `base64url(claims).base64url(mac)` with no server-side
//! state; validity is solely "signature verifies and is well-formed".

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by a signed token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier (credentials)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Remote path this token grants access to (preview tokens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Expiry as a unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Signs the claims into a compact two-segment token.
pub fn sign(claims: &Claims, secret: &[u8]) -> String {
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap_or_default());
    let mac = signature(payload.as_bytes(), secret);
    format!("{payload}.{mac}")
}

/// Verifies the signature and expiry, returning the claims.
///
/// Malformed tokens, bad signatures and expired tokens all collapse into
/// `Unauthorized` so callers leak nothing about the cause.
pub fn decode(token: &str, secret: &[u8]) -> Result<Claims> {
    let (payload, mac) = token.split_once('.').ok_or(Error::Unauthorized)?;

    let mut verifier =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    verifier.update(payload.as_bytes());
    let given = URL_SAFE_NO_PAD
        .decode(mac)
        .map_err(|_| Error::Unauthorized)?;
    verifier.verify_slice(&given).map_err(|_| Error::Unauthorized)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| Error::Unauthorized)?;
    let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| Error::Unauthorized)?;

    if let Some(exp) = claims.exp {
        if exp < Utc::now().timestamp() {
            return Err(Error::Unauthorized);
        }
    }

    Ok(claims)
}

/// Issues a credential carrying the given subject.
pub fn issue_credential(subject: &str, secret: &[u8]) -> String {
    sign(
        &Claims {
            sub: Some(subject.to_string()),
            ..Claims::default()
        },
        secret,
    )
}

/// Verifies a credential and returns its subject.
pub fn verify_credential(token: &str, secret: &[u8]) -> Result<String> {
    decode(token, secret)?.sub.ok_or(Error::Unauthorized)
}

/// Issues a short-lived token scoping access to exactly one remote path.
pub fn issue_preview_token(path: &str, ttl_secs: Option<i64>, secret: &[u8]) -> String {
    sign(
        &Claims {
            path: Some(path.to_string()),
            exp: ttl_secs.map(|ttl| Utc::now().timestamp() + ttl),
            ..Claims::default()
        },
        secret,
    )
}

/// Checks a preview token against the requested path. Any mismatch (bad
/// signature, different path, malformed or expired token) is a denial.
pub fn verify_preview_token(token: &str, requested_path: &str, secret: &[u8]) -> bool {
    match decode(token, secret) {
        Ok(claims) => claims.path.as_deref() == Some(requested_path),
        Err(_) => false,
    }
}

fn signature(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(payload);
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"shelf-secret";

    #[test]
    fn credential_roundtrip() {
        let token = issue_credential("editor@example.com", SECRET);
        assert_eq!(
            verify_credential(&token, SECRET).unwrap(),
            "editor@example.com"
        );
    }

    #[test]
    fn preview_token_is_bound_to_its_path() {
        let token = issue_preview_token("content/posts/a.png", Some(900), SECRET);
        assert!(verify_preview_token(&token, "content/posts/a.png", SECRET));
        assert!(!verify_preview_token(&token, "content/posts/b.png", SECRET));
    }

    #[test]
    fn wrong_secret_is_denied() {
        let token = issue_credential("editor", SECRET);
        assert!(verify_credential(&token, b"other-secret").is_err());
    }

    #[test]
    fn tampered_payload_is_denied() {
        let token = issue_credential("editor", SECRET);
        let forged = format!("e30{}", &token[3..]);
        assert!(verify_credential(&forged, SECRET).is_err());
    }

    #[test]
    fn expired_token_is_denied() {
        let stale = sign(
            &Claims {
                path: Some("content/x".into()),
                exp: Some(Utc::now().timestamp() - 60),
                ..Claims::default()
            },
            SECRET,
        );
        assert!(!verify_preview_token(&stale, "content/x", SECRET));
    }

    #[test]
    fn malformed_tokens_are_denied_not_crashed() {
        for junk in ["", "no-dot", "a.b.c", "!!!.???"] {
            assert!(decode(junk, SECRET).is_err());
        }
    }

    #[test]
    fn credential_without_subject_is_denied() {
        let token = sign(&Claims::default(), SECRET);
        assert!(verify_credential(&token, SECRET).is_err());
    }
}
