//! Password login issuing signed credentials.
//!
//! Users are themselves documents: `<users_dir>/<username>.json` with an
//! Argon2 `hash` field, created by the `gitshelf-hash` CLI. A missing user
//! file, a malformed record and a wrong password all collapse into the same
//! `Unauthorized`.

use argon2::{Argon2, PasswordVerifier};
use password_hash::PasswordHash;
use serde_json::{json, Value};
use tracing::debug;

use gitshelf_core::{issue_credential, ContentStore, Error, ProxyResponse, Result};

pub async fn authenticate<S: ContentStore + ?Sized>(
    store: &S,
    users_dir: &str,
    secret: &[u8],
    body: Option<&Value>,
) -> Result<ProxyResponse> {
    let body = body.ok_or_else(|| Error::Validation("username and password are required".into()))?;
    let username = required_field(body, "username")?;
    let password = required_field(body, "password")?;

    // Usernames become filenames; keep path metacharacters out.
    if username.contains(['/', '\\']) || username.contains("..") {
        return Err(Error::Unauthorized);
    }

    let path = format!("{users_dir}/{username}.json");
    let file = store.read_file(&path).await.map_err(|_| Error::Unauthorized)?;
    let record: Value = serde_json::from_slice(&file.content).map_err(|_| Error::Unauthorized)?;

    let hash = record
        .get("hash")
        .and_then(Value::as_str)
        .ok_or(Error::Unauthorized)?;
    if !verify_password(hash, password) {
        return Err(Error::Unauthorized);
    }

    let subject = record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or(username);
    let token = issue_credential(subject, secret);
    debug!("Issued credential for {}", subject);

    // The profile travels to the client; the stored hash does not.
    let mut profile = record;
    if let Some(object) = profile.as_object_mut() {
        object.remove("hash");
        object.insert("authenticated".into(), json!(true));
        object.insert("token".into(), json!(token));
    }
    Ok(ProxyResponse::with_status(200, profile))
}

fn required_field<'a>(body: &'a Value, field: &str) -> Result<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::Validation("username and password are required".into()))
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    } else {
        false
    }
}
