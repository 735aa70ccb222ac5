//! Bearer credential check in front of every resource operation.

use gitshelf_core::{verify_credential, Error, Result};

/// Validates the `Authorization` header and returns the credential subject.
///
/// A missing header, a non-Bearer scheme, a bad signature and a credential
/// without a subject all fail with the same `Unauthorized` classification,
/// so a caller learns nothing about which check failed.
pub fn authorize(header: Option<&str>, secret: &[u8]) -> Result<String> {
    let header = header.ok_or(Error::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(Error::Unauthorized)?;
    verify_credential(token, secret)
}
