//! Optimistic concurrency over the two-round-trip write cycle.
//!
//! Update and delete are check-then-act: the read that retrieves the version
//! token and the conditional write are separate round trips, leaving a race
//! window in which another writer can intervene. The window is not
//! eliminated, only detected - the later conditional write is rejected as a
//! conflict by the backend and classified as `Error::Conflict` by the store.

use gitshelf_core::{ContentStore, RemoteFile, Result, WriteOutcome};

/// Read-token-then-conditional-write on one remote file. `mutate` receives
/// the prior state and produces the new byte content.
pub async fn guarded_write<S, F>(
    store: &S,
    path: &str,
    message: &str,
    mutate: F,
) -> Result<(RemoteFile, WriteOutcome)>
where
    S: ContentStore + ?Sized,
    F: FnOnce(&RemoteFile) -> Result<Vec<u8>>,
{
    let prior = store.read_file(path).await?;
    let content = mutate(&prior)?;
    let outcome = store
        .write_file(path, &content, message, Some(&prior.version))
        .await?;
    Ok((prior, outcome))
}

/// Read-token-then-conditional-delete. Returns the prior state as the
/// caller's confirmation payload.
pub async fn guarded_delete<S>(store: &S, path: &str, message: &str) -> Result<RemoteFile>
where
    S: ContentStore + ?Sized,
{
    let prior = store.read_file(path).await?;
    store.delete_file(path, message, &prior.version).await?;
    Ok(prior)
}

/// Write to a brand-new path. The prior read is skipped entirely and no
/// version token is sent.
pub async fn create_new<S>(
    store: &S,
    path: &str,
    content: &[u8],
    message: &str,
) -> Result<WriteOutcome>
where
    S: ContentStore + ?Sized,
{
    store.write_file(path, content, message, None).await
}
