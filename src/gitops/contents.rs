//! Single-file conditional writes.

use crate::github::error::GitOpsError;
use crate::github::gateway::GitHostGateway;
use crate::github::models::{FileWrite, SourceFile};

/// Result of [`upsert_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The branch already held identical bytes; nothing was written.
    Unchanged,
    /// The path did not exist and was created.
    Created,
    /// The path existed with different content and was overwritten.
    Updated,
}

impl UpsertOutcome {
    /// Returns true when a write was issued.
    #[must_use]
    pub const fn wrote(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Writes `file` onto `branch` unless the branch already holds the same
/// bytes.
///
/// One read yields both the current blob hash and the current content. The
/// write carries that hash as its precondition, so a change landing between
/// the read and the write is rejected by the host as a `Conflict` rather
/// than silently overwritten. When the host does not return the current
/// bytes the file is always written.
///
/// # Errors
///
/// Propagates gateway failures, including the `Conflict` raised when the
/// precondition no longer holds.
pub async fn upsert_file<G>(
    gateway: &G,
    branch: &str,
    file: &SourceFile,
    message: &str,
) -> Result<UpsertOutcome, GitOpsError>
where
    G: GitHostGateway + ?Sized,
{
    let existing = match gateway.get_file(&file.path, branch).await {
        Ok(current) => Some(current),
        Err(error) if error.is_not_found() => None,
        Err(error) => return Err(error),
    };

    if let Some(current) = &existing
        && current.content.as_deref() == Some(file.content.as_slice())
    {
        tracing::debug!(branch, path = %file.path, "content unchanged, skipping write");
        return Ok(UpsertOutcome::Unchanged);
    }

    let expected_sha = existing.map(|current| current.sha);
    let outcome = if expected_sha.is_some() {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Created
    };

    gateway
        .put_file(&FileWrite {
            path: file.path.clone(),
            branch: branch.to_owned(),
            message: message.to_owned(),
            content: file.content.clone(),
            expected_sha,
        })
        .await?;

    tracing::debug!(branch, path = %file.path, ?outcome, "wrote file");
    Ok(outcome)
}
