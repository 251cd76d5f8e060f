//! Data models for refs, file contents, and pull requests.
//!
//! Types prefixed with `Api` are internal deserialisation targets that
//! convert into public domain types. Request bodies are serialised exactly as
//! the hosting API expects them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// A `(path, content)` pair to be committed onto a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Repository-relative path using `/` separators.
    pub path: String,
    /// Raw file bytes.
    pub content: Vec<u8>,
}

impl SourceFile {
    /// Creates a file entry from a path and content.
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A branch ref and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRef {
    /// Branch name without the `refs/heads/` prefix.
    pub branch: String,
    /// Commit SHA at the tip of the branch.
    pub sha: String,
}

/// A file read from a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    /// Blob SHA, used as the precondition for conditional writes.
    pub sha: String,
    /// Decoded file bytes; `None` when the host omits them, as it does for
    /// files over 1 MB.
    pub content: Option<Vec<u8>>,
}

/// Single-file write onto a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    /// Repository-relative path.
    pub path: String,
    /// Target branch.
    pub branch: String,
    /// Commit message for the write.
    pub message: String,
    /// New file bytes.
    pub content: Vec<u8>,
    /// Blob SHA the file must currently have; `None` creates the file.
    pub expected_sha: Option<String>,
}

/// Tree entry referencing an existing blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    /// Path of the blob within the tree.
    pub path: String,
    /// File mode; regular files use `100644`.
    pub mode: String,
    /// Entry type; always `blob` here.
    #[serde(rename = "type")]
    pub kind: String,
    /// Blob SHA.
    pub sha: String,
}

impl TreeEntry {
    /// Creates a regular-file blob entry.
    #[must_use]
    pub fn blob(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: "100644".to_owned(),
            kind: "blob".to_owned(),
            sha: sha.into(),
        }
    }
}

/// Tree creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTree {
    /// Entries of the new tree.
    pub tree: Vec<TreeEntry>,
    /// Tree to layer the entries on; `None` builds a tree from scratch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<String>,
}

/// Commit creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCommit {
    /// Commit message.
    pub message: String,
    /// Tree SHA the commit records.
    pub tree: String,
    /// Parent commit SHAs; empty for a root commit.
    pub parents: Vec<String>,
}

/// Pull request creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    /// Pull request title.
    pub title: String,
    /// Head branch name.
    pub head: String,
    /// Base branch name.
    pub base: String,
    /// Markdown body.
    pub body: String,
}

/// Pull request identity returned by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// HTML URL for displaying to a user.
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    pub(crate) reference: String,
    pub(crate) sha: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateBlobBody {
    pub(crate) content: String,
    pub(crate) encoding: &'static str,
}

impl CreateBlobBody {
    pub(crate) fn base64(content: &[u8]) -> Self {
        Self {
            content: STANDARD.encode(content),
            encoding: "base64",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PutContentsBody<'a> {
    pub(crate) message: &'a str,
    pub(crate) content: String,
    pub(crate) branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) sha: Option<&'a str>,
}

impl<'a> From<&'a FileWrite> for PutContentsBody<'a> {
    fn from(write: &'a FileWrite) -> Self {
        Self {
            message: write.message.as_str(),
            content: STANDARD.encode(&write.content),
            branch: write.branch.as_str(),
            sha: write.expected_sha.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LabelsBody<'a> {
    pub(crate) labels: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiRef {
    #[serde(rename = "ref")]
    pub(crate) reference: String,
    pub(crate) object: ApiSha,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiSha {
    pub(crate) sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiContent {
    pub(crate) sha: String,
    pub(crate) content: Option<String>,
    pub(crate) encoding: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPullRequest {
    pub(crate) number: u64,
    pub(crate) html_url: Option<String>,
}

impl From<ApiRef> for GitRef {
    fn from(value: ApiRef) -> Self {
        let branch = value
            .reference
            .strip_prefix("refs/heads/")
            .unwrap_or(value.reference.as_str())
            .to_owned();
        Self {
            branch,
            sha: value.object.sha,
        }
    }
}

impl From<ApiPullRequest> for PullRequest {
    fn from(value: ApiPullRequest) -> Self {
        Self {
            number: value.number,
            html_url: value.html_url,
        }
    }
}

impl ApiContent {
    /// Decodes the payload; the host wraps base64 content across lines.
    ///
    /// Large files come back with encoding `none` and no content, which
    /// yields a file whose bytes are unknown.
    pub(crate) fn decode(self) -> Result<ContentFile, String> {
        let raw = self.content.unwrap_or_default();
        let content = match self.encoding.as_deref() {
            Some("none") => None,
            Some("base64") | None => {
                let compact: String = raw.split_whitespace().collect();
                Some(
                    STANDARD
                        .decode(compact)
                        .map_err(|error| format!("invalid base64 content: {error}"))?,
                )
            }
            Some("utf-8" | "utf8") => Some(raw.into_bytes()),
            Some(other) => return Err(format!("unsupported content encoding '{other}'")),
        };
        Ok(ContentFile {
            sha: self.sha,
            content,
        })
    }
}
