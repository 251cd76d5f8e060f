//! Gateways for the hosting API's git data, contents, and pull request
//! endpoints.
//!
//! The trait keeps the orchestration engine independent of the HTTP client so
//! tests can substitute a mock or the in-memory [`FakeGitHost`]. The Octocrab
//! implementation performs the real requests and maps status codes into
//! [`GitOpsError`] variants. No retries happen at this layer.

mod client;
mod error_mapping;
#[cfg(any(test, feature = "test-support"))]
mod fake;
mod octocrab_host;


#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCalls, FakeGitHost};
pub use octocrab_host::OctocrabGitHost;

use async_trait::async_trait;

use crate::github::error::GitOpsError;
use crate::github::models::{
    ContentFile, FileWrite, GitRef, NewCommit, NewPullRequest, NewTree, PullRequest,
};

/// Stateless RPC surface over one repository on the hosting service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitHostGateway: Send + Sync {
    /// Read the ref for `branch`; `NotFound` when it does not exist.
    async fn get_branch(&self, branch: &str) -> Result<GitRef, GitOpsError>;

    /// Create `branch` pointing at `sha`; `Conflict` when it already exists.
    async fn create_branch(&self, branch: &str, sha: &str) -> Result<GitRef, GitOpsError>;

    /// Upload raw bytes as a blob and return its SHA.
    async fn create_blob(&self, content: &[u8]) -> Result<String, GitOpsError>;

    /// Create a tree and return its SHA.
    async fn create_tree(&self, tree: &NewTree) -> Result<String, GitOpsError>;

    /// Create a commit and return its SHA.
    async fn create_commit(&self, commit: &NewCommit) -> Result<String, GitOpsError>;

    /// Read a file at `path` on `branch`; `NotFound` when absent.
    async fn get_file(&self, path: &str, branch: &str) -> Result<ContentFile, GitOpsError>;

    /// Create or update a single file as one commit.
    async fn put_file(&self, write: &FileWrite) -> Result<(), GitOpsError>;

    /// Find the open pull request from `head` into `base`, if any.
    async fn find_open_pull(
        &self,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequest>, GitOpsError>;

    /// Open a pull request.
    async fn create_pull(&self, pull: &NewPullRequest) -> Result<PullRequest, GitOpsError>;

    /// Attach labels to an issue or pull request.
    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GitOpsError>;
}
