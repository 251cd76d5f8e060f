//! Hosting API access for branch, content, and pull request operations.
//!
//! This module wraps Octocrab behind the [`GitHostGateway`] trait and maps
//! hosting API status codes into [`GitOpsError`] variants so that the
//! orchestration engine can branch on "absent" and "already exists" without
//! inspecting HTTP details.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;

pub use error::{ErrorKind, GitOpsError};
pub use gateway::{GitHostGateway, OctocrabGitHost};
pub use locator::{PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner};
pub use models::{
    ContentFile, FileWrite, GitRef, NewCommit, NewPullRequest, NewTree, PullRequest, SourceFile,
    TreeEntry,
};

#[cfg(any(test, feature = "test-support"))]
pub use gateway::{FakeCalls, FakeGitHost};

#[cfg(test)]
pub use gateway::MockGitHostGateway;
