//! Octocrab implementation of the hosting gateway.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use octocrab::Octocrab;

use crate::github::error::GitOpsError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::{
    ApiContent, ApiPullRequest, ApiRef, ApiSha, ContentFile, CreateBlobBody, CreateRefBody,
    FileWrite, GitRef, LabelsBody, NewCommit, NewPullRequest, NewTree, PullRequest,
    PutContentsBody,
};

use super::GitHostGateway;
use super::client::build_octocrab_client;
use super::error_mapping::map_octocrab_error;

/// Octocrab-backed gateway bound to a single repository.
pub struct OctocrabGitHost {
    client: Octocrab,
    locator: RepositoryLocator,
    timeout: Duration,
}

impl OctocrabGitHost {
    /// Creates a gateway from an existing Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab, locator: RepositoryLocator, timeout: Duration) -> Self {
        Self {
            client,
            locator,
            timeout,
        }
    }

    /// Builds an authenticated client for the locator's API base.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::Configuration` when the base URI cannot be parsed
    /// or the client cannot be constructed.
    pub fn for_token(
        token: &PersonalAccessToken,
        locator: RepositoryLocator,
        timeout: Duration,
    ) -> Result<Self, GitOpsError> {
        let client = build_octocrab_client(token, locator.api_base().as_str())?;
        Ok(Self::new(client, locator, timeout))
    }

    /// Repository this gateway targets.
    #[must_use]
    pub const fn locator(&self) -> &RepositoryLocator {
        &self.locator
    }

    async fn call<T, F>(&self, operation: &str, request: F) -> Result<T, GitOpsError>
    where
        F: Future<Output = octocrab::Result<T>> + Send,
    {
        tracing::debug!(operation, "calling hosting API");
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(map_octocrab_error(operation, &error)),
            Err(_elapsed) => Err(GitOpsError::Timeout {
                operation: operation.to_owned(),
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl GitHostGateway for OctocrabGitHost {
    async fn get_branch(&self, branch: &str) -> Result<GitRef, GitOpsError> {
        let route = self.locator.ref_path(branch);
        self.call(
            "get ref",
            self.client.get::<ApiRef, _, _>(route, None::<&()>),
        )
        .await
        .map(GitRef::from)
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<GitRef, GitOpsError> {
        let body = CreateRefBody {
            reference: format!("refs/heads/{branch}"),
            sha,
        };
        self.call(
            "create ref",
            self.client
                .post::<_, ApiRef>(self.locator.refs_path(), Some(&body)),
        )
        .await
        .map(GitRef::from)
    }

    async fn create_blob(&self, content: &[u8]) -> Result<String, GitOpsError> {
        let body = CreateBlobBody::base64(content);
        self.call(
            "create blob",
            self.client
                .post::<_, ApiSha>(self.locator.blobs_path(), Some(&body)),
        )
        .await
        .map(|created| created.sha)
    }

    async fn create_tree(&self, tree: &NewTree) -> Result<String, GitOpsError> {
        self.call(
            "create tree",
            self.client
                .post::<_, ApiSha>(self.locator.trees_path(), Some(tree)),
        )
        .await
        .map(|created| created.sha)
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<String, GitOpsError> {
        self.call(
            "create commit",
            self.client
                .post::<_, ApiSha>(self.locator.commits_path(), Some(commit)),
        )
        .await
        .map(|created| created.sha)
    }

    async fn get_file(&self, path: &str, branch: &str) -> Result<ContentFile, GitOpsError> {
        let query = [("ref", branch)];
        let content = self
            .call(
                "get contents",
                self.client
                    .get::<ApiContent, _, _>(self.locator.contents_path(path), Some(&query)),
            )
            .await?;

        content.decode().map_err(|message| GitOpsError::Upstream {
            operation: "get contents".to_owned(),
            status: 200,
            message: format!("{path}: {message}"),
        })
    }

    async fn put_file(&self, write: &FileWrite) -> Result<(), GitOpsError> {
        let body = PutContentsBody::from(write);
        self.call(
            "put contents",
            self.client.put::<serde_json::Value, _, _>(
                self.locator.contents_path(&write.path),
                Some(&body),
            ),
        )
        .await
        .map(|_response| ())
    }

    async fn find_open_pull(
        &self,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequest>, GitOpsError> {
        let head_filter = format!("{}:{head}", self.locator.owner().as_str());
        let query = [
            ("state", "open"),
            ("head", head_filter.as_str()),
            ("base", base),
        ];
        let pulls = self
            .call(
                "list pulls",
                self.client
                    .get::<Vec<ApiPullRequest>, _, _>(self.locator.pulls_path(), Some(&query)),
            )
            .await?;

        Ok(pulls.into_iter().next().map(PullRequest::from))
    }

    async fn create_pull(&self, pull: &NewPullRequest) -> Result<PullRequest, GitOpsError> {
        self.call(
            "create pull",
            self.client
                .post::<_, ApiPullRequest>(self.locator.pulls_path(), Some(pull)),
        )
        .await
        .map(PullRequest::from)
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GitOpsError> {
        let body = LabelsBody { labels };
        self.call(
            "add labels",
            self.client.post::<_, serde_json::Value>(
                self.locator.issue_labels_path(number),
                Some(&body),
            ),
        )
        .await
        .map(|_labels| ())
    }
}
