//! Repository identity wrappers and API route construction.

use url::Url;

use super::error::GitOpsError;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, GitOpsError> {
        if value.trim().is_empty() {
            return Err(GitOpsError::Configuration {
                message: "repository owner must not be empty".to_owned(),
            });
        }
        Ok(Self(value.trim().to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, GitOpsError> {
        if value.trim().is_empty() {
            return Err(GitOpsError::Configuration {
                message: "repository name must not be empty".to_owned(),
            });
        }
        Ok(Self(value.trim().to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::Configuration` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, GitOpsError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GitOpsError::Configuration {
                message: "personal access token is required".to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl std::fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("PersonalAccessToken(***)")
    }
}

/// Target repository and the API base used to reach it.
///
/// # Example
///
/// ```
/// use pushgate::github::locator::RepositoryLocator;
///
/// let locator = RepositoryLocator::from_owner_repo("octo", "automation")
///     .expect("should create locator");
/// assert_eq!(locator.owner().as_str(), "octo");
/// assert_eq!(locator.api_base().as_str(), "https://api.github.com/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a locator for `owner/repo` on the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::Configuration` when owner or repo is empty.
    pub fn from_owner_repo(owner: &str, repo: &str) -> Result<Self, GitOpsError> {
        Self::new(DEFAULT_API_BASE, owner, repo)
    }

    /// Creates a locator for `owner/repo` behind an explicit API base, such
    /// as a GitHub Enterprise `https://host/api/v3` endpoint.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::Configuration` when the base URL cannot be
    /// parsed or when owner or repo is empty.
    pub fn new(api_base: &str, owner: &str, repo: &str) -> Result<Self, GitOpsError> {
        let parsed = Url::parse(api_base).map_err(|error| GitOpsError::Configuration {
            message: format!("API base URL '{api_base}' is invalid: {error}"),
        })?;

        Ok(Self {
            api_base: parsed,
            owner: RepositoryOwner::new(owner)?,
            repository: RepositoryName::new(repo)?,
        })
    }

    /// API base URL.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    fn repo_path(&self) -> String {
        format!(
            "/repos/{}/{}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    pub(crate) fn ref_path(&self, branch: &str) -> String {
        format!("{}/git/ref/heads/{}", self.repo_path(), encode_segments(branch))
    }

    pub(crate) fn refs_path(&self) -> String {
        format!("{}/git/refs", self.repo_path())
    }

    pub(crate) fn blobs_path(&self) -> String {
        format!("{}/git/blobs", self.repo_path())
    }

    pub(crate) fn trees_path(&self) -> String {
        format!("{}/git/trees", self.repo_path())
    }

    pub(crate) fn commits_path(&self) -> String {
        format!("{}/git/commits", self.repo_path())
    }

    pub(crate) fn contents_path(&self, file_path: &str) -> String {
        format!(
            "{}/contents/{}",
            self.repo_path(),
            encode_segments(file_path.trim_start_matches('/'))
        )
    }

    pub(crate) fn pulls_path(&self) -> String {
        format!("{}/pulls", self.repo_path())
    }

    pub(crate) fn issue_labels_path(&self, number: u64) -> String {
        format!("{}/issues/{number}/labels", self.repo_path())
    }
}

/// Percent-encodes each `/`-separated segment, keeping the separators.
fn encode_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
