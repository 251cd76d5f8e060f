//! Feature-branch publishing.
//!
//! A publish bootstraps the project, forks `feat/{feat_id}` from the project's
//! dev branch, pushes the caller's files one conditional write at a time, and
//! reconciles a single open pull request against the dev branch. Publishing
//! again under the same feature name reuses the branch and the pull request.
//!
//! Sanitising is lossy: names differing only in stripped characters map to
//! the same branch and therefore share one pull request.

use minijinja::{Environment, context};
use serde::Serialize;
use uuid::Uuid;

use crate::github::error::GitOpsError;
use crate::github::gateway::GitHostGateway;
use crate::github::models::{NewPullRequest, PullRequest, SourceFile};

use super::bootstrap::{BootstrapFileSource, ProjectBootstrapper};
use super::contents::upsert_file;

const RANDOM_ID_LEN: usize = 12;
const AUTOMATED_LABEL: &str = "automated";

const PULL_REQUEST_BODY: &str = "\
{{ description }}

{% if source %}Source: {{ source }}
{% endif %}Project: `{{ project }}`
Feature: `{{ feat_id }}`
Directory: `{{ directory }}`

Files:
{% for path in paths %}- `{{ path }}`
{% endfor %}";

/// Inputs for [`FeatureBranchPublisher::create_feat_branch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRequest {
    /// Target project identifier.
    pub project: String,
    /// Directory the files were read from, as the caller named it.
    pub directory: String,
    /// Resolved `(path, content)` list to push.
    pub files: Vec<SourceFile>,
    /// Human-readable feature name; a random id is used when absent.
    pub feat_name: Option<String>,
    /// Pull request description.
    pub description: Option<String>,
    /// Extra labels attached when the pull request is created.
    pub labels: Vec<String>,
    /// Free-form tag naming the system that produced the push.
    pub source: Option<String>,
}

/// Result of a publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    /// Sanitised or generated feature identifier.
    pub feat_id: String,
    /// Feature branch name, `feat/{feat_id}`.
    pub branch: String,
    /// Project the feature belongs to.
    pub project: String,
    /// Base branch of the pull request.
    pub dev_branch: String,
    /// Number of the open pull request.
    pub pr_number: u64,
    /// Browser URL of the pull request, when the host reported one.
    pub pr_url: Option<String>,
    /// Number of files that differed and were written.
    pub files_written: usize,
    /// True when this publish opened the pull request.
    pub pr_created: bool,
}

/// Publishes file sets onto feature branches.
pub struct FeatureBranchPublisher<'a, G>
where
    G: GitHostGateway + ?Sized,
{
    gateway: &'a G,
    bootstrapper: ProjectBootstrapper<'a, G>,
}

impl<'a, G> FeatureBranchPublisher<'a, G>
where
    G: GitHostGateway + ?Sized,
{
    /// Creates a publisher; `files` supplies the project bootstrap set.
    #[must_use]
    pub const fn new(gateway: &'a G, files: &'a dyn BootstrapFileSource) -> Self {
        Self {
            gateway,
            bootstrapper: ProjectBootstrapper::new(gateway, files),
        }
    }

    /// Creates or updates `feat/{feat_id}` with the request's files and
    /// ensures exactly one open pull request targets the project's dev
    /// branch.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::Validation` when the project or file list is
    /// empty, and propagates bootstrap and gateway failures. Label failures
    /// are logged and never returned.
    pub async fn create_feat_branch(
        &self,
        request: &FeatureRequest,
    ) -> Result<PublishOutcome, GitOpsError> {
        if request.project.is_empty() {
            return Err(GitOpsError::validation("project is required"));
        }
        if request.files.is_empty() {
            return Err(GitOpsError::validation("no files to publish"));
        }

        let branches = self.bootstrapper.ensure_project(&request.project).await?;
        let feat_id = feature_id(request.feat_name.as_deref());
        let branch = format!("feat/{feat_id}");

        let dev_tip = self.gateway.get_branch(&branches.dev_branch).await?;
        match self.gateway.create_branch(&branch, &dev_tip.sha).await {
            Ok(_) => tracing::info!(branch = %branch, base = %branches.dev_branch, "created feature branch"),
            Err(error) if error.is_conflict() => {
                tracing::debug!(branch = %branch, "feature branch exists, pushing update");
            }
            Err(error) => return Err(error),
        }

        let mut files_written = 0;
        for file in &request.files {
            let message = format!("feat({}): update {}", request.project, file.path);
            if upsert_file(self.gateway, &branch, file, &message)
                .await?
                .wrote()
            {
                files_written += 1;
            }
        }

        let (pull, pr_created) = self
            .reconcile_pull(request, &feat_id, &branch, &branches.dev_branch)
            .await?;

        Ok(PublishOutcome {
            feat_id,
            branch,
            project: request.project.clone(),
            dev_branch: branches.dev_branch,
            pr_number: pull.number,
            pr_url: pull.html_url,
            files_written,
            pr_created,
        })
    }

    async fn reconcile_pull(
        &self,
        request: &FeatureRequest,
        feat_id: &str,
        branch: &str,
        dev_branch: &str,
    ) -> Result<(PullRequest, bool), GitOpsError> {
        if let Some(existing) = self.gateway.find_open_pull(branch, dev_branch).await? {
            tracing::debug!(branch, number = existing.number, "reusing open pull request");
            return Ok((existing, false));
        }

        let new_pull = NewPullRequest {
            title: format!("{}: {feat_id}", request.project),
            head: branch.to_owned(),
            base: dev_branch.to_owned(),
            body: render_pull_request_body(request, feat_id)?,
        };
        let pull = match self.gateway.create_pull(&new_pull).await {
            Ok(pull) => pull,
            Err(error) if error.is_conflict() => {
                // Another publish opened it between our lookup and create.
                match self.gateway.find_open_pull(branch, dev_branch).await? {
                    Some(existing) => return Ok((existing, false)),
                    None => return Err(error),
                }
            }
            Err(error) => return Err(error),
        };
        tracing::info!(branch, number = pull.number, "opened pull request");

        let labels = pull_request_labels(&request.project, &request.labels);
        if let Err(error) = self.gateway.add_labels(pull.number, &labels).await {
            tracing::warn!(number = pull.number, error = %error, "failed to label pull request");
        }
        Ok((pull, true))
    }
}

/// Reduces a feature name to a safe branch path segment.
///
/// The result is lowercase, maps whitespace and `/` to `-`, keeps only
/// `[a-z0-9._-]`, collapses repeated `-` and `.`, and trims `-` and `.`
/// from both ends. It may be empty.
///
/// # Example
///
/// ```
/// use pushgate::gitops::sanitize_feature_name;
///
/// assert_eq!(sanitize_feature_name("Add Auth!"), "add-auth");
/// assert_eq!(sanitize_feature_name("ui/Login  Flow"), "ui-login-flow");
/// ```
#[must_use]
pub fn sanitize_feature_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for character in name.chars().flat_map(char::to_lowercase) {
        let mapped = if character.is_whitespace() || character == '/' {
            '-'
        } else {
            character
        };
        let allowed = mapped.is_ascii_lowercase()
            || mapped.is_ascii_digit()
            || matches!(mapped, '.' | '_' | '-');
        if !allowed {
            continue;
        }
        if matches!(mapped, '-' | '.') && sanitized.ends_with(mapped) {
            continue;
        }
        sanitized.push(mapped);
    }
    sanitized
        .trim_matches(|character| matches!(character, '-' | '.'))
        .to_owned()
}

/// Derives the feature identifier from an optional name, falling back to a
/// random 12-character hex id when the name sanitises to nothing.
#[must_use]
pub fn feature_id(feat_name: Option<&str>) -> String {
    let sanitized = feat_name.map(sanitize_feature_name).unwrap_or_default();
    if sanitized.is_empty() {
        Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(RANDOM_ID_LEN)
            .collect()
    } else {
        sanitized
    }
}

fn pull_request_labels(project: &str, extra: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(extra.len() + 2);
    let candidates = [AUTOMATED_LABEL, project]
        .into_iter()
        .chain(extra.iter().map(String::as_str));
    for label in candidates {
        let trimmed = label.trim();
        if !trimmed.is_empty() && !labels.iter().any(|existing| existing == trimmed) {
            labels.push(trimmed.to_owned());
        }
    }
    labels
}

fn render_pull_request_body(request: &FeatureRequest, feat_id: &str) -> Result<String, GitOpsError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| minijinja::AutoEscape::None);
    env.add_template("pull_request", PULL_REQUEST_BODY)
        .map_err(|error| GitOpsError::Configuration {
            message: format!("invalid pull request template: {error}"),
        })?;

    let description = request
        .description
        .clone()
        .unwrap_or_else(|| format!("Automated push for {}", request.project));
    let paths: Vec<&str> = request.files.iter().map(|file| file.path.as_str()).collect();

    env.get_template("pull_request")
        .and_then(|template| {
            template.render(context! {
                description => description,
                source => request.source,
                project => request.project,
                feat_id => feat_id,
                directory => request.directory,
                paths => paths,
            })
        })
        .map_err(|error| GitOpsError::Configuration {
            message: format!("failed to render pull request body: {error}"),
        })
}
