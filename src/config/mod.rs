//! Service configuration loaded from CLI, environment, and files.
//!
//! Values merge with ortho-config's layered precedence (lowest to highest):
//!
//! 1. **Defaults** – built-in values below
//! 2. **Configuration file** – `.pushgate.toml` in the current directory,
//!    home directory, or XDG config directory
//! 3. **Environment variables** – `PUSHGATE_*`; the token also falls back to
//!    `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--owner`, `--repo`, `--bind`, ...
//!
//! ```toml
//! owner = "octocat"
//! repo = "automation"
//! token = "ghp_example"
//! bind = "0.0.0.0:8787"
//! concurrency = 5
//! max_queue_depth = 50
//! templates_dir = "automation-templates"
//! review_agent_dir = "review-agent"
//! ```

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::error::GitOpsError;
use crate::telemetry::LogFormat;

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_BIND: &str = "127.0.0.1:8787";
const DEFAULT_CONCURRENCY: usize = 5;
const DEFAULT_MAX_QUEUE_DEPTH: usize = 50;
const DEFAULT_GITHUB_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_TEMPLATES_DIR: &str = "automation-templates";

/// Service configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use pushgate::PushgateConfig;
///
/// let config = PushgateConfig::load().expect("failed to load configuration");
/// let (owner, repo) = config.require_repository_info().expect("repository required");
/// let token = config.resolve_token().expect("token required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PUSHGATE",
    discovery(
        dotfile_name = ".pushgate.toml",
        config_file_name = "pushgate.toml",
        app_name = "pushgate"
    )
)]
pub struct PushgateConfig {
    /// Owner of the managed repository.
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Name of the managed repository.
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Hosting API token; `GITHUB_TOKEN` is used when unset.
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Hosting API base URL.
    #[ortho_config()]
    pub api_url: String,

    /// HTTP listen address.
    #[ortho_config(cli_short = 'b')]
    pub bind: String,

    /// Maximum publish and bootstrap tasks running at once.
    #[ortho_config()]
    pub concurrency: usize,

    /// Maximum tasks waiting for a slot before new work is refused.
    #[ortho_config()]
    pub max_queue_depth: usize,

    /// Upper bound on each hosting API call, in seconds.
    #[ortho_config()]
    pub github_timeout_seconds: u64,

    /// Directory every request `dir` must resolve under.
    #[ortho_config()]
    pub workspace_root: String,

    /// Root of the automation templates: `{templates_dir}/{project}` when it
    /// exists, else `{templates_dir}/default`.
    #[ortho_config()]
    pub templates_dir: String,

    /// Review-agent scripts committed under `.github/review-agent/`.
    #[ortho_config()]
    pub review_agent_dir: Option<String>,

    /// Bearer key required on every route except `/ping`.
    #[ortho_config()]
    pub api_key: Option<String>,

    /// Log output format: `text` or `json`.
    #[ortho_config()]
    pub log_format: String,
}

impl Default for PushgateConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            token: None,
            api_url: DEFAULT_API_URL.to_owned(),
            bind: DEFAULT_BIND.to_owned(),
            concurrency: DEFAULT_CONCURRENCY,
            max_queue_depth: DEFAULT_MAX_QUEUE_DEPTH,
            github_timeout_seconds: DEFAULT_GITHUB_TIMEOUT_SECONDS,
            workspace_root: ".".to_owned(),
            templates_dir: DEFAULT_TEMPLATES_DIR.to_owned(),
            review_agent_dir: None,
            api_key: None,
            log_format: "text".to_owned(),
        }
    }
}

impl PushgateConfig {
    /// Resolves the token from configuration or the `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`GitOpsError::Configuration`] when no source provides a
    /// value.
    pub fn resolve_token(&self) -> Result<String, GitOpsError> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| GitOpsError::Configuration {
                message: "hosting API token is required (use --token, PUSHGATE_TOKEN or GITHUB_TOKEN)"
                    .to_owned(),
            })
    }

    /// Returns owner and repo if both are configured.
    ///
    /// # Errors
    ///
    /// Returns [`GitOpsError::Configuration`] when owner or repo is missing.
    pub fn require_repository_info(&self) -> Result<(&str, &str), GitOpsError> {
        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => Ok((owner.as_str(), repo.as_str())),
            (None, _) => Err(GitOpsError::Configuration {
                message: "repository owner is required (use --owner or -o)".to_owned(),
            }),
            (_, None) => Err(GitOpsError::Configuration {
                message: "repository name is required (use --repo or -r)".to_owned(),
            }),
        }
    }

    /// Returns `(concurrency, max_queue_depth)`.
    ///
    /// # Errors
    ///
    /// Returns [`GitOpsError::Configuration`] when concurrency is zero.
    pub fn queue_limits(&self) -> Result<(usize, usize), GitOpsError> {
        if self.concurrency == 0 {
            return Err(GitOpsError::Configuration {
                message: "concurrency must be at least 1".to_owned(),
            });
        }
        Ok((self.concurrency, self.max_queue_depth))
    }

    /// Parses the listen address.
    ///
    /// # Errors
    ///
    /// Returns [`GitOpsError::Configuration`] when `bind` is not a socket
    /// address.
    pub fn bind_address(&self) -> Result<SocketAddr, GitOpsError> {
        self.bind
            .parse()
            .map_err(|error| GitOpsError::Configuration {
                message: format!("invalid bind address '{}': {error}", self.bind),
            })
    }

    /// Per-call hosting API timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GitOpsError::Configuration`] when the timeout is zero, as
    /// every hosting call would then fail immediately.
    pub fn github_timeout(&self) -> Result<Duration, GitOpsError> {
        if self.github_timeout_seconds == 0 {
            return Err(GitOpsError::Configuration {
                message: "github_timeout_seconds must be at least 1".to_owned(),
            });
        }
        Ok(Duration::from_secs(self.github_timeout_seconds))
    }

    /// Parses the log format.
    ///
    /// # Errors
    ///
    /// Returns [`GitOpsError::Configuration`] for anything other than `text`
    /// or `json`.
    pub fn log_format(&self) -> Result<LogFormat, GitOpsError> {
        self.log_format.parse()
    }

    /// Workspace root as a UTF-8 path.
    #[must_use]
    pub fn workspace_root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(&self.workspace_root)
    }

    /// Template root as a UTF-8 path.
    #[must_use]
    pub fn templates_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(&self.templates_dir)
    }

    /// Review-agent directory, when configured.
    #[must_use]
    pub fn review_agent_dir(&self) -> Option<Utf8PathBuf> {
        self.review_agent_dir.as_deref().map(Utf8PathBuf::from)
    }
}

#[cfg(test)]
mod tests;
