//! Octocrab client construction helpers for gateway implementations.

use http::Uri;
use octocrab::Octocrab;
use octocrab::service::middleware::retry::RetryConfig;

use crate::github::error::GitOpsError;
use crate::github::locator::PersonalAccessToken;

use super::error_mapping::map_octocrab_error;

/// Builds an Octocrab client for the given token and API base URL.
///
/// Octocrab's built-in retry layer is disabled; callers decide whether an
/// operation is safe to repeat.
///
/// # Errors
///
/// Returns `GitOpsError::Configuration` when the base URI cannot be parsed or
/// when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
) -> Result<Octocrab, GitOpsError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| GitOpsError::Configuration {
            message: format!("API base '{api_base}' is not a valid URI: {error}"),
        })?;

    Octocrab::builder()
        .add_retry_config(RetryConfig::None)
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| GitOpsError::Configuration {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
