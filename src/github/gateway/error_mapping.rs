//! Error mapping helpers for the Octocrab gateway implementation.

use http::StatusCode;

use crate::github::error::GitOpsError;

/// Checks if a GitHub error status indicates an authentication failure.
pub(super) const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if a status is the host's "already exists" or "stale
/// precondition" answer.
pub(super) const fn is_conflict(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
    )
}

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

pub(super) fn map_status(operation: &str, status: StatusCode, message: String) -> GitOpsError {
    let operation = operation.to_owned();
    if status == StatusCode::NOT_FOUND {
        GitOpsError::NotFound { operation, message }
    } else if is_conflict(status) {
        GitOpsError::Conflict {
            operation,
            status: status.as_u16(),
            message,
        }
    } else if is_auth_failure(status) {
        GitOpsError::Authentication {
            operation,
            status: status.as_u16(),
            message,
        }
    } else {
        GitOpsError::Upstream {
            operation,
            status: status.as_u16(),
            message,
        }
    }
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> GitOpsError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return map_status(operation, source.status_code, source.message.clone());
    }

    if is_network_error(error) {
        return GitOpsError::Network {
            operation: operation.to_owned(),
            message: error.to_string(),
        };
    }

    GitOpsError::Upstream {
        operation: operation.to_owned(),
        status: StatusCode::BAD_GATEWAY.as_u16(),
        message: error.to_string(),
    }
}
