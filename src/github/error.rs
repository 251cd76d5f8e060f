//! Error types shared by the hosting gateway and the orchestration engine.

use serde::Serialize;
use thiserror::Error;

/// Coarse failure classification used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input was rejected before any remote call was made.
    Validation,
    /// The task queue backlog is full; retry later.
    Backpressure,
    /// The remote host reported that the target already exists or changed.
    Conflict,
    /// The remote host failed, timed out, or answered unexpectedly.
    Upstream,
    /// Local configuration, I/O, or task supervision failed.
    Internal,
}

/// Errors surfaced while validating input or talking to the hosting API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitOpsError {
    /// Caller input failed validation.
    #[error("invalid request: {message}")]
    Validation {
        /// Description of the rejected input.
        message: String,
    },

    /// The queue already holds the maximum number of waiting tasks.
    #[error("queue full: {max_depth} tasks already waiting, retry later")]
    QueueFull {
        /// Configured maximum number of waiting tasks.
        max_depth: usize,
    },

    /// The requested ref, file, or entity does not exist on the host.
    #[error("{operation} failed: not found ({message})")]
    NotFound {
        /// Remote operation that was attempted.
        operation: String,
        /// Response body returned with the 404.
        message: String,
    },

    /// The host rejected a create or conditional write.
    #[error("{operation} failed with status {status}: {message}")]
    Conflict {
        /// Remote operation that was attempted.
        operation: String,
        /// HTTP status reported by the host (409 or 422).
        status: u16,
        /// Response body describing the conflict.
        message: String,
    },

    /// The token was rejected by the host.
    #[error("{operation} failed: token rejected with status {status} ({message})")]
    Authentication {
        /// Remote operation that was attempted.
        operation: String,
        /// Status returned by the host, 401 or 403.
        status: u16,
        /// Response body returned with the rejection.
        message: String,
    },

    /// The host answered with an unexpected status.
    #[error("{operation} failed with status {status}: {message}")]
    Upstream {
        /// Remote operation that was attempted.
        operation: String,
        /// HTTP status reported by the host.
        status: u16,
        /// Raw response body or error detail.
        message: String,
    },

    /// Transport-level failure while calling the host.
    #[error("network error during {operation}: {message}")]
    Network {
        /// Remote operation that was attempted.
        operation: String,
        /// Transport error detail.
        message: String,
    },

    /// A remote call exceeded its configured time limit.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Remote operation that was attempted.
        operation: String,
        /// Configured limit in seconds.
        seconds: u64,
    },

    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// Local file system access failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// A queued task ended without delivering a result.
    #[error("task aborted: {message}")]
    TaskAborted {
        /// Why the result was lost.
        message: String,
    },
}

impl GitOpsError {
    /// Convenience constructor for validation failures.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::QueueFull { .. } => ErrorKind::Backpressure,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFound { .. }
            | Self::Authentication { .. }
            | Self::Upstream { .. }
            | Self::Network { .. }
            | Self::Timeout { .. } => ErrorKind::Upstream,
            Self::Configuration { .. } | Self::Io { .. } | Self::TaskAborted { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP status reported by the hosting API, when one was received.
    #[must_use]
    pub const fn remote_status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Conflict { status, .. }
            | Self::Authentication { status, .. }
            | Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true when the host reported the target as absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true when the host reported the target as already existing.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Status code the HTTP surface answers with for this failure.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Timeout { .. } => 504,
            _ => match self.kind() {
                ErrorKind::Validation => 400,
                ErrorKind::Backpressure => 503,
                ErrorKind::Conflict => 409,
                ErrorKind::Upstream => 502,
                ErrorKind::Internal => 500,
            },
        }
    }
}
