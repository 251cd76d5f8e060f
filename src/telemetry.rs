//! Tracing subscriber set-up.
//!
//! Library code only emits `tracing` events; the binary installs the
//! subscriber once at start-up. `RUST_LOG` overrides the default filter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as subscriber_fmt};

use crate::github::error::GitOpsError;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "pushgate=info,tower_http=info";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = GitOpsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(GitOpsError::Configuration {
                message: format!("unknown log format '{other}' (expected text or json)"),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`GitOpsError::Configuration`] when a global subscriber is
/// already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), GitOpsError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (text, json) = match format {
        LogFormat::Text => (Some(subscriber_fmt::layer()), None),
        LogFormat::Json => (None, Some(subscriber_fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .try_init()
        .map_err(|error| GitOpsError::Configuration {
            message: format!("failed to install tracing subscriber: {error}"),
        })
}
