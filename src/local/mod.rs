//! Local disk collaborators.
//!
//! Reads the caller's feature directory and the automation templates that
//! bootstrap commits onto project master branches. Nothing here talks to the
//! hosting API.

mod files;
mod templates;

pub use files::{
    DEFAULT_EXCLUDED_NAMES, default_exclusions, read_directory, read_within, resolve_within,
};
pub use templates::{REVIEW_AGENT_PREFIX, StaticFileSet, TemplateDirectory};
