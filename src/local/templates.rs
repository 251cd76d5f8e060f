//! Automation file sets committed onto project master branches.

use std::collections::BTreeMap;
use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::github::error::GitOpsError;
use crate::github::models::SourceFile;
use crate::gitops::{BootstrapFileSource, ProjectName};

use super::files::{default_exclusions, read_directory};

/// Repository directory that receives the review-agent scripts.
pub const REVIEW_AGENT_PREFIX: &str = ".github/review-agent";

const DEFAULT_TEMPLATE: &str = "default";

/// Reads automation templates from disk on every call.
///
/// The project's own directory `{templates_dir}/{project}` is used when it
/// exists, otherwise `{templates_dir}/default`. Scripts from the optional
/// review-agent directory are added under [`REVIEW_AGENT_PREFIX`] and win
/// over a template file at the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDirectory {
    templates_dir: Utf8PathBuf,
    review_agent_dir: Option<Utf8PathBuf>,
}

impl TemplateDirectory {
    /// Creates a template source rooted at `templates_dir`.
    #[must_use]
    pub fn new(templates_dir: impl Into<Utf8PathBuf>, review_agent_dir: Option<Utf8PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            review_agent_dir,
        }
    }

    fn template_root(&self, project: &ProjectName) -> Result<Utf8PathBuf, GitOpsError> {
        let project_dir = self.templates_dir.join(project.as_str());
        if directory_exists(&project_dir)? {
            return Ok(project_dir);
        }
        let default_dir = self.templates_dir.join(DEFAULT_TEMPLATE);
        if directory_exists(&default_dir)? {
            return Ok(default_dir);
        }
        Err(GitOpsError::Configuration {
            message: format!(
                "no automation templates for '{project}' under '{}'",
                self.templates_dir
            ),
        })
    }
}

impl BootstrapFileSource for TemplateDirectory {
    fn files(&self, project: &ProjectName) -> Result<Vec<SourceFile>, GitOpsError> {
        let root = self.template_root(project)?;
        tracing::debug!(project = %project, templates = %root, "reading automation templates");

        let mut by_path: BTreeMap<String, Vec<u8>> = read_directory(&root, default_exclusions)?
            .into_iter()
            .map(|file| (file.path, file.content))
            .collect();
        if let Some(agent_dir) = &self.review_agent_dir {
            for file in read_directory(agent_dir, default_exclusions)? {
                by_path.insert(format!("{REVIEW_AGENT_PREFIX}/{}", file.path), file.content);
            }
        }

        Ok(by_path
            .into_iter()
            .map(|(path, content)| SourceFile::new(path, content))
            .collect())
    }
}

/// A fixed, in-memory automation file set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticFileSet {
    files: Vec<SourceFile>,
}

impl StaticFileSet {
    /// Wraps an already-assembled file list.
    #[must_use]
    pub const fn new(files: Vec<SourceFile>) -> Self {
        Self { files }
    }
}

impl BootstrapFileSource for StaticFileSet {
    fn files(&self, _project: &ProjectName) -> Result<Vec<SourceFile>, GitOpsError> {
        Ok(self.files.clone())
    }
}

fn directory_exists(path: &Utf8Path) -> Result<bool, GitOpsError> {
    match Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(_) => Ok(true),
        Err(error) if matches!(error.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            Ok(false)
        }
        Err(error) => Err(GitOpsError::Io {
            message: format!("failed to open template directory '{path}': {error}"),
        }),
    }
}
