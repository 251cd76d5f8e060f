//! Project bootstrap: an isolated `{project}-master` root branch carrying the
//! automation files, and a `{project}-dev` branch forked from it.
//!
//! The master branch starts from a root commit built from a tree with no
//! base, so it never inherits history from the repository's default branch.
//! Re-running bootstrap converges an existing master branch onto the current
//! file set one conditional write at a time, which also recovers from a
//! bootstrap that failed part-way.

use serde::Serialize;

use crate::github::error::GitOpsError;
use crate::github::gateway::GitHostGateway;
use crate::github::models::{NewCommit, NewTree, SourceFile, TreeEntry};

use super::branch::ensure_branch;
use super::contents::upsert_file;
use super::project::ProjectName;

/// Supplies the automation files committed onto a project's master branch.
///
/// Implementations recompute the set on every call; the result must be
/// deterministic for a given configuration.
pub trait BootstrapFileSource: Send + Sync {
    /// Returns the ordered `(path, content)` list for `project`.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::Io` or `GitOpsError::Configuration` when the
    /// files cannot be assembled.
    fn files(&self, project: &ProjectName) -> Result<Vec<SourceFile>, GitOpsError>;
}

/// Branch names guaranteed by [`ProjectBootstrapper::ensure_project`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectBranches {
    /// Isolated root branch holding the automation files.
    pub master_branch: String,
    /// Integration branch that feature pull requests target.
    pub dev_branch: String,
    /// True when this call created the master branch.
    pub created: bool,
    /// Number of automation files rewritten on an existing master branch.
    pub files_written: usize,
}

enum RootBranch {
    Created,
    CreatedConcurrently,
}

/// Idempotently establishes a project's branch lineage.
pub struct ProjectBootstrapper<'a, G>
where
    G: GitHostGateway + ?Sized,
{
    gateway: &'a G,
    files: &'a dyn BootstrapFileSource,
}

impl<'a, G> ProjectBootstrapper<'a, G>
where
    G: GitHostGateway + ?Sized,
{
    /// Creates a bootstrapper over a gateway and an automation file source.
    #[must_use]
    pub const fn new(gateway: &'a G, files: &'a dyn BootstrapFileSource) -> Self {
        Self { gateway, files }
    }

    /// Guarantees `{project}-master` and `{project}-dev` exist and that the
    /// master branch carries the current automation files.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::Validation` for an invalid project name before
    /// any remote call, `GitOpsError::Configuration` when the automation file
    /// set is empty, and propagates gateway failures other than the benign
    /// "already exists" races.
    pub async fn ensure_project(&self, project: &str) -> Result<ProjectBranches, GitOpsError> {
        let name = ProjectName::parse(project)?;
        let master_branch = name.master_branch();
        let dev_branch = name.dev_branch();
        let files = self.files.files(&name)?;
        if files.is_empty() {
            return Err(GitOpsError::Configuration {
                message: format!("no automation files available for project '{name}'"),
            });
        }

        let master_exists = match self.gateway.get_branch(&master_branch).await {
            Ok(_) => true,
            Err(error) if error.is_not_found() => false,
            Err(error) => return Err(error),
        };

        let mut created = false;
        let mut files_written = 0;
        let needs_sync = if master_exists {
            true
        } else {
            match self
                .create_root_branch(&name, &master_branch, &files)
                .await?
            {
                RootBranch::Created => {
                    created = true;
                    false
                }
                RootBranch::CreatedConcurrently => true,
            }
        };

        if needs_sync {
            files_written = self.sync_files(&name, &master_branch, &files).await?;
        }

        ensure_branch(self.gateway, &dev_branch, &master_branch).await?;

        tracing::info!(
            project = %name,
            created,
            files_written,
            "project bootstrap complete"
        );
        Ok(ProjectBranches {
            master_branch,
            dev_branch,
            created,
            files_written,
        })
    }

    async fn create_root_branch(
        &self,
        project: &ProjectName,
        master_branch: &str,
        files: &[SourceFile],
    ) -> Result<RootBranch, GitOpsError> {
        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let sha = self.gateway.create_blob(&file.content).await?;
            entries.push(TreeEntry::blob(file.path.as_str(), sha));
        }

        let tree = self
            .gateway
            .create_tree(&NewTree {
                tree: entries,
                base_tree: None,
            })
            .await?;
        let commit = self
            .gateway
            .create_commit(&NewCommit {
                message: format!("chore({project}): bootstrap automation files"),
                tree,
                parents: Vec::new(),
            })
            .await?;

        match self.gateway.create_branch(master_branch, &commit).await {
            Ok(_) => {
                tracing::info!(branch = master_branch, commit = %commit, "created root branch");
                Ok(RootBranch::Created)
            }
            Err(error) if error.is_conflict() => {
                tracing::debug!(
                    branch = master_branch,
                    "root branch created concurrently, syncing instead"
                );
                Ok(RootBranch::CreatedConcurrently)
            }
            Err(error) => Err(error),
        }
    }

    async fn sync_files(
        &self,
        project: &ProjectName,
        master_branch: &str,
        files: &[SourceFile],
    ) -> Result<usize, GitOpsError> {
        let mut written = 0;
        for file in files {
            let message = format!("chore({project}): sync {}", file.path);
            if upsert_file(self.gateway, master_branch, file, &message)
                .await?
                .wrote()
            {
                written += 1;
            }
        }
        Ok(written)
    }
}
