//! Reading file sets from local disk.
//!
//! Directories are walked iteratively with an explicit stack and an
//! exclusion predicate supplied by the caller. Paths in the result are
//! relative to the walked root, use `/` separators, and are sorted.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::github::error::GitOpsError;
use crate::github::models::SourceFile;

/// Entry names skipped by [`default_exclusions`].
pub const DEFAULT_EXCLUDED_NAMES: &[&str] = &[".git", "node_modules", "target", ".DS_Store"];

/// Default exclusion predicate: skips VCS metadata, dependency caches, and
/// build output at any depth.
#[must_use]
pub fn default_exclusions(relative: &Utf8Path) -> bool {
    relative
        .file_name()
        .is_some_and(|name| DEFAULT_EXCLUDED_NAMES.contains(&name))
}

/// Validates a caller-supplied directory and joins it onto `workspace_root`.
///
/// # Errors
///
/// Returns `GitOpsError::Validation` when `dir` is empty, absolute, or
/// contains a `..` component.
pub fn resolve_within(workspace_root: &Utf8Path, dir: &str) -> Result<Utf8PathBuf, GitOpsError> {
    Ok(workspace_root.join(relative_dir(dir)?))
}

/// Reads every regular file under `root`, skipping entries for which
/// `exclude` returns true. The predicate receives the entry's path relative
/// to `root`; an excluded directory is not descended into.
///
/// # Errors
///
/// Returns `GitOpsError::Io` when a directory cannot be listed or a file
/// cannot be read.
pub fn read_directory<F>(root: &Utf8Path, exclude: F) -> Result<Vec<SourceFile>, GitOpsError>
where
    F: Fn(&Utf8Path) -> bool,
{
    walk(open_dir(root)?, root, &exclude)
}

/// Reads `dir` beneath `workspace_root` with [`default_exclusions`].
///
/// The directory is opened through a capability handle on the workspace
/// root, so symlinks cannot lead the walk outside it.
///
/// # Errors
///
/// Returns `GitOpsError::Validation` for an unsafe `dir` and
/// `GitOpsError::Io` when reading fails.
pub fn read_within(workspace_root: &Utf8Path, dir: &str) -> Result<Vec<SourceFile>, GitOpsError> {
    let relative = relative_dir(dir)?;
    let workspace = open_dir(workspace_root)?;
    let start = workspace.open_dir(&relative).map_err(|error| GitOpsError::Io {
        message: format!("failed to open '{relative}' under '{workspace_root}': {error}"),
    })?;
    walk(start, &workspace_root.join(&relative), &default_exclusions)
}

fn relative_dir(dir: &str) -> Result<Utf8PathBuf, GitOpsError> {
    if dir.trim().is_empty() {
        return Err(GitOpsError::validation("dir is required"));
    }
    let path = Utf8Path::new(dir);
    let mut relative = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Normal(part) => relative.push(part),
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                return Err(GitOpsError::validation(format!(
                    "dir '{dir}' must not contain '..'"
                )));
            }
            Utf8Component::RootDir | Utf8Component::Prefix(_) => {
                return Err(GitOpsError::validation(format!(
                    "dir '{dir}' must be relative to the workspace"
                )));
            }
        }
    }
    if relative.as_str().is_empty() {
        relative.push(".");
    }
    Ok(relative)
}

fn walk(
    root: Dir,
    label: &Utf8Path,
    exclude: &dyn Fn(&Utf8Path) -> bool,
) -> Result<Vec<SourceFile>, GitOpsError> {
    let mut files = Vec::new();
    let mut pending = vec![(root, Utf8PathBuf::new())];

    while let Some((dir, prefix)) = pending.pop() {
        let entries = dir.entries().map_err(|error| GitOpsError::Io {
            message: format!("failed to list '{}': {error}", label.join(&prefix)),
        })?;
        for entry_result in entries {
            let entry = entry_result.map_err(|error| GitOpsError::Io {
                message: format!("failed to read entry in '{}': {error}", label.join(&prefix)),
            })?;
            let name = entry.file_name().map_err(|error| GitOpsError::Io {
                message: format!("non-UTF-8 entry in '{}': {error}", label.join(&prefix)),
            })?;
            let relative = prefix.join(&name);
            if exclude(&relative) {
                continue;
            }

            let file_type = entry.file_type().map_err(|error| GitOpsError::Io {
                message: format!("failed to stat '{}': {error}", label.join(&relative)),
            })?;
            if file_type.is_dir() {
                let child = entry.open_dir().map_err(|error| GitOpsError::Io {
                    message: format!("failed to open '{}': {error}", label.join(&relative)),
                })?;
                pending.push((child, relative));
            } else if file_type.is_file() {
                let content = dir.read(&name).map_err(|error| GitOpsError::Io {
                    message: format!("failed to read '{}': {error}", label.join(&relative)),
                })?;
                files.push(SourceFile::new(repository_path(&relative), content));
            }
        }
    }

    files.sort_by(|left, right| left.path.cmp(&right.path));
    Ok(files)
}

fn repository_path(relative: &Utf8Path) -> String {
    relative
        .components()
        .map(|component| component.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn open_dir(path: &Utf8Path) -> Result<Dir, GitOpsError> {
    Dir::open_ambient_dir(path, ambient_authority()).map_err(|error| GitOpsError::Io {
        message: format!("failed to open directory '{path}': {error}"),
    })
}
