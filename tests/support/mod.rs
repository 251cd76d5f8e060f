//! Shared test utilities.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

pub mod runtime;

/// Creates a temporary workspace root.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created or its path is not
/// UTF-8.
pub fn create_workspace() -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new()
        .unwrap_or_else(|error| panic!("failed to create temporary directory: {error}"));
    let root = Utf8Path::from_path(dir.path())
        .unwrap_or_else(|| panic!("temporary directory path is not UTF-8"))
        .to_owned();
    (dir, root)
}

/// Writes `count` small source files under `root/dir`.
///
/// # Errors
///
/// Returns an error when a directory or file cannot be written.
pub fn write_feature_files(root: &Utf8Path, dir: &str, count: u64) -> std::io::Result<()> {
    let target = root.join(dir);
    fs::create_dir_all(&target)?;
    for index in 1..=count {
        fs::write(
            target.join(format!("module_{index}.rs")),
            format!("pub fn feature_{index}() {{}}\n"),
        )?;
    }
    Ok(())
}
