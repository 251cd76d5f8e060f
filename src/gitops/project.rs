//! Project identifiers and the branch names derived from them.

use std::fmt;

use crate::github::error::GitOpsError;

/// Validated project identifier matching `[A-Za-z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectName(String);

impl ProjectName {
    /// Validates a project identifier.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::Validation` when the value is empty or contains
    /// characters outside `[A-Za-z0-9_-]`.
    ///
    /// # Example
    ///
    /// ```
    /// use pushgate::gitops::ProjectName;
    ///
    /// let project = ProjectName::parse("proj-a").expect("valid project");
    /// assert_eq!(project.master_branch(), "proj-a-master");
    /// assert_eq!(project.dev_branch(), "proj-a-dev");
    /// assert!(ProjectName::parse("../etc").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, GitOpsError> {
        if value.is_empty() {
            return Err(GitOpsError::validation("project is required"));
        }
        let valid = value
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '_' | '-'));
        if !valid {
            return Err(GitOpsError::validation(format!(
                "project '{value}' must match [A-Za-z0-9_-]+"
            )));
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the identifier.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Isolated root branch carrying the automation files.
    #[must_use]
    pub fn master_branch(&self) -> String {
        format!("{}-master", self.0)
    }

    /// Integration branch forked from the master branch.
    #[must_use]
    pub fn dev_branch(&self) -> String {
        format!("{}-dev", self.0)
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
