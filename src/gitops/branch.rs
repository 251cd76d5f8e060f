//! Idempotent branch existence.

use crate::github::error::GitOpsError;
use crate::github::gateway::GitHostGateway;

/// Whether [`ensure_branch`] found the branch or created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchOutcome {
    /// The branch was already present.
    Existing,
    /// This call created the branch.
    Created,
    /// A concurrent caller created the branch between our read and create.
    CreatedConcurrently,
}

/// Guarantees `branch` exists, forking it from the tip of `source` when
/// absent.
///
/// Racing callers are safe: the host accepts exactly one creation and the
/// others observe a conflict, which counts as success.
///
/// # Errors
///
/// Propagates any gateway failure other than "branch absent" on the initial
/// read and "already exists" on creation; fails with `NotFound` when
/// `source` itself is missing.
pub async fn ensure_branch<G>(
    gateway: &G,
    branch: &str,
    source: &str,
) -> Result<BranchOutcome, GitOpsError>
where
    G: GitHostGateway + ?Sized,
{
    match gateway.get_branch(branch).await {
        Ok(_) => return Ok(BranchOutcome::Existing),
        Err(error) if error.is_not_found() => {}
        Err(error) => return Err(error),
    }

    let source_ref = gateway.get_branch(source).await?;
    match gateway.create_branch(branch, &source_ref.sha).await {
        Ok(_) => {
            tracing::info!(branch, source, sha = %source_ref.sha, "created branch");
            Ok(BranchOutcome::Created)
        }
        Err(error) if error.is_conflict() => {
            tracing::debug!(branch, "branch created concurrently");
            Ok(BranchOutcome::CreatedConcurrently)
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::predicate::function;
    use tokio::task::JoinSet;

    use super::{BranchOutcome, ensure_branch};
    use crate::github::error::GitOpsError;
    use crate::github::gateway::{FakeGitHost, MockGitHostGateway};
    use crate::github::models::GitRef;

    fn seeded_host() -> FakeGitHost {
        let host = FakeGitHost::new("owner");
        host.seed_branch("proj-master", &[("ci.yml", "on: push")]);
        host
    }

    #[tokio::test]
    async fn existing_branch_is_left_alone() {
        let host = seeded_host();
        let outcome = ensure_branch(&host, "proj-master", "main")
            .await
            .expect("existing branch should resolve");

        assert_eq!(outcome, BranchOutcome::Existing);
        assert_eq!(host.calls().create_branch, 0);
    }

    #[tokio::test]
    async fn absent_branch_forks_from_source_tip() {
        let host = seeded_host();
        let outcome = ensure_branch(&host, "proj-dev", "proj-master")
            .await
            .expect("branch should be created");

        assert_eq!(outcome, BranchOutcome::Created);
        assert_eq!(host.branch_sha("proj-dev"), host.branch_sha("proj-master"));
    }

    #[tokio::test]
    async fn missing_source_propagates_not_found() {
        let host = FakeGitHost::new("owner");
        let error = ensure_branch(&host, "proj-dev", "proj-master")
            .await
            .expect_err("missing source should fail");

        assert!(error.is_not_found(), "expected NotFound, got {error:?}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_create_exactly_one_branch() {
        let host = Arc::new(seeded_host());
        let mut tasks = JoinSet::new();
        for _ in 0..8 {
            let shared = Arc::clone(&host);
            tasks.spawn(async move { ensure_branch(shared.as_ref(), "proj-dev", "proj-master").await });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(
                joined
                    .expect("task should not panic")
                    .expect("every caller should succeed"),
            );
        }

        let created = outcomes
            .iter()
            .filter(|outcome| **outcome == BranchOutcome::Created)
            .count();
        assert_eq!(created, 1, "exactly one caller should create the branch");
        assert_eq!(
            host.branches(),
            vec!["proj-dev".to_owned(), "proj-master".to_owned()]
        );
    }

    #[tokio::test]
    async fn other_create_failures_propagate() {
        let mut gateway = MockGitHostGateway::new();
        gateway
            .expect_get_branch()
            .with(function(|branch: &str| branch == "proj-dev"))
            .times(1)
            .returning(|_| {
                Err(GitOpsError::NotFound {
                    operation: "get ref".to_owned(),
                    message: String::new(),
                })
            });
        gateway
            .expect_get_branch()
            .with(function(|branch: &str| branch == "proj-master"))
            .times(1)
            .returning(|_| {
                Ok(GitRef {
                    branch: "proj-master".to_owned(),
                    sha: "abc".to_owned(),
                })
            });
        gateway.expect_create_branch().times(1).returning(|_, _| {
            Err(GitOpsError::Upstream {
                operation: "create ref".to_owned(),
                status: 500,
                message: "boom".to_owned(),
            })
        });

        let error = ensure_branch(&gateway, "proj-dev", "proj-master")
            .await
            .expect_err("server error should propagate");

        assert_eq!(error.remote_status(), Some(500));
    }
}
