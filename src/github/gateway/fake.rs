//! In-memory hosting gateway for tests.
//!
//! Models refs, blobs, trees, commits, file contents, and pull requests with
//! the host's status semantics: absent refs and files are `NotFound`,
//! duplicate ref creation and stale write preconditions are `Conflict`. Each
//! call yields to the scheduler first so concurrent callers interleave the
//! way they do against a real host.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::github::error::GitOpsError;
use crate::github::models::{
    ContentFile, FileWrite, GitRef, NewCommit, NewPullRequest, NewTree, PullRequest,
};

use super::GitHostGateway;

/// Number of calls made to each gateway operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FakeCalls {
    /// `get_branch` calls.
    pub get_branch: usize,
    /// `create_branch` calls, including rejected ones.
    pub create_branch: usize,
    /// `create_blob` calls.
    pub create_blob: usize,
    /// `create_tree` calls.
    pub create_tree: usize,
    /// `create_commit` calls.
    pub create_commit: usize,
    /// `get_file` calls.
    pub get_file: usize,
    /// `put_file` calls, including rejected ones.
    pub put_file: usize,
    /// `find_open_pull` calls.
    pub find_open_pull: usize,
    /// `create_pull` calls.
    pub create_pull: usize,
    /// `add_labels` calls.
    pub add_labels: usize,
}

#[derive(Debug, Clone)]
struct FakeCommit {
    tree: String,
    parents: Vec<String>,
}

#[derive(Debug, Clone)]
struct FakePull {
    number: u64,
    head: String,
    base: String,
    labels: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: u64,
    refs: BTreeMap<String, String>,
    blobs: HashMap<String, Vec<u8>>,
    trees: HashMap<String, BTreeMap<String, String>>,
    commits: HashMap<String, FakeCommit>,
    pulls: Vec<FakePull>,
    calls: FakeCalls,
    fail_labels: bool,
}

impl FakeState {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:06}", self.next_id)
    }

    fn tree_of_branch(&self, branch: &str) -> Option<&BTreeMap<String, String>> {
        let commit_sha = self.refs.get(branch)?;
        let commit = self.commits.get(commit_sha)?;
        self.trees.get(&commit.tree)
    }

    fn commit_files(&mut self, parent: Option<String>, files: BTreeMap<String, String>) -> String {
        let tree_sha = self.next("tree");
        self.trees.insert(tree_sha.clone(), files);
        let commit_sha = self.next("commit");
        self.commits.insert(
            commit_sha.clone(),
            FakeCommit {
                tree: tree_sha,
                parents: parent.into_iter().collect(),
            },
        );
        commit_sha
    }
}

fn not_found(operation: &str, message: impl Into<String>) -> GitOpsError {
    GitOpsError::NotFound {
        operation: operation.to_owned(),
        message: message.into(),
    }
}

fn conflict(operation: &str, status: u16, message: impl Into<String>) -> GitOpsError {
    GitOpsError::Conflict {
        operation: operation.to_owned(),
        status,
        message: message.into(),
    }
}

/// Stateful in-memory stand-in for a hosted repository.
#[derive(Debug, Default)]
pub struct FakeGitHost {
    owner: String,
    state: Mutex<FakeState>,
}

impl FakeGitHost {
    /// Creates an empty repository owned by `owner`.
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: Mutex::new(FakeState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds `branch` with a root commit containing `files`.
    pub fn seed_branch(&self, branch: &str, files: &[(&str, &str)]) {
        let mut state = self.lock();
        let mut tree = BTreeMap::new();
        for (path, content) in files {
            let blob_sha = state.next("blob");
            state.blobs.insert(blob_sha.clone(), content.as_bytes().to_vec());
            tree.insert((*path).to_owned(), blob_sha);
        }
        let commit = state.commit_files(None, tree);
        state.refs.insert(branch.to_owned(), commit);
    }

    /// Makes every subsequent `add_labels` call fail with a server error.
    pub fn fail_labels(&self) {
        self.lock().fail_labels = true;
    }

    /// Snapshot of per-operation call counts.
    #[must_use]
    pub fn calls(&self) -> FakeCalls {
        self.lock().calls
    }

    /// Names of all branches, sorted.
    #[must_use]
    pub fn branches(&self) -> Vec<String> {
        self.lock().refs.keys().cloned().collect()
    }

    /// Commit SHA at the tip of `branch`.
    #[must_use]
    pub fn branch_sha(&self, branch: &str) -> Option<String> {
        self.lock().refs.get(branch).cloned()
    }

    /// Parents of the commit at the tip of `branch`.
    #[must_use]
    pub fn tip_parents(&self, branch: &str) -> Option<Vec<String>> {
        let state = self.lock();
        let sha = state.refs.get(branch)?;
        state.commits.get(sha).map(|commit| commit.parents.clone())
    }

    /// Tree SHA recorded by the commit at the tip of `branch`.
    #[must_use]
    pub fn tip_tree(&self, branch: &str) -> Option<String> {
        let state = self.lock();
        let sha = state.refs.get(branch)?;
        state.commits.get(sha).map(|commit| commit.tree.clone())
    }

    /// Paths present on `branch`, sorted.
    #[must_use]
    pub fn paths(&self, branch: &str) -> Vec<String> {
        self.lock()
            .tree_of_branch(branch)
            .map(|tree| tree.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Content of `path` on `branch`.
    #[must_use]
    pub fn file(&self, branch: &str, path: &str) -> Option<Vec<u8>> {
        let state = self.lock();
        let blob_sha = state.tree_of_branch(branch)?.get(path)?;
        state.blobs.get(blob_sha).cloned()
    }

    /// Numbers of pull requests whose head is `head`.
    #[must_use]
    pub fn pulls_for(&self, head: &str) -> Vec<u64> {
        self.lock()
            .pulls
            .iter()
            .filter(|pull| pull.head == head)
            .map(|pull| pull.number)
            .collect()
    }

    /// Labels attached to pull request `number`.
    #[must_use]
    pub fn labels(&self, number: u64) -> Vec<String> {
        self.lock()
            .pulls
            .iter()
            .find(|pull| pull.number == number)
            .map(|pull| pull.labels.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GitHostGateway for FakeGitHost {
    async fn get_branch(&self, branch: &str) -> Result<GitRef, GitOpsError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.get_branch += 1;
        state
            .refs
            .get(branch)
            .map(|sha| GitRef {
                branch: branch.to_owned(),
                sha: sha.clone(),
            })
            .ok_or_else(|| not_found("get ref", format!("{branch} not found")))
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<GitRef, GitOpsError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.create_branch += 1;
        if state.refs.contains_key(branch) {
            return Err(conflict("create ref", 422, "Reference already exists"));
        }
        if !state.commits.contains_key(sha) {
            return Err(conflict("create ref", 422, "Object does not exist"));
        }
        state.refs.insert(branch.to_owned(), sha.to_owned());
        Ok(GitRef {
            branch: branch.to_owned(),
            sha: sha.to_owned(),
        })
    }

    async fn create_blob(&self, content: &[u8]) -> Result<String, GitOpsError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.create_blob += 1;
        let sha = state.next("blob");
        state.blobs.insert(sha.clone(), content.to_vec());
        Ok(sha)
    }

    async fn create_tree(&self, tree: &NewTree) -> Result<String, GitOpsError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.create_tree += 1;
        let mut entries = match &tree.base_tree {
            Some(base) => state
                .trees
                .get(base)
                .cloned()
                .ok_or_else(|| conflict("create tree", 422, "base_tree does not exist"))?,
            None => BTreeMap::new(),
        };
        for entry in &tree.tree {
            if !state.blobs.contains_key(&entry.sha) {
                return Err(conflict("create tree", 422, "blob does not exist"));
            }
            entries.insert(entry.path.clone(), entry.sha.clone());
        }
        let sha = state.next("tree");
        state.trees.insert(sha.clone(), entries);
        Ok(sha)
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<String, GitOpsError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.create_commit += 1;
        if !state.trees.contains_key(&commit.tree) {
            return Err(conflict("create commit", 422, "tree does not exist"));
        }
        let sha = state.next("commit");
        state.commits.insert(
            sha.clone(),
            FakeCommit {
                tree: commit.tree.clone(),
                parents: commit.parents.clone(),
            },
        );
        Ok(sha)
    }

    async fn get_file(&self, path: &str, branch: &str) -> Result<ContentFile, GitOpsError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.get_file += 1;
        let blob_sha = state
            .tree_of_branch(branch)
            .and_then(|tree| tree.get(path))
            .cloned()
            .ok_or_else(|| not_found("get contents", format!("{path} not found on {branch}")))?;
        let content = state.blobs.get(&blob_sha).cloned().unwrap_or_default();
        Ok(ContentFile {
            sha: blob_sha,
            content: Some(content),
        })
    }

    async fn put_file(&self, write: &FileWrite) -> Result<(), GitOpsError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.put_file += 1;
        let parent = state
            .refs
            .get(&write.branch)
            .cloned()
            .ok_or_else(|| not_found("put contents", format!("{} not found", write.branch)))?;
        let mut tree = state.tree_of_branch(&write.branch).cloned().unwrap_or_default();
        match (tree.get(&write.path), write.expected_sha.as_deref()) {
            (Some(current), Some(expected)) if current != expected => {
                return Err(conflict(
                    "put contents",
                    409,
                    format!("{} does not match {expected}", write.path),
                ));
            }
            (Some(_), None) => {
                return Err(conflict("put contents", 422, "\"sha\" wasn't supplied"));
            }
            (None, Some(_)) => {
                return Err(not_found("put contents", format!("{} not found", write.path)));
            }
            _ => {}
        }
        let blob_sha = state.next("blob");
        state.blobs.insert(blob_sha.clone(), write.content.clone());
        tree.insert(write.path.clone(), blob_sha);
        let commit = state.commit_files(Some(parent), tree);
        state.refs.insert(write.branch.clone(), commit);
        Ok(())
    }

    async fn find_open_pull(
        &self,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequest>, GitOpsError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.find_open_pull += 1;
        Ok(state
            .pulls
            .iter()
            .find(|pull| pull.head == head && pull.base == base)
            .map(|pull| PullRequest {
                number: pull.number,
                html_url: Some(format!("https://github.test/{}/pull/{}", self.owner, pull.number)),
            }))
    }

    async fn create_pull(&self, pull: &NewPullRequest) -> Result<PullRequest, GitOpsError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.create_pull += 1;
        if !state.refs.contains_key(&pull.head) || !state.refs.contains_key(&pull.base) {
            return Err(conflict("create pull", 422, "head or base does not exist"));
        }
        if state
            .pulls
            .iter()
            .any(|existing| existing.head == pull.head && existing.base == pull.base)
        {
            return Err(conflict("create pull", 422, "A pull request already exists"));
        }
        let number = u64::try_from(state.pulls.len()).unwrap_or(u64::MAX).saturating_add(1);
        state.pulls.push(FakePull {
            number,
            head: pull.head.clone(),
            base: pull.base.clone(),
            labels: Vec::new(),
        });
        Ok(PullRequest {
            number,
            html_url: Some(format!("https://github.test/{}/pull/{number}", self.owner)),
        })
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GitOpsError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.add_labels += 1;
        if state.fail_labels {
            return Err(GitOpsError::Upstream {
                operation: "add labels".to_owned(),
                status: 500,
                message: "labels unavailable".to_owned(),
            });
        }
        let pull = state
            .pulls
            .iter_mut()
            .find(|pull| pull.number == number)
            .ok_or_else(|| not_found("add labels", format!("issue {number} not found")))?;
        for label in labels {
            if !pull.labels.contains(label) {
                pull.labels.push(label.clone());
            }
        }
        Ok(())
    }
}
