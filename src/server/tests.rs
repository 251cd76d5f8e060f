//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use camino::Utf8PathBuf;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tower::ServiceExt;

use super::{AppState, build_router};
use crate::github::error::GitOpsError;
use crate::github::gateway::{FakeGitHost, GitHostGateway};
use crate::github::models::SourceFile;
use crate::gitops::{BootstrapFileSource, ProjectName};
use crate::local::StaticFileSet;
use crate::queue::TaskQueue;

struct Harness {
    _workspace: TempDir,
    host: Arc<FakeGitHost>,
    queue: TaskQueue,
    router: Router,
}

fn automation_files() -> Arc<dyn BootstrapFileSource> {
    Arc::new(StaticFileSet::new(vec![SourceFile::new(
        ".github/workflows/ci.yml",
        "on: push\n",
    )]))
}

/// Records the thread each template read runs on.
#[derive(Default)]
struct ThreadRecordingFiles {
    threads: Mutex<Vec<ThreadId>>,
}

impl ThreadRecordingFiles {
    fn threads(&self) -> Vec<ThreadId> {
        self.threads.lock().expect("thread log lock").clone()
    }
}

impl BootstrapFileSource for ThreadRecordingFiles {
    fn files(&self, _project: &ProjectName) -> Result<Vec<SourceFile>, GitOpsError> {
        self.threads
            .lock()
            .expect("thread log lock")
            .push(thread::current().id());
        Ok(vec![SourceFile::new(".github/workflows/ci.yml", "on: push\n")])
    }
}

fn harness(queue: TaskQueue, api_key: Option<&str>) -> Harness {
    harness_with_templates(queue, api_key, automation_files())
}

fn harness_with_templates(
    queue: TaskQueue,
    api_key: Option<&str>,
    templates: Arc<dyn BootstrapFileSource>,
) -> Harness {
    let workspace = TempDir::new().expect("temporary directory");
    let root = Utf8PathBuf::from_path_buf(workspace.path().to_path_buf())
        .expect("temporary directory path must be UTF-8");
    std::fs::create_dir_all(root.join("work/auth")).expect("create feature directory");
    std::fs::write(root.join("work/auth/login.rs"), "pub fn login() {}\n").expect("write file");
    std::fs::create_dir_all(root.join("work/empty")).expect("create empty directory");

    let host = Arc::new(FakeGitHost::new("owner"));
    let gateway: Arc<dyn GitHostGateway> = host.clone();
    let state = Arc::new(AppState {
        gateway,
        templates,
        queue: queue.clone(),
        workspace_root: root,
        api_key: api_key.map(str::to_owned),
    });

    Harness {
        _workspace: workspace,
        host,
        queue,
        router: build_router(state),
    }
}

fn default_harness() -> Harness {
    harness(TaskQueue::new(2, 10).expect("valid queue"), None)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn push_body(dir: &str) -> Value {
    json!({
        "project": "proj-a",
        "dir": dir,
        "feat_name": "Add Auth",
        "description": "Adds login",
        "labels": ["team-auth"],
        "source": "builder"
    })
}

#[tokio::test]
async fn ping_reports_queue_stats_without_auth() {
    let harness = harness(TaskQueue::new(3, 7).expect("valid queue"), Some("secret"));
    let request = Request::builder()
        .uri("/ping")
        .body(Body::empty())
        .expect("request should build");

    let (status, body) = send(&harness.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "ok", "queue": {"active": 0, "queued": 0, "concurrency": 3}})
    );
}

#[tokio::test]
async fn bootstrap_route_returns_branch_names() {
    let harness = default_harness();

    let (status, body) = send(
        &harness.router,
        post_json("/projects/proj-a/bootstrap", &Value::Null),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["master_branch"], "proj-a-master");
    assert_eq!(body["dev_branch"], "proj-a-dev");
    assert_eq!(
        harness.host.branches(),
        vec!["proj-a-dev".to_owned(), "proj-a-master".to_owned()]
    );
}

#[tokio::test]
async fn templates_are_read_off_the_async_runtime() {
    let recorder = Arc::new(ThreadRecordingFiles::default());
    let templates: Arc<dyn BootstrapFileSource> = recorder.clone();
    let harness = harness_with_templates(TaskQueue::new(2, 10).expect("valid queue"), None, templates);

    let (bootstrap, _) = send(
        &harness.router,
        post_json("/projects/proj-a/bootstrap", &Value::Null),
    )
    .await;
    let (publish, _) = send(&harness.router, post_json("/push/sync", &push_body("work/auth"))).await;

    assert_eq!(bootstrap, StatusCode::OK);
    assert_eq!(publish, StatusCode::OK);
    let runtime_thread = thread::current().id();
    let threads = recorder.threads();
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().all(|id| *id != runtime_thread));
}

#[tokio::test]
async fn invalid_project_is_a_bad_request() {
    let harness = default_harness();

    let (status, body) = send(
        &harness.router,
        post_json("/projects/proj.a/bootstrap", &Value::Null),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(harness.host.calls().get_branch, 0);
}

#[tokio::test]
async fn sync_push_returns_publish_outcome() {
    let harness = default_harness();

    let (status, body) = send(&harness.router, post_json("/push/sync", &push_body("work/auth"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feat_id"], "add-auth");
    assert_eq!(body["branch"], "feat/add-auth");
    assert_eq!(body["dev_branch"], "proj-a-dev");
    assert_eq!(body["pr_number"], 1);
    assert_eq!(
        harness.host.file("feat/add-auth", "login.rs"),
        Some(b"pub fn login() {}\n".to_vec())
    );
}

#[tokio::test]
async fn push_outside_workspace_is_rejected() {
    let harness = default_harness();

    let (status, body) = send(&harness.router, post_json("/push/sync", &push_body("../etc"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn empty_directory_is_rejected() {
    let harness = default_harness();

    let (status, _) = send(&harness.router, post_json("/push/sync", &push_body("work/empty"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(harness.host.calls().get_branch, 0);
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let harness = default_harness();

    let (status, body) = send(&harness.router, post_json("/push/sync", &json!({"dir": "x"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn api_key_guards_work_routes() {
    let harness = harness(TaskQueue::new(2, 10).expect("valid queue"), Some("secret"));

    let (anonymous, _) = send(
        &harness.router,
        post_json("/projects/proj-a/bootstrap", &Value::Null),
    )
    .await;
    let mut authorised = post_json("/projects/proj-a/bootstrap", &Value::Null);
    authorised.headers_mut().insert(
        header::AUTHORIZATION,
        "Bearer secret".parse().expect("valid header"),
    );
    let (allowed, _) = send(&harness.router, authorised).await;

    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
    assert_eq!(allowed, StatusCode::OK);
}

#[tokio::test]
async fn background_push_is_accepted_and_completes() {
    let harness = default_harness();

    let (status, body) = send(&harness.router, post_json("/push", &push_body("work/auth"))).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "queued");
    tokio::time::timeout(Duration::from_secs(5), async {
        while harness.host.pulls_for("feat/add-auth").is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("background publish should open a pull request");
}

#[tokio::test]
async fn full_queue_answers_service_unavailable() {
    let harness = harness(TaskQueue::new(1, 0).expect("valid queue"), None);
    let gate = Arc::new(Semaphore::new(0));
    let blocker_gate = Arc::clone(&gate);
    let blocker = harness
        .queue
        .submit(async move {
            blocker_gate
                .acquire()
                .await
                .map_err(|_| GitOpsError::validation("gate closed"))?
                .forget();
            Ok(())
        })
        .expect("first task occupies the only slot");

    let (status, body) = send(&harness.router, post_json("/push", &push_body("work/auth"))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "backpressure");
    gate.add_permits(1);
    blocker.outcome().await.expect("blocker finishes");
}
