//! End-to-end project bootstrap against a mocked hosting API.

use std::time::Duration;

use pushgate::{
    OctocrabGitHost, PersonalAccessToken, ProjectBootstrapper, RepositoryLocator, SourceFile,
    StaticFileSet,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO: &str = "/repos/owner/repo";

fn gateway_for(server: &MockServer) -> OctocrabGitHost {
    let locator =
        RepositoryLocator::new(&server.uri(), "owner", "repo").expect("should create locator");
    let token = PersonalAccessToken::new("valid-token").expect("token should be valid");
    OctocrabGitHost::for_token(&token, locator, Duration::from_secs(5))
        .expect("should create gateway")
}

fn automation_files() -> StaticFileSet {
    StaticFileSet::new(vec![SourceFile::new(".github/workflows/ci.yml", "on: push\n")])
}

fn ref_body(branch: &str, sha: &str) -> serde_json::Value {
    json!({
        "ref": format!("refs/heads/{branch}"),
        "object": { "sha": sha, "type": "commit" }
    })
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" }))
}

#[tokio::test]
async fn new_project_gets_a_root_commit_and_dev_branch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/git/ref/heads/proj-a-master")))
        .respond_with(not_found())
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/git/ref/heads/proj-a-master")))
        .respond_with(ResponseTemplate::new(200).set_body_json(ref_body("proj-a-master", "c1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/git/ref/heads/proj-a-dev")))
        .respond_with(not_found())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/git/blobs")))
        .and(body_partial_json(json!({ "content": "b246IHB1c2gK", "encoding": "base64" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "b1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/git/trees")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "t1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/git/commits")))
        .and(body_partial_json(json!({ "tree": "t1", "parents": [] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "c1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/git/refs")))
        .and(body_partial_json(json!({ "ref": "refs/heads/proj-a-master", "sha": "c1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(ref_body("proj-a-master", "c1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/git/refs")))
        .and(body_partial_json(json!({ "ref": "refs/heads/proj-a-dev", "sha": "c1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(ref_body("proj-a-dev", "c1")))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let files = automation_files();
    let branches = ProjectBootstrapper::new(&gateway, &files)
        .ensure_project("proj-a")
        .await
        .expect("bootstrap should succeed");

    assert_eq!(branches.master_branch, "proj-a-master");
    assert_eq!(branches.dev_branch, "proj-a-dev");
    assert!(branches.created);
    assert_eq!(branches.files_written, 0);
}

#[tokio::test]
async fn existing_project_with_current_files_is_read_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/git/ref/heads/proj-a-master")))
        .respond_with(ResponseTemplate::new(200).set_body_json(ref_body("proj-a-master", "c1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/git/ref/heads/proj-a-dev")))
        .respond_with(ResponseTemplate::new(200).set_body_json(ref_body("proj-a-dev", "c2")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/contents/.github/workflows/ci.yml")))
        .and(query_param("ref", "proj-a-master"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "sha": "b1",
            "encoding": "base64",
            "content": "b246IHB1c2gK\n"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let files = automation_files();
    let branches = ProjectBootstrapper::new(&gateway, &files)
        .ensure_project("proj-a")
        .await
        .expect("bootstrap should succeed");

    assert!(!branches.created);
    assert_eq!(branches.files_written, 0);
}
