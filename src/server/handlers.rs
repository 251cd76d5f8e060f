//! Route handlers.
//!
//! Bootstrap and publish work always runs through the shared [`TaskQueue`],
//! so the HTTP surface never exceeds the configured outbound concurrency.
//!
//! [`TaskQueue`]: crate::queue::TaskQueue

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::github::error::GitOpsError;
use crate::gitops::{
    BootstrapFileSource, FeatureBranchPublisher, FeatureRequest, ProjectBootstrapper,
    ProjectBranches, ProjectName, PublishOutcome,
};
use crate::local::{StaticFileSet, read_within};
use crate::queue::QueueStats;

use super::SharedState;
use super::error::ApiError;

/// Body of `POST /push` and `POST /push/sync`.
#[derive(Debug, Clone, Deserialize)]
pub struct PushRequest {
    /// Target project.
    pub project: String,
    /// Directory under the workspace root holding the files to publish.
    pub dir: String,
    /// Pull request description.
    #[serde(default)]
    pub description: Option<String>,
    /// Feature name; a random id is used when absent.
    #[serde(default)]
    pub feat_name: Option<String>,
    /// Extra pull request labels.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Tag naming the system that produced the push.
    #[serde(default)]
    pub source: Option<String>,
}

/// Body of `GET /ping`.
#[derive(Debug, Clone, Serialize)]
pub struct PingResponse {
    /// Always `ok`.
    pub status: &'static str,
    /// Queue occupancy at the time of the request.
    pub queue: QueueStats,
}

/// Body of an accepted `POST /push`.
#[derive(Debug, Clone, Serialize)]
pub struct QueuedResponse {
    /// Always `queued`.
    pub status: &'static str,
    /// Project the push was queued for.
    pub project: String,
}

pub(super) async fn ping(State(state): State<SharedState>) -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        queue: state.queue.stats(),
    })
}

pub(super) async fn bootstrap(
    State(state): State<SharedState>,
    Path(project): Path<String>,
) -> Result<Json<ProjectBranches>, ApiError> {
    ProjectName::parse(&project)?;
    let gateway = Arc::clone(&state.gateway);
    let templates = Arc::clone(&state.templates);
    let branches = state
        .queue
        .enqueue(async move {
            let files = load_templates(templates, &project).await?;
            ProjectBootstrapper::new(gateway.as_ref(), &files)
                .ensure_project(&project)
                .await
        })
        .await?;
    Ok(Json(branches))
}

pub(super) async fn push_sync(
    State(state): State<SharedState>,
    payload: Result<Json<PushRequest>, JsonRejection>,
) -> Result<Json<PublishOutcome>, ApiError> {
    let request = feature_request(&state, payload).await?;
    let gateway = Arc::clone(&state.gateway);
    let templates = Arc::clone(&state.templates);
    let outcome = state
        .queue
        .enqueue(async move {
            let files = load_templates(templates, &request.project).await?;
            FeatureBranchPublisher::new(gateway.as_ref(), &files)
                .create_feat_branch(&request)
                .await
        })
        .await?;
    Ok(Json(outcome))
}

pub(super) async fn push(
    State(state): State<SharedState>,
    payload: Result<Json<PushRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QueuedResponse>), ApiError> {
    let request = feature_request(&state, payload).await?;
    let project = request.project.clone();
    let gateway = Arc::clone(&state.gateway);
    let templates = Arc::clone(&state.templates);
    let handle = state.queue.submit(async move {
        let files = load_templates(templates, &request.project).await?;
        let outcome = FeatureBranchPublisher::new(gateway.as_ref(), &files)
            .create_feat_branch(&request)
            .await?;
        tracing::info!(
            branch = %outcome.branch,
            pr_number = outcome.pr_number,
            "queued publish finished"
        );
        Ok(outcome)
    })?;
    drop(handle);

    Ok((
        StatusCode::ACCEPTED,
        Json(QueuedResponse {
            status: "queued",
            project,
        }),
    ))
}

/// Assembles the project's automation files on the blocking pool.
async fn load_templates(
    templates: Arc<dyn BootstrapFileSource>,
    project: &str,
) -> Result<StaticFileSet, GitOpsError> {
    let name = ProjectName::parse(project)?;
    let files = tokio::task::spawn_blocking(move || templates.files(&name))
        .await
        .map_err(|error| GitOpsError::TaskAborted {
            message: format!("template read did not complete: {error}"),
        })??;
    Ok(StaticFileSet::new(files))
}

/// Validates the body and reads the referenced directory.
async fn feature_request(
    state: &SharedState,
    payload: Result<Json<PushRequest>, JsonRejection>,
) -> Result<FeatureRequest, GitOpsError> {
    let Json(body) = payload.map_err(|rejection| GitOpsError::validation(rejection.body_text()))?;
    ProjectName::parse(&body.project)?;

    let workspace_root = state.workspace_root.clone();
    let dir = body.dir.clone();
    let files = tokio::task::spawn_blocking(move || read_within(&workspace_root, &dir))
        .await
        .map_err(|error| GitOpsError::TaskAborted {
            message: format!("directory read did not complete: {error}"),
        })??;
    if files.is_empty() {
        return Err(GitOpsError::validation(format!(
            "dir '{}' contains no files",
            body.dir
        )));
    }

    Ok(FeatureRequest {
        project: body.project,
        directory: body.dir,
        files,
        feat_name: body.feat_name,
        description: body.description,
        labels: body.labels,
        source: body.source,
    })
}
