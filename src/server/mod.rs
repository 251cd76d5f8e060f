//! HTTP surface over the orchestration engine.
//!
//! | Route | Behaviour |
//! |---|---|
//! | `GET /ping` | health and queue occupancy, never authenticated |
//! | `POST /projects/{project}/bootstrap` | ensure the project's branches, wait for the result |
//! | `POST /push/sync` | publish a directory, wait for the result |
//! | `POST /push` | publish a directory in the background; `202` or `503` |
//!
//! When an API key is configured every route except `/ping` requires
//! `Authorization: Bearer {key}`.

mod error;
mod handlers;

#[cfg(test)]
mod tests;

use std::future;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use camino::Utf8PathBuf;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::github::error::GitOpsError;
use crate::github::gateway::GitHostGateway;
use crate::gitops::BootstrapFileSource;
use crate::queue::TaskQueue;

pub use error::ApiError;
pub use handlers::{PingResponse, PushRequest, QueuedResponse};

/// Everything the handlers share.
pub struct AppState {
    /// Hosting API access.
    pub gateway: Arc<dyn GitHostGateway>,
    /// Automation files committed on bootstrap.
    pub templates: Arc<dyn BootstrapFileSource>,
    /// Bounds outbound work.
    pub queue: TaskQueue,
    /// Root every request `dir` must resolve under.
    pub workspace_root: Utf8PathBuf,
    /// Required bearer key, when set.
    pub api_key: Option<String>,
}

/// Handler state.
pub type SharedState = Arc<AppState>;

/// Builds the router with request tracing and optional bearer-key checks.
pub fn build_router(state: SharedState) -> Router {
    let protected = Router::new()
        .route("/projects/{project}/bootstrap", post(handlers::bootstrap))
        .route("/push/sync", post(handlers::push_sync))
        .route("/push", post(handlers::push))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_api_key,
        ));

    Router::new()
        .route("/ping", get(handlers::ping))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `state` on `listener` until Ctrl-C.
///
/// # Errors
///
/// Returns [`GitOpsError::Io`] when the server fails.
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<(), GitOpsError> {
    if let Ok(address) = listener.local_addr() {
        tracing::info!(%address, "pushgate listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|error| GitOpsError::Io {
            message: format!("server error: {error}"),
        })
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "failed to install Ctrl-C handler");
        future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn require_api_key(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = &state.api_key {
        let provided = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        if provided != Some(expected.as_str()) {
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}
