//! Pushgate service entrypoint.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::OrthoConfig;
use pushgate::{
    AppState, GitOpsError, OctocrabGitHost, PersonalAccessToken, PushgateConfig,
    RepositoryLocator, TaskQueue, TemplateDirectory, init_tracing, serve,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), GitOpsError> {
    let config = load_config()?;
    init_tracing(config.log_format()?)?;

    let (owner, repo) = config.require_repository_info()?;
    let token = PersonalAccessToken::new(config.resolve_token()?)?;
    let locator = RepositoryLocator::new(&config.api_url, owner, repo)?;
    let gateway = OctocrabGitHost::for_token(&token, locator, config.github_timeout()?)?;

    let (concurrency, max_depth) = config.queue_limits()?;
    let state = Arc::new(AppState {
        gateway: Arc::new(gateway),
        templates: Arc::new(TemplateDirectory::new(
            config.templates_dir(),
            config.review_agent_dir(),
        )),
        queue: TaskQueue::new(concurrency, max_depth)?,
        workspace_root: config.workspace_root(),
        api_key: config.api_key.clone(),
    });

    let address = config.bind_address()?;
    let listener = TcpListener::bind(address)
        .await
        .map_err(|error| GitOpsError::Io {
            message: format!("failed to bind {address}: {error}"),
        })?;
    serve(listener, state).await
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`GitOpsError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<PushgateConfig, GitOpsError> {
    PushgateConfig::load().map_err(|error| GitOpsError::Configuration {
        message: error.to_string(),
    })
}
