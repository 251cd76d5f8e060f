//! Pushgate library crate: git-branch orchestration over a hosting API.
//!
//! The service keeps one remote repository organised per project. Each
//! project owns an isolated `{project}-master` branch seeded with automation
//! files and a `{project}-dev` branch cut from it. Local directories are
//! published onto `feat/{id}` branches with one reconciled pull request into
//! the project's dev branch. All outbound work flows through a bounded
//! [`TaskQueue`].

pub mod config;
pub mod github;
pub mod gitops;
pub mod local;
pub mod queue;
pub mod server;
pub mod telemetry;

pub use config::PushgateConfig;
pub use github::{
    ErrorKind, GitHostGateway, GitOpsError, OctocrabGitHost, PersonalAccessToken,
    RepositoryLocator, SourceFile,
};
pub use gitops::{
    BootstrapFileSource, FeatureBranchPublisher, FeatureRequest, ProjectBootstrapper,
    ProjectBranches, ProjectName, PublishOutcome,
};
pub use local::{StaticFileSet, TemplateDirectory};
pub use queue::{QueueStats, TaskHandle, TaskQueue};
pub use server::{AppState, SharedState, build_router, serve};
pub use telemetry::{LogFormat, init_tracing};
