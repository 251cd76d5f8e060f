//! Branch orchestration on top of [`GitHostGateway`](crate::github::GitHostGateway).
//!
//! Every operation here is idempotent by retry. The remote host's refusal to
//! create a ref twice and its content-hash preconditions are the only
//! concurrency control; nothing is cached between calls.

pub mod bootstrap;
pub mod branch;
pub mod contents;
pub mod project;
pub mod publish;

pub use bootstrap::{BootstrapFileSource, ProjectBootstrapper, ProjectBranches};
pub use branch::{BranchOutcome, ensure_branch};
pub use contents::{UpsertOutcome, upsert_file};
pub use project::ProjectName;
pub use publish::{
    FeatureBranchPublisher, FeatureRequest, PublishOutcome, feature_id, sanitize_feature_name,
};
