//! Create-pr command - publish an update as a pull request

use crate::cli::context::StageContext;
use nix_autobump::error::Result;
use nix_autobump::forge::github::GitHubForge;
use nix_autobump::git::GitClient;
use nix_autobump::process::TokioRunner;
use nix_autobump::types::UpdateType;
use nix_autobump::workflow::{self, parse_labels};

/// Options for the create-pr stage.
pub struct CreatePrOptions {
    /// What was updated.
    pub update_type: UpdateType,
    /// Name of the package or flake input.
    pub name: String,
    /// Version before the update.
    pub current_version: String,
    /// Version after the update.
    pub new_version: String,
    /// Comma-separated labels to apply.
    pub labels: String,
    /// Enable auto-merge when exactly `"true"`.
    pub auto_merge: String,
    /// Explicit token, overriding the ambient `GITHUB_TOKEN`.
    pub token: Option<String>,
}

/// Run the pull-request lifecycle for one finished update.
pub async fn run_create_pr(options: CreatePrOptions) -> Result<()> {
    let context = StageContext::new()?;
    let token = context.require_pr_token(options.token)?;
    let slug = context.repo_slug()?;

    let git = GitClient::new(TokioRunner::new(), &context.repo_root);
    let forge = GitHubForge::new(&token, slug)?;
    let labels = parse_labels(&options.labels);
    let auto_merge = options.auto_merge == "true";

    workflow::create_pull_request(
        &git,
        &forge,
        options.update_type,
        &options.name,
        &options.current_version,
        &options.new_version,
        &labels,
        auto_merge,
        &context.outputs,
    )
    .await?;
    Ok(())
}
