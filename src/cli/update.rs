//! Update command - run one package or flake input update

use crate::cli::context::StageContext;
use nix_autobump::config::PackageRegistry;
use nix_autobump::error::Result;
use nix_autobump::flake::FlakeLock;
use nix_autobump::forge::github::GitHubReleases;
use nix_autobump::git::GitClient;
use nix_autobump::hash::HashResolver;
use nix_autobump::nix::NixTool;
use nix_autobump::npm::NpmClient;
use nix_autobump::process::TokioRunner;
use nix_autobump::record::read_version;
use nix_autobump::types::UpdateType;
use nix_autobump::update::UpdateEngine;
use nix_autobump::workflow::UpdateStage;

/// Run the update stage for one matrix entry.
///
/// `name` falls back to the working directory's name and
/// `current_version` to whatever is currently recorded, so a bare
/// `autobump update` inside a package checkout does the expected thing.
pub async fn run_update(
    update_type: UpdateType,
    name: Option<String>,
    current_version: Option<String>,
) -> Result<()> {
    let context = StageContext::new()?;
    let name = context.resolve_package_name(name)?;
    let registry = PackageRegistry::discover(&context.repo_root)?;
    let current_version = match current_version.filter(|version| !version.is_empty()) {
        Some(version) => version,
        None => recorded_version(&context, &registry, update_type, &name)?,
    };

    let nix = NixTool::new(TokioRunner::new(), &context.repo_root);
    let git = GitClient::new(TokioRunner::new(), &context.repo_root);
    let token = context.github_token();
    let releases = GitHubReleases::new(token.as_deref())?;
    let npm = NpmClient::new()?;

    let resolver = HashResolver::new(&nix, &nix);
    let engine = UpdateEngine::new(&releases, &npm, resolver);
    let stage = UpdateStage::new(&engine, &registry, &nix, &git, &context.repo_root);
    stage
        .run(update_type, &name, &current_version, &context.outputs)
        .await?;
    Ok(())
}

fn recorded_version(
    context: &StageContext,
    registry: &PackageRegistry,
    update_type: UpdateType,
    name: &str,
) -> Result<String> {
    match update_type {
        UpdateType::Package => read_version(registry.get(name)?.record_path()),
        UpdateType::FlakeInput => {
            FlakeLock::load(&context.repo_root.join("flake.lock"))?.input_version(name)
        }
    }
}
