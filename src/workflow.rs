//! The four workflow stages: discover, update, create-pr, summary
//!
//! Each stage takes its collaborators explicitly and reports through
//! [`ActionOutputs`], so the matrix-producing run, the fan-out update jobs,
//! and the closing summary all stay independently testable.

use crate::config::PackageRegistry;
use crate::error::{Error, Result};
use crate::flake::FlakeLock;
use crate::forge::PullRequestForge;
use crate::git::VersionControl;
use crate::nix::FlakeUpdater;
use crate::outputs::{self, ActionOutputs};
use crate::pr::{PrLifecycle, plan_pr};
use crate::record::read_version;
use crate::types::{MatrixEntry, PrOutcome, UpdateOutcome, UpdateType};
use crate::update::UpdateEngine;
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct MatrixPayload<'a> {
    include: &'a [MatrixEntry],
}

/// Split a space-separated filter value into its entries.
pub fn parse_space_separated(text: &str) -> Vec<String> {
    text.split(' ')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a comma-separated label list, dropping empty entries.
pub fn parse_labels(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

fn requested_names(filter: &[String], all: Vec<String>) -> Vec<String> {
    if filter.is_empty() {
        all
    } else {
        let mut requested = filter.to_vec();
        requested.sort();
        requested
    }
}

fn discover_packages(
    registry: &PackageRegistry,
    filter: &[String],
) -> Result<Vec<MatrixEntry>> {
    let all = registry.names().map(str::to_string).collect();
    let requested = requested_names(filter, all);

    let unrecognized: Vec<String> = requested
        .iter()
        .filter(|name| !registry.contains(name))
        .cloned()
        .collect();
    if !unrecognized.is_empty() {
        return Err(Error::UnrecognizedNames {
            kind: "packages".to_string(),
            names: unrecognized,
        });
    }

    requested
        .into_iter()
        .map(|name| {
            let config = registry.get(&name)?;
            let current_version = read_version(config.record_path())?;
            Ok(MatrixEntry {
                update_type: UpdateType::Package,
                name,
                current_version,
            })
        })
        .collect()
}

fn discover_inputs(lock: &FlakeLock, filter: &[String]) -> Result<Vec<MatrixEntry>> {
    let requested = requested_names(filter, lock.root_input_names()?);

    let mut unrecognized = Vec::new();
    for name in &requested {
        if !lock.has_input(name)? {
            unrecognized.push(name.clone());
        }
    }
    if !unrecognized.is_empty() {
        return Err(Error::UnrecognizedNames {
            kind: "flake inputs".to_string(),
            names: unrecognized,
        });
    }

    requested
        .into_iter()
        .map(|name| {
            let current_version = lock.input_version(&name)?;
            Ok(MatrixEntry {
                update_type: UpdateType::FlakeInput,
                name,
                current_version,
            })
        })
        .collect()
}

/// Build the update matrix and publish it as `matrix` / `hasUpdates`.
///
/// Package entries come first, then flake inputs, each block sorted by
/// name. An explicit filter naming anything unknown fails the whole stage.
pub fn discover(
    repo_root: &Path,
    package_filter: &[String],
    input_filter: &[String],
    outputs: &ActionOutputs,
) -> Result<Vec<MatrixEntry>> {
    let registry = PackageRegistry::discover(repo_root)?;
    let lock = FlakeLock::load(&repo_root.join("flake.lock"))?;

    let mut entries = discover_packages(&registry, package_filter)?;
    entries.extend(discover_inputs(&lock, input_filter)?);
    info!(entries = entries.len(), "discovered update matrix");

    let matrix = serde_json::to_string(&MatrixPayload { include: &entries }).map_err(|err| {
        Error::InvalidJson {
            context: "update matrix".to_string(),
            detail: err.to_string(),
        }
    })?;
    outputs.write(outputs::MATRIX, &matrix)?;
    outputs.write(
        outputs::HAS_UPDATES,
        if entries.is_empty() { "false" } else { "true" },
    )?;
    Ok(entries)
}

/// Collaborators for the update stage.
pub struct UpdateStage<'a> {
    engine: &'a UpdateEngine<'a>,
    registry: &'a PackageRegistry,
    flake: &'a dyn FlakeUpdater,
    git: &'a dyn VersionControl,
    repo_root: &'a Path,
}

impl<'a> UpdateStage<'a> {
    /// Stage over the given engine and repository collaborators.
    pub fn new(
        engine: &'a UpdateEngine<'a>,
        registry: &'a PackageRegistry,
        flake: &'a dyn FlakeUpdater,
        git: &'a dyn VersionControl,
        repo_root: &'a Path,
    ) -> Self {
        Self {
            engine,
            registry,
            flake,
            git,
            repo_root,
        }
    }

    /// Run one matrix entry's update and publish `updated` / `newVersion`.
    ///
    /// "Updated" means the working tree changed; the new version is then
    /// re-read from the record or lockfile rather than trusted from the
    /// upstream lookup, so the outputs always describe what is actually
    /// on disk.
    pub async fn run(
        &self,
        update_type: UpdateType,
        name: &str,
        current_version: &str,
        outputs: &ActionOutputs,
    ) -> Result<UpdateOutcome> {
        let outcome = match update_type {
            UpdateType::Package => self.update_package(name, current_version).await?,
            UpdateType::FlakeInput => self.update_input(name, current_version).await?,
        };

        outputs.write(
            outputs::UPDATED,
            if outcome.updated { "true" } else { "false" },
        )?;
        outputs.write(outputs::NEW_VERSION, &outcome.new_version)?;
        Ok(outcome)
    }

    async fn update_package(&self, name: &str, current_version: &str) -> Result<UpdateOutcome> {
        let config = self.registry.get(name)?;
        self.engine.update_package(name, config).await?;

        if !self.git.has_changes().await? {
            return Ok(UpdateOutcome {
                updated: false,
                new_version: current_version.to_string(),
            });
        }
        Ok(UpdateOutcome {
            updated: true,
            new_version: read_version(config.record_path())?,
        })
    }

    async fn update_input(&self, name: &str, current_version: &str) -> Result<UpdateOutcome> {
        self.flake.flake_update(name).await?;

        if !self.git.has_changes().await? {
            return Ok(UpdateOutcome {
                updated: false,
                new_version: current_version.to_string(),
            });
        }
        let lock = FlakeLock::load(&self.repo_root.join("flake.lock"))?;
        Ok(UpdateOutcome {
            updated: true,
            new_version: lock.input_version(name)?,
        })
    }
}

/// Run the publish lifecycle and report `created` (plus `prUrl` /
/// `prNumber` when a PR was touched).
pub async fn create_pull_request(
    git: &dyn VersionControl,
    forge: &dyn PullRequestForge,
    update_type: UpdateType,
    name: &str,
    current_version: &str,
    new_version: &str,
    labels: &[String],
    auto_merge: bool,
    outputs: &ActionOutputs,
) -> Result<PrOutcome> {
    let plan = plan_pr(update_type, name, current_version, new_version);
    let outcome = PrLifecycle::new(git, forge)
        .run(&plan, labels, auto_merge)
        .await?;

    match &outcome.pull_request {
        None => outputs.write(outputs::CREATED, "false")?,
        Some(pull_request) => {
            outputs.write(outputs::CREATED, "true")?;
            outputs.write(outputs::PR_URL, &pull_request.url)?;
            outputs.write(outputs::PR_NUMBER, &pull_request.number.to_string())?;
        }
    }
    Ok(outcome)
}

/// Append the closing markdown section to the step summary.
pub fn summary(
    outputs: &ActionOutputs,
    update_result: &str,
    auto_merge: &str,
    has_updates: &str,
) -> Result<()> {
    let mut lines = vec!["## Update Summary".to_string(), String::new()];

    if has_updates != "true" {
        lines.push("No updates were scheduled.".to_string());
    } else {
        if update_result == "failure" {
            lines.push("Some update jobs failed. Check workflow logs.".to_string());
        } else {
            lines.push("Update jobs completed.".to_string());
        }
        lines.push(String::new());
        lines.push("Configuration:".to_string());
        lines.push(format!("- Auto-merge: {auto_merge}"));
    }

    outputs.summary(&lines)
}
