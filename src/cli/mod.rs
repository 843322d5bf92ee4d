//! Command-line interface for the update workflow stages

mod context;
mod create_pr;
mod discover;
mod summary;
mod update;

use clap::{Parser, Subcommand};
use nix_autobump::error::Result;
use nix_autobump::types::UpdateType;

/// Automated dependency updates for a Nix flake package repository.
#[derive(Parser)]
#[command(name = "autobump", version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the matrix of pending updates
    Discover {
        /// Space-separated package names to check (all when empty)
        #[arg(long, env = "packages", default_value = "")]
        packages: String,
        /// Space-separated flake input names to check (all when empty)
        #[arg(long, env = "inputs", default_value = "")]
        inputs: String,
    },
    /// Update one package or flake input in place
    Update {
        /// What to update
        #[arg(long = "type", env = "type", value_enum, default_value_t = UpdateType::Package)]
        update_type: UpdateType,
        /// Name of the package or flake input (defaults to the working
        /// directory's name)
        #[arg(long, env = "name")]
        name: Option<String>,
        /// Version before the update (defaults to the recorded version)
        #[arg(long, env = "currentVersion")]
        current_version: Option<String>,
    },
    /// Publish a finished update as a pull request
    CreatePr {
        /// What was updated
        #[arg(long = "type", env = "type", value_enum, default_value_t = UpdateType::Package)]
        update_type: UpdateType,
        /// Name of the package or flake input
        #[arg(long, env = "name")]
        name: String,
        /// Version before the update
        #[arg(long, env = "currentVersion")]
        current_version: String,
        /// Version after the update
        #[arg(long, env = "newVersion")]
        new_version: String,
        /// Comma-separated labels to apply to the pull request
        #[arg(long, env = "prLabels", default_value = "")]
        labels: String,
        /// Arm auto-merge (or merge directly) when "true"
        #[arg(long, env = "autoMerge", default_value = "false")]
        auto_merge: String,
        /// GitHub token (falls back to GITHUB_TOKEN)
        #[arg(long, env = "ghToken")]
        token: Option<String>,
    },
    /// Append the run outcome to the step summary
    Summary {
        /// Aggregate result of the update jobs
        #[arg(long, env = "updateResult", default_value = "unavailable")]
        update_result: String,
        /// Whether auto-merge was requested
        #[arg(long, env = "autoMerge", default_value = "false")]
        auto_merge: String,
        /// Whether any updates were scheduled
        #[arg(long, env = "hasUpdates", default_value = "false")]
        has_updates: String,
    },
}

/// Dispatch a parsed invocation to its stage.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Discover { packages, inputs } => discover::run_discover(&packages, &inputs),
        Commands::Update {
            update_type,
            name,
            current_version,
        } => update::run_update(update_type, name, current_version).await,
        Commands::CreatePr {
            update_type,
            name,
            current_version,
            new_version,
            labels,
            auto_merge,
            token,
        } => {
            create_pr::run_create_pr(create_pr::CreatePrOptions {
                update_type,
                name,
                current_version,
                new_version,
                labels,
                auto_merge,
                token,
            })
            .await
        }
        Commands::Summary {
            update_result,
            auto_merge,
            has_updates,
        } => summary::run_summary(&update_result, &auto_merge, &has_updates),
    }
}
