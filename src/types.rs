//! Core types for nix-autobump

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of thing a single update run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateType {
    /// A package under `pkgs/` with its own update config.
    Package,
    /// An input pinned in `flake.lock`.
    FlakeInput,
}

impl std::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Package => write!(f, "package"),
            Self::FlakeInput => write!(f, "flake-input"),
        }
    }
}

/// One row of the CI update matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    /// Whether the row is a package or a flake input.
    #[serde(rename = "type")]
    pub update_type: UpdateType,
    /// Package or input name.
    pub name: String,
    /// Version currently pinned in the repository.
    #[serde(rename = "currentVersion")]
    pub current_version: String,
}

/// A release fetched from the upstream forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// The release tag exactly as upstream published it.
    pub tag_name: String,
    /// When the release was published, if the forge reports it.
    pub published_at: Option<DateTime<Utc>>,
}

/// A pull request on the host repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number.
    pub number: u64,
    /// Web URL for the PR.
    pub url: String,
    /// GraphQL node ID, used for auto-merge mutations.
    pub node_id: String,
}

/// An `owner/repo` pair identifying the host repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl RepoSlug {
    /// Split an `owner/repo` string on its first slash.
    ///
    /// Returns `None` when either side is empty or there is no slash at all.
    pub fn parse(value: &str) -> Option<Self> {
        let (owner, repo) = value.split_once('/')?;
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Result of one update run, as reported to the CI matrix job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Whether the working tree changed.
    pub updated: bool,
    /// The version now pinned (the old one when nothing changed).
    pub new_version: String,
}

/// Result of one pull-request lifecycle run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrOutcome {
    /// Whether a PR was published for this run, whether opened fresh or
    /// refreshed in place. False only when there was nothing to commit.
    pub created: bool,
    /// The PR that was created or refreshed, absent when nothing changed.
    pub pull_request: Option<PullRequest>,
}
