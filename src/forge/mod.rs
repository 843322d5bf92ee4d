//! Forge access: release metadata and pull-request operations
//!
//! Two narrow capabilities keep the engine testable: [`ReleaseSource`] reads
//! upstream repositories (any owner/repo), while [`PullRequestForge`] acts
//! on the one host repository the workflow publishes to. The GitHub
//! implementations live in [`github`].

pub mod github;

pub use github::{GitHubForge, GitHubReleases};

use crate::error::Result;
use crate::types::{PullRequest, ReleaseInfo};
use async_trait::async_trait;

/// Read-only access to upstream release metadata.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch the latest published release of `owner/repo`.
    async fn latest_release(&self, owner: &str, repo: &str) -> Result<ReleaseInfo>;

    /// Fetch the UTF-8 contents of `path` within `owner/repo` at `git_ref`.
    async fn file_at_ref(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<String>;
}

/// What enabling auto-merge reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoMergeOutcome {
    /// Auto-merge is armed; the platform merges once required checks pass.
    Enabled,
    /// The platform reported the clean-status condition: no required checks
    /// gate this repository, so the PR must be merged directly instead.
    RequiresDirectMerge,
}

/// Pull-request operations on the host repository.
#[async_trait]
pub trait PullRequestForge: Send + Sync {
    /// Name of the repository's default branch.
    async fn default_branch(&self) -> Result<String>;

    /// Find the open PR whose head is `head_branch`, if one exists.
    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>>;

    /// Open a new PR from `head` onto `base`.
    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest>;

    /// Refresh the title and body of PR `number` in place.
    async fn update_pr(&self, number: u64, title: &str, body: &str) -> Result<PullRequest>;

    /// Apply labels to PR `number`.
    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()>;

    /// Enable squash auto-merge for the PR with GraphQL id `pull_request_id`.
    async fn enable_auto_merge(&self, pull_request_id: &str) -> Result<AutoMergeOutcome>;

    /// Squash-merge the PR with GraphQL id `pull_request_id` immediately.
    async fn merge_pr(&self, pull_request_id: &str) -> Result<()>;
}
