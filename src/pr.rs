//! Branch naming, PR content, and the publish lifecycle

use crate::error::Result;
use crate::forge::{AutoMergeOutcome, PullRequestForge};
use crate::git::VersionControl;
use crate::types::{PrOutcome, UpdateType};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static DISALLOWED_REF_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());
static DASH_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

/// Reduce arbitrary text to a safe git ref segment.
///
/// Disallowed characters become single dashes, edge dashes are stripped,
/// and interior runs collapse. The result can be empty when nothing
/// survives.
pub fn sanitize_ref_segment(value: &str) -> String {
    let replaced = DISALLOWED_REF_CHARS.replace_all(value.trim(), "-");
    let trimmed = replaced.trim_matches('-');
    DASH_RUNS.replace_all(trimmed, "-").into_owned()
}

/// Branch an update for `name` publishes to.
pub fn branch_name(update_type: UpdateType, name: &str) -> String {
    format!(
        "update/{}/{}",
        sanitize_ref_segment(&update_type.to_string()),
        sanitize_ref_segment(name)
    )
}

/// Everything needed to publish one update as a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrPlan {
    /// Head branch to create and push.
    pub branch: String,
    /// Pull request title.
    pub title: String,
    /// Pull request body.
    pub body: String,
    /// Commit message for the single update commit.
    pub commit_message: String,
}

/// Derive branch, title, body, and commit message for an update.
pub fn plan_pr(
    update_type: UpdateType,
    name: &str,
    current_version: &str,
    new_version: &str,
) -> PrPlan {
    let branch = branch_name(update_type, name);
    let (title, body, commit_message) = match update_type {
        UpdateType::FlakeInput => {
            let title = format!("flake.lock: Update {name}");
            let body = [
                format!("This PR updates the flake input `{name}` to the latest version."),
                String::new(),
                "## Changes".to_string(),
                format!("- {name}: `{current_version}` → `{new_version}`"),
            ]
            .join("\n");
            let commit_message = format!("{title}\n\n{current_version} -> {new_version}");
            (title, body, commit_message)
        }
        UpdateType::Package => {
            let title = format!("{name}: {current_version} -> {new_version}");
            let body =
                format!("Automated update of {name} from {current_version} to {new_version}.");
            let commit_message = title.clone();
            (title, body, commit_message)
        }
    };
    PrPlan {
        branch,
        title,
        body,
        commit_message,
    }
}

/// Publishes a planned update: commit, push, then open or refresh the PR.
pub struct PrLifecycle<'a> {
    git: &'a dyn VersionControl,
    forge: &'a dyn PullRequestForge,
}

impl<'a> PrLifecycle<'a> {
    /// Lifecycle over the given working tree and forge.
    pub fn new(git: &'a dyn VersionControl, forge: &'a dyn PullRequestForge) -> Self {
        Self { git, forge }
    }

    /// Run the whole publish flow.
    ///
    /// A clean working tree short-circuits to a "nothing created" outcome
    /// without touching git config, branches, or the forge. Otherwise the
    /// branch is force-pushed and an existing PR for it is refreshed in
    /// place rather than duplicated. When auto-merge cannot be armed
    /// because the PR is already mergeable, it is merged directly.
    pub async fn run(
        &self,
        plan: &PrPlan,
        labels: &[String],
        auto_merge: bool,
    ) -> Result<PrOutcome> {
        if !self.git.has_changes().await? {
            debug!("working tree is clean, skipping pull request");
            return Ok(PrOutcome {
                created: false,
                pull_request: None,
            });
        }

        self.git.ensure_bot_identity().await?;
        self.git.create_branch(&plan.branch).await?;
        self.git.stage_all().await?;
        self.git.commit(&plan.commit_message).await?;
        self.git.force_push(&plan.branch).await?;

        let pull_request = match self.forge.find_existing_pr(&plan.branch).await? {
            Some(existing) => {
                debug!(number = existing.number, "refreshing existing pull request");
                self.forge
                    .update_pr(existing.number, &plan.title, &plan.body)
                    .await?
            }
            None => {
                let base = self.forge.default_branch().await?;
                self.forge
                    .create_pr(&plan.branch, &base, &plan.title, &plan.body)
                    .await?
            }
        };

        if !labels.is_empty() {
            self.forge.add_labels(pull_request.number, labels).await?;
        }

        if auto_merge {
            match self.forge.enable_auto_merge(&pull_request.node_id).await? {
                AutoMergeOutcome::Enabled => {}
                AutoMergeOutcome::RequiresDirectMerge => {
                    self.forge.merge_pr(&pull_request.node_id).await?;
                }
            }
        }

        Ok(PrOutcome {
            created: true,
            pull_request: Some(pull_request),
        })
    }
}
