//! GitHub implementations of the forge traits

use crate::error::{Error, Result};
use crate::forge::{AutoMergeOutcome, PullRequestForge, ReleaseSource};
use crate::types::{PullRequest, ReleaseInfo, RepoSlug};
use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct GraphQlResponse {
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct ReleasePayload {
    tag_name: String,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ContentPayload {
    content: Option<String>,
}

const ENABLE_AUTO_MERGE_MUTATION: &str = r"
    mutation EnableAutoMerge($pullRequestId: ID!) {
        enablePullRequestAutoMerge(input: { pullRequestId: $pullRequestId, mergeMethod: SQUASH }) {
            clientMutationId
        }
    }
";

const MERGE_MUTATION: &str = r"
    mutation MergePullRequest($pullRequestId: ID!) {
        mergePullRequest(input: { pullRequestId: $pullRequestId, mergeMethod: SQUASH }) {
            clientMutationId
        }
    }
";

fn build_client(token: Option<&str>, base_uri: Option<&str>) -> Result<Octocrab> {
    let mut builder = Octocrab::builder();
    if let Some(token) = token {
        builder = builder.personal_token(token.to_string());
    }
    if let Some(uri) = base_uri {
        builder = builder.base_uri(uri)?;
    }
    Ok(builder.build()?)
}

/// Release metadata reader backed by octocrab.
///
/// Works unauthenticated against public repositories; a token raises the
/// rate limit and unlocks private upstreams.
pub struct GitHubReleases {
    client: Octocrab,
}

impl GitHubReleases {
    /// Client against the public GitHub API.
    pub fn new(token: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: build_client(token, None)?,
        })
    }

    /// Client against a different API root (used by tests).
    pub fn with_base_uri(base_uri: &str, token: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: build_client(token, Some(base_uri))?,
        })
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    async fn latest_release(&self, owner: &str, repo: &str) -> Result<ReleaseInfo> {
        debug!(owner, repo, "fetching latest release");
        let release: ReleasePayload = self
            .client
            .get(format!("/repos/{owner}/{repo}/releases/latest"), None::<&()>)
            .await?;
        if release.tag_name.is_empty() {
            return Err(Error::MissingField {
                context: format!("latest release of {owner}/{repo}"),
                field: "tag_name".to_string(),
            });
        }
        debug!(tag = %release.tag_name, published_at = ?release.published_at, "got latest release");
        Ok(ReleaseInfo {
            tag_name: release.tag_name,
            published_at: release.published_at,
        })
    }

    async fn file_at_ref(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<String> {
        debug!(owner, repo, path, git_ref, "fetching file at ref");
        let context = format!("{owner}/{repo}:{path}@{git_ref}");
        let payload: ContentPayload = self
            .client
            .get(
                format!("/repos/{owner}/{repo}/contents/{path}"),
                Some(&serde_json::json!({ "ref": git_ref })),
            )
            .await?;

        let encoded = payload.content.ok_or_else(|| Error::MissingField {
            context: context.clone(),
            field: "content".to_string(),
        })?;
        // The contents API hard-wraps its base64 payload with newlines.
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|err| Error::InvalidJson {
                context: context.clone(),
                detail: format!("content is not valid base64: {err}"),
            })?;
        String::from_utf8(bytes).map_err(|err| Error::InvalidJson {
            context,
            detail: format!("content is not valid UTF-8: {err}"),
        })
    }
}

/// Pull-request operations on the host repository, backed by octocrab.
pub struct GitHubForge {
    client: Octocrab,
    slug: RepoSlug,
}

impl GitHubForge {
    /// Authenticated client for `slug` against the public GitHub API.
    pub fn new(token: &str, slug: RepoSlug) -> Result<Self> {
        Ok(Self {
            client: build_client(Some(token), None)?,
            slug,
        })
    }

    /// Authenticated client against a different API root (used by tests).
    pub fn with_base_uri(base_uri: &str, token: &str, slug: RepoSlug) -> Result<Self> {
        Ok(Self {
            client: build_client(Some(token), Some(base_uri))?,
            slug,
        })
    }

    /// Run one of the merge mutations and collect reported error messages.
    async fn run_mutation(&self, mutation: &str, pull_request_id: &str) -> Result<Vec<String>> {
        let response: GraphQlResponse = self
            .client
            .graphql(&serde_json::json!({
                "query": mutation,
                "variables": { "pullRequestId": pull_request_id }
            }))
            .await?;
        Ok(response
            .errors
            .unwrap_or_default()
            .into_iter()
            .map(|err| err.message)
            .collect())
    }
}

fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> Result<PullRequest> {
    let node_id = pr.node_id.clone().ok_or_else(|| Error::MissingField {
        context: format!("pull request #{}", pr.number),
        field: "node_id".to_string(),
    })?;
    Ok(PullRequest {
        number: pr.number,
        url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        node_id,
    })
}

#[async_trait]
impl PullRequestForge for GitHubForge {
    async fn default_branch(&self) -> Result<String> {
        debug!(repo = %self.slug, "fetching default branch");
        let repository = self
            .client
            .repos(&self.slug.owner, &self.slug.repo)
            .get()
            .await?;
        repository
            .default_branch
            .filter(|branch| !branch.is_empty())
            .ok_or_else(|| Error::MissingField {
                context: format!("repository {}", self.slug),
                field: "default_branch".to_string(),
            })
    }

    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        debug!(head_branch, "listing open PRs for head");
        let head = format!("{}:{}", self.slug.owner, head_branch);
        let page = self
            .client
            .pulls(&self.slug.owner, &self.slug.repo)
            .list()
            .head(head)
            .state(octocrab::params::State::Open)
            .send()
            .await?;

        let result = page.items.first().map(pr_from_octocrab).transpose()?;
        if let Some(ref pr) = result {
            debug!(pr_number = pr.number, "found existing PR");
        } else {
            debug!("no existing PR found");
        }
        Ok(result)
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        debug!(head, base, "creating PR");
        let pr = self
            .client
            .pulls(&self.slug.owner, &self.slug.repo)
            .create(title, head, base)
            .body(body)
            .send()
            .await?;

        let result = pr_from_octocrab(&pr)?;
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn update_pr(&self, number: u64, title: &str, body: &str) -> Result<PullRequest> {
        debug!(pr_number = number, "updating PR");
        let pr = self
            .client
            .pulls(&self.slug.owner, &self.slug.repo)
            .update(number)
            .title(title)
            .body(body)
            .send()
            .await?;

        debug!(pr_number = number, "updated PR");
        pr_from_octocrab(&pr)
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        debug!(pr_number = number, count = labels.len(), "adding labels");
        self.client
            .issues(&self.slug.owner, &self.slug.repo)
            .add_labels(number, labels)
            .await?;
        Ok(())
    }

    async fn enable_auto_merge(&self, pull_request_id: &str) -> Result<AutoMergeOutcome> {
        debug!(pull_request_id, "enabling auto-merge");
        let errors = self
            .run_mutation(ENABLE_AUTO_MERGE_MUTATION, pull_request_id)
            .await?;
        if errors.is_empty() {
            debug!("auto-merge enabled");
            return Ok(AutoMergeOutcome::Enabled);
        }
        if errors.iter().any(|message| message.contains("clean status")) {
            debug!("auto-merge unavailable, repository wants a direct merge");
            return Ok(AutoMergeOutcome::RequiresDirectMerge);
        }
        Err(Error::GitHubGraphql { errors })
    }

    async fn merge_pr(&self, pull_request_id: &str) -> Result<()> {
        debug!(pull_request_id, "merging PR");
        let errors = self.run_mutation(MERGE_MUTATION, pull_request_id).await?;
        if errors.is_empty() {
            debug!("merged PR");
            Ok(())
        } else {
            Err(Error::GitHubGraphql { errors })
        }
    }
}
