//! Git operations for publishing update branches

use crate::error::Result;
use crate::process::{CommandSpec, ProcessRunner};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Committer name used on automation commits.
pub const BOT_NAME: &str = "github-actions[bot]";

/// Committer email matching the GitHub Actions bot account.
pub const BOT_EMAIL: &str = "41898282+github-actions[bot]@users.noreply.github.com";

/// Repository-local version control operations.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Whether the working tree differs from HEAD.
    async fn has_changes(&self) -> Result<bool>;

    /// Set the bot committer identity for this repository.
    async fn ensure_bot_identity(&self) -> Result<()>;

    /// Create and switch to a new branch.
    async fn create_branch(&self, name: &str) -> Result<()>;

    /// Stage every change in the working tree.
    async fn stage_all(&self) -> Result<()>;

    /// Commit staged changes with a sign-off trailer.
    async fn commit(&self, message: &str) -> Result<()>;

    /// Push the branch to `origin`, overwriting a stale remote branch only
    /// when nobody else has advanced it.
    async fn force_push(&self, branch: &str) -> Result<()>;
}

/// [`VersionControl`] backed by the `git` binary.
pub struct GitClient<R> {
    runner: R,
    root: PathBuf,
}

impl<R: ProcessRunner> GitClient<R> {
    /// Client operating on the repository at `root`.
    pub fn new(runner: R, root: &Path) -> Self {
        Self {
            runner,
            root: root.to_path_buf(),
        }
    }

    async fn git<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S> + Send,
        S: Into<String>,
    {
        let spec = CommandSpec::new("git", args).current_dir(&self.root);
        self.runner.run_checked(&spec).await
    }
}

#[async_trait]
impl<R: ProcessRunner> VersionControl for GitClient<R> {
    async fn has_changes(&self) -> Result<bool> {
        let status = self.git(["status", "--porcelain"]).await?;
        Ok(!status.trim().is_empty())
    }

    async fn ensure_bot_identity(&self) -> Result<()> {
        self.git(["config", "user.name", BOT_NAME]).await?;
        self.git(["config", "user.email", BOT_EMAIL]).await?;
        Ok(())
    }

    async fn create_branch(&self, name: &str) -> Result<()> {
        self.git(["checkout", "-b", name]).await?;
        Ok(())
    }

    async fn stage_all(&self) -> Result<()> {
        self.git(["add", "-A"]).await?;
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        self.git(["commit", "-m", message, "--signoff"]).await?;
        Ok(())
    }

    async fn force_push(&self, branch: &str) -> Result<()> {
        self.git(["push", "--force-with-lease", "-u", "origin", branch])
            .await?;
        Ok(())
    }
}
