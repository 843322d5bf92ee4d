//! Shared setup for CLI commands
//!
//! Extracts the environment plumbing every stage needs: the repository
//! root (the process working directory), the workflow output sink, and
//! GitHub credentials.

use nix_autobump::error::{Error, Result};
use nix_autobump::outputs::ActionOutputs;
use nix_autobump::types::RepoSlug;
use std::path::PathBuf;

const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
const REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";

/// Ambient state shared by the workflow stages.
pub struct StageContext {
    /// Repository the stage operates on.
    pub repo_root: PathBuf,
    /// Where outputs and the step summary go.
    pub outputs: ActionOutputs,
}

impl StageContext {
    /// Context rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let repo_root = std::env::current_dir().map_err(|source| Error::ReadFile {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(Self {
            repo_root,
            outputs: ActionOutputs::from_env(),
        })
    }

    /// Ambient GitHub token, when one is configured.
    pub fn github_token(&self) -> Option<String> {
        std::env::var(GITHUB_TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty())
    }

    /// Token for PR publication: the explicit flag value, else the ambient
    /// token. Publishing cannot proceed anonymously.
    pub fn require_pr_token(&self, flag: Option<String>) -> Result<String> {
        flag.filter(|token| !token.is_empty())
            .or_else(|| self.github_token())
            .ok_or_else(|| Error::MissingEnv {
                key: "ghToken".to_string(),
            })
    }

    /// The `owner/repo` slug of the host repository.
    pub fn repo_slug(&self) -> Result<RepoSlug> {
        let value = std::env::var(REPOSITORY_ENV).map_err(|_| Error::MissingEnv {
            key: REPOSITORY_ENV.to_string(),
        })?;
        RepoSlug::parse(&value).ok_or(Error::InvalidEnv {
            key: REPOSITORY_ENV.to_string(),
            value,
        })
    }

    /// Package name for a local one-shot run: the explicit argument, else
    /// the working directory's name.
    pub fn resolve_package_name(&self, name: Option<String>) -> Result<String> {
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            return Ok(name);
        }
        self.repo_root
            .file_name()
            .and_then(std::ffi::OsStr::to_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or(Error::MissingPackageName)
    }
}
