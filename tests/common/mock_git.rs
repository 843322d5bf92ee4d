//! Mock version control for testing

#![allow(dead_code)]

use async_trait::async_trait;
use nix_autobump::error::Result;
use nix_autobump::git::VersionControl;
use std::sync::Mutex;

/// Scripted stand-in for the git working tree.
///
/// Every operation is recorded as a readable line so tests can assert the
/// exact publish sequence.
pub struct MockGit {
    has_changes: bool,
    calls: Mutex<Vec<String>>,
}

impl MockGit {
    /// Working tree with nothing to commit
    pub fn clean() -> Self {
        Self::with_changes(false)
    }

    /// Working tree with uncommitted changes
    pub fn dirty() -> Self {
        Self::with_changes(true)
    }

    fn with_changes(has_changes: bool) -> Self {
        Self {
            has_changes,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every recorded operation, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VersionControl for MockGit {
    async fn has_changes(&self) -> Result<bool> {
        self.record("status".to_string());
        Ok(self.has_changes)
    }

    async fn ensure_bot_identity(&self) -> Result<()> {
        self.record("identity".to_string());
        Ok(())
    }

    async fn create_branch(&self, name: &str) -> Result<()> {
        self.record(format!("branch {name}"));
        Ok(())
    }

    async fn stage_all(&self) -> Result<()> {
        self.record("stage".to_string());
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        self.record(format!("commit {message}"));
        Ok(())
    }

    async fn force_push(&self, branch: &str) -> Result<()> {
        self.record(format!("push {branch}"));
        Ok(())
    }
}
