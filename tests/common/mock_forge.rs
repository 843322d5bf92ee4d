//! Mock pull-request forge for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use nix_autobump::error::{Error, Result};
use nix_autobump::forge::{AutoMergeOutcome, PullRequestForge};
use nix_autobump::types::PullRequest;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

/// Call record for `update_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePrCall {
    pub number: u64,
    pub title: String,
    pub body: String,
}

/// Call record for `add_labels`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLabelsCall {
    pub number: u64,
    pub labels: Vec<String>,
}

/// Simple mock forge for testing
///
/// Features:
/// - Auto-incrementing PR numbers
/// - Call tracking for verification
/// - Configurable `find_existing_pr` responses per branch
/// - Error injection for failure path testing
pub struct MockForge {
    default_branch: String,
    next_pr_number: AtomicU64,
    find_pr_responses: Mutex<HashMap<String, Option<PullRequest>>>,
    auto_merge_outcome: Mutex<AutoMergeOutcome>,
    // Call tracking
    default_branch_calls: AtomicU64,
    find_pr_calls: Mutex<Vec<String>>,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    update_pr_calls: Mutex<Vec<UpdatePrCall>>,
    add_labels_calls: Mutex<Vec<AddLabelsCall>>,
    enable_auto_merge_calls: Mutex<Vec<String>>,
    merge_pr_calls: Mutex<Vec<String>>,
    // Error injection
    error_on_create_pr: Mutex<Option<String>>,
    error_on_enable_auto_merge: Mutex<Option<Vec<String>>>,
}

impl MockForge {
    /// Create a mock whose repository default branch is `main`
    pub fn new() -> Self {
        Self {
            default_branch: "main".to_string(),
            next_pr_number: AtomicU64::new(1),
            find_pr_responses: Mutex::new(HashMap::new()),
            auto_merge_outcome: Mutex::new(AutoMergeOutcome::Enabled),
            default_branch_calls: AtomicU64::new(0),
            find_pr_calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            update_pr_calls: Mutex::new(Vec::new()),
            add_labels_calls: Mutex::new(Vec::new()),
            enable_auto_merge_calls: Mutex::new(Vec::new()),
            merge_pr_calls: Mutex::new(Vec::new()),
            error_on_create_pr: Mutex::new(None),
            error_on_enable_auto_merge: Mutex::new(None),
        }
    }

    // === Configuration methods ===

    /// Set the response for `find_existing_pr` for a specific branch
    pub fn set_find_pr_response(&self, branch: &str, pr: Option<PullRequest>) {
        self.find_pr_responses
            .lock()
            .unwrap()
            .insert(branch.to_string(), pr);
    }

    /// Set what `enable_auto_merge` reports back
    pub fn set_auto_merge_outcome(&self, outcome: AutoMergeOutcome) {
        *self.auto_merge_outcome.lock().unwrap() = outcome;
    }

    // === Error injection methods ===

    /// Make `create_pr` return an error
    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `enable_auto_merge` fail with the given GraphQL error messages
    pub fn fail_enable_auto_merge(&self, messages: &[&str]) {
        let messages = messages.iter().map(ToString::to_string).collect();
        *self.error_on_enable_auto_merge.lock().unwrap() = Some(messages);
    }

    // === Call verification methods ===

    /// Get all branches that `find_existing_pr` was called with
    pub fn get_find_pr_calls(&self) -> Vec<String> {
        self.find_pr_calls.lock().unwrap().clone()
    }

    /// Get all `create_pr` calls
    pub fn get_create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    /// Get all `update_pr` calls
    pub fn get_update_pr_calls(&self) -> Vec<UpdatePrCall> {
        self.update_pr_calls.lock().unwrap().clone()
    }

    /// Get all `add_labels` calls
    pub fn get_add_labels_calls(&self) -> Vec<AddLabelsCall> {
        self.add_labels_calls.lock().unwrap().clone()
    }

    /// Get the node ids `enable_auto_merge` was called with
    pub fn get_enable_auto_merge_calls(&self) -> Vec<String> {
        self.enable_auto_merge_calls.lock().unwrap().clone()
    }

    /// Get the node ids `merge_pr` was called with
    pub fn get_merge_pr_calls(&self) -> Vec<String> {
        self.merge_pr_calls.lock().unwrap().clone()
    }

    /// Total number of forge calls across every method
    pub fn total_calls(&self) -> usize {
        usize::try_from(self.default_branch_calls.load(Ordering::SeqCst)).unwrap()
            + self.find_pr_calls.lock().unwrap().len()
            + self.create_pr_calls.lock().unwrap().len()
            + self.update_pr_calls.lock().unwrap().len()
            + self.add_labels_calls.lock().unwrap().len()
            + self.enable_auto_merge_calls.lock().unwrap().len()
            + self.merge_pr_calls.lock().unwrap().len()
    }

    /// Assert that `create_pr` was called with specific head and base
    pub fn assert_create_pr_called(&self, head: &str, base: &str) {
        let calls = self.get_create_pr_calls();
        assert!(
            calls.iter().any(|c| c.head == head && c.base == base),
            "Expected create_pr({head}, {base}) but got: {calls:?}"
        );
    }

    /// Assert that `merge_pr` was never called
    pub fn assert_merge_not_called(&self) {
        let calls = self.get_merge_pr_calls();
        assert!(
            calls.is_empty(),
            "Expected merge_pr NOT to be called but it was: {calls:?}"
        );
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PullRequestForge for MockForge {
    async fn default_branch(&self) -> Result<String> {
        self.default_branch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.default_branch.clone())
    }

    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        self.find_pr_calls
            .lock()
            .unwrap()
            .push(head_branch.to_string());

        let responses = self.find_pr_responses.lock().unwrap();
        Ok(responses.get(head_branch).cloned().flatten())
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        self.create_pr_calls.lock().unwrap().push(CreatePrCall {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });

        // Check for injected error
        if let Some(msg) = self.error_on_create_pr.lock().unwrap().as_ref() {
            return Err(Error::GitHubGraphql {
                errors: vec![msg.clone()],
            });
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequest {
            number,
            url: format!("https://github.com/test/repo/pull/{number}"),
            node_id: format!("PR_node_{number}"),
        })
    }

    async fn update_pr(&self, number: u64, title: &str, body: &str) -> Result<PullRequest> {
        self.update_pr_calls.lock().unwrap().push(UpdatePrCall {
            number,
            title: title.to_string(),
            body: body.to_string(),
        });

        Ok(PullRequest {
            number,
            url: format!("https://github.com/test/repo/pull/{number}"),
            node_id: format!("PR_node_{number}"),
        })
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        self.add_labels_calls.lock().unwrap().push(AddLabelsCall {
            number,
            labels: labels.to_vec(),
        });
        Ok(())
    }

    async fn enable_auto_merge(&self, pull_request_id: &str) -> Result<AutoMergeOutcome> {
        self.enable_auto_merge_calls
            .lock()
            .unwrap()
            .push(pull_request_id.to_string());

        // Check for injected error
        if let Some(errors) = self.error_on_enable_auto_merge.lock().unwrap().as_ref() {
            return Err(Error::GitHubGraphql {
                errors: errors.clone(),
            });
        }

        Ok(*self.auto_merge_outcome.lock().unwrap())
    }

    async fn merge_pr(&self, pull_request_id: &str) -> Result<()> {
        self.merge_pr_calls
            .lock()
            .unwrap()
            .push(pull_request_id.to_string());
        Ok(())
    }
}
