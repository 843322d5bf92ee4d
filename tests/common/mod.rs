//! Shared fixtures and mocks for unit and integration tests

#![allow(dead_code)]

mod mock_forge;
mod mock_git;

pub use mock_forge::{AddLabelsCall, CreatePrCall, MockForge, UpdatePrCall};
pub use mock_git::MockGit;

use nix_autobump::types::PullRequest;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A pull request the way the forge would return it
pub fn make_pr(number: u64) -> PullRequest {
    PullRequest {
        number,
        url: format!("https://github.com/test/repo/pull/{number}"),
        node_id: format!("PR_node_{number}"),
    }
}

/// Render a `flake.lock` whose root flake pins each `(input, rev)` pair
pub fn flake_lock_text(inputs: &[(&str, &str)]) -> String {
    let mut nodes = serde_json::Map::new();
    let mut root_inputs = serde_json::Map::new();
    for (name, rev) in inputs {
        root_inputs.insert((*name).to_string(), json!(name));
        nodes.insert(
            (*name).to_string(),
            json!({
                "locked": {
                    "lastModified": 1_755_000_000,
                    "narHash": format!("sha256-{name}"),
                    "rev": rev,
                }
            }),
        );
    }
    nodes.insert("root".to_string(), json!({ "inputs": root_inputs }));
    let lock = json!({ "nodes": nodes, "root": "root", "version": 7 });
    serde_json::to_string_pretty(&lock).expect("serialize flake.lock")
}

/// Temporary repository tree in the layout the updater expects:
/// `pkgs/<name>/updater.json` next to its `hash.json`, plus a root
/// `flake.lock`.
pub struct TempRepo {
    dir: TempDir,
}

impl TempRepo {
    /// Empty repository: a bare `pkgs/` directory and a lockfile with no
    /// inputs
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp repo");
        fs::create_dir(dir.path().join("pkgs")).expect("create pkgs dir");
        let repo = Self { dir };
        repo.write_flake_lock(&[]);
        repo
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the update record for `name`
    pub fn record_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("pkgs").join(name).join("hash.json")
    }

    /// Add a github-tarball package pinned at `version`
    pub fn add_tarball_package(&self, name: &str, version: &str) {
        self.write_package(
            name,
            &json!({
                "kind": "github-tarball",
                "owner": "octo-org",
                "repo": name,
                "tagPrefix": "v",
            }),
            version,
        );
    }

    /// Add an npm-tarball package pinned at `version`
    pub fn add_npm_package(&self, name: &str, version: &str) {
        self.write_package(
            name,
            &json!({ "kind": "npm-tarball", "packageName": name }),
            version,
        );
    }

    /// Rewrite `flake.lock` so the root flake pins each `(input, rev)` pair
    pub fn write_flake_lock(&self, inputs: &[(&str, &str)]) {
        fs::write(self.dir.path().join("flake.lock"), flake_lock_text(inputs))
            .expect("write flake.lock");
    }

    fn write_package(&self, name: &str, config: &serde_json::Value, version: &str) {
        let dir = self.dir.path().join("pkgs").join(name);
        fs::create_dir_all(&dir).expect("create package dir");
        fs::write(dir.join("updater.json"), config.to_string()).expect("write updater.json");
        let record = json!({
            "version": version,
            "hash": "sha256-oldoldoldoldoldoldoldoldoldoldoldoldoldoldo=",
        });
        fs::write(self.record_path(name), record.to_string()).expect("write hash.json");
    }
}

impl Default for TempRepo {
    fn default() -> Self {
        Self::new()
    }
}
