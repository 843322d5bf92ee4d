//! Reading pinned input versions out of `flake.lock`
//!
//! The lockfile is a graph: a `root` key names the entry node, whose
//! `inputs` map takes each input name to either a node key or a follows
//! path (an array whose last element is the effective node key). Locked
//! nodes carry the source pin this module reports as a version.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Length of the abbreviated commit id reported as a version.
const SHORT_REV_LEN: usize = 8;

/// Parsed `flake.lock` contents.
#[derive(Debug, Deserialize)]
pub struct FlakeLock {
    nodes: BTreeMap<String, Node>,
    root: String,
}

#[derive(Debug, Deserialize)]
struct Node {
    #[serde(default)]
    inputs: BTreeMap<String, InputRef>,
    locked: Option<LockedSource>,
}

/// An entry in a node's `inputs` map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputRef {
    Direct(String),
    Follows(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct LockedSource {
    rev: Option<String>,
    #[serde(rename = "narHash")]
    nar_hash: Option<String>,
    #[serde(rename = "lastModified")]
    last_modified: Option<i64>,
}

impl FlakeLock {
    /// Load and parse `flake.lock` from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse lockfile text.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| Error::InvalidFlakeLock {
            detail: err.to_string(),
        })
    }

    fn root_node(&self) -> Result<&Node> {
        self.nodes.get(&self.root).ok_or_else(|| Error::InvalidFlakeLock {
            detail: format!("root node `{}` is missing", self.root),
        })
    }

    /// Names of the flake's direct inputs, sorted.
    pub fn root_input_names(&self) -> Result<Vec<String>> {
        Ok(self.root_node()?.inputs.keys().cloned().collect())
    }

    /// Whether `name` is a direct input of the flake.
    pub fn has_input(&self, name: &str) -> Result<bool> {
        Ok(self.root_node()?.inputs.contains_key(name))
    }

    /// Version string pinned for the input `name`.
    ///
    /// Prefers the abbreviated commit id, then the NAR hash, then the
    /// last-modified timestamp. A node pinning none of those is malformed.
    pub fn input_version(&self, name: &str) -> Result<String> {
        let node_key = self.resolve_input(name)?;
        let node = self.nodes.get(node_key).ok_or_else(|| Error::InvalidFlakeLock {
            detail: format!("node `{node_key}` is missing"),
        })?;
        let locked = node.locked.as_ref().ok_or_else(|| Error::InvalidFlakeLock {
            detail: format!("node `{node_key}` has no locked source"),
        })?;

        if let Some(rev) = locked.rev.as_deref().filter(|rev| !rev.is_empty()) {
            return Ok(rev.chars().take(SHORT_REV_LEN).collect());
        }
        if let Some(nar_hash) = locked.nar_hash.as_deref().filter(|hash| !hash.is_empty()) {
            return Ok(nar_hash.to_string());
        }
        if let Some(last_modified) = locked.last_modified {
            return Ok(last_modified.to_string());
        }
        Err(Error::InvalidFlakeLock {
            detail: format!("node `{node_key}` pins no rev, narHash, or lastModified"),
        })
    }

    /// Node key the input `name` points at, following indirection.
    fn resolve_input(&self, name: &str) -> Result<&str> {
        let reference =
            self.root_node()?
                .inputs
                .get(name)
                .ok_or_else(|| Error::InvalidFlakeLock {
                    detail: format!("input `{name}` is not declared by the root node"),
                })?;
        let node_key = match reference {
            InputRef::Direct(key) => key.as_str(),
            InputRef::Follows(path) => path.last().map(String::as_str).unwrap_or_default(),
        };
        if node_key.is_empty() {
            return Err(Error::InvalidFlakeLock {
                detail: format!("input `{name}` has an empty node reference"),
            });
        }
        Ok(node_key)
    }
}
