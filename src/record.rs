//! Persisted per-package update records (`hash.json`)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The persisted record pinning one package.
///
/// `version` is the single source of truth for "current version"; it is
/// never inferred from a hash. Which of the optional hash fields is
/// populated depends on the package's config variant, and absent fields are
/// omitted from the file entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Version this record pins.
    #[serde(default)]
    pub version: String,
    /// Content hash of the (unpacked) source archive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Cargo vendor hash.
    #[serde(rename = "cargoHash", skip_serializing_if = "Option::is_none")]
    pub cargo_hash: Option<String>,
    /// Fixed-output hashes keyed by `name-version` of each git dependency.
    #[serde(rename = "outputHashes", skip_serializing_if = "Option::is_none")]
    pub output_hashes: Option<BTreeMap<String, String>>,
    /// Per-platform release-asset hashes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashes: Option<BTreeMap<String, String>>,
}

impl UpdateRecord {
    /// Record for a single source archive.
    pub fn for_source(version: &str, hash: &str) -> Self {
        Self {
            version: version.to_string(),
            hash: Some(hash.to_string()),
            ..Self::default()
        }
    }

    /// Record for a set of per-platform release assets.
    pub fn for_assets(version: &str, hashes: BTreeMap<String, String>) -> Self {
        Self {
            version: version.to_string(),
            hashes: Some(hashes),
            ..Self::default()
        }
    }

    /// Add a Cargo vendor hash.
    #[must_use]
    pub fn with_cargo_hash(mut self, hash: &str) -> Self {
        self.cargo_hash = Some(hash.to_string());
        self
    }

    /// Add per-derivation fixed-output hashes.
    #[must_use]
    pub fn with_output_hashes(mut self, hashes: BTreeMap<String, String>) -> Self {
        self.output_hashes = Some(hashes);
        self
    }
}

/// Read and parse a record file.
pub fn read_record(path: &Path) -> Result<UpdateRecord> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|err| Error::InvalidJson {
        context: path.display().to_string(),
        detail: err.to_string(),
    })
}

/// Read the pinned version out of a record file.
///
/// A record without a non-empty `version` is unusable as a baseline, so
/// both "field absent" and "field empty" fail the same way.
pub fn read_version(path: &Path) -> Result<String> {
    let record = read_record(path)?;
    if record.version.is_empty() {
        return Err(Error::MissingVersion {
            path: path.to_path_buf(),
        });
    }
    Ok(record.version)
}

/// Write a record as pretty-printed JSON with a trailing newline.
pub fn write_record(path: &Path, record: &UpdateRecord) -> Result<()> {
    let mut text = serde_json::to_string_pretty(record).map_err(|err| Error::InvalidJson {
        context: path.display().to_string(),
        detail: err.to_string(),
    })?;
    text.push('\n');
    std::fs::write(path, text).map_err(|source| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}
