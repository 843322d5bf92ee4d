//! Workflow outputs and the job summary
//!
//! Values are handed back to the surrounding workflow through the
//! `GITHUB_OUTPUT` heredoc protocol, which needs a delimiter that never
//! occurs inside the value. Outside a workflow run (no `GITHUB_OUTPUT`),
//! outputs fall back to plain `name=value` lines on stdout so local runs
//! stay inspectable.

use crate::error::{Error, Result};
use regex::Regex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Output key for the discovered update matrix.
pub const MATRIX: &str = "matrix";
/// Output key flagging whether the matrix is non-empty.
pub const HAS_UPDATES: &str = "hasUpdates";
/// Output key flagging whether an update changed the working tree.
pub const UPDATED: &str = "updated";
/// Output key carrying the version an update moved to.
pub const NEW_VERSION: &str = "newVersion";
/// Output key flagging whether a pull request was published.
pub const CREATED: &str = "created";
/// Output key carrying the published pull request URL.
pub const PR_URL: &str = "prUrl";
/// Output key carrying the published pull request number.
pub const PR_NUMBER: &str = "prNumber";

const OUTPUT_ENV: &str = "GITHUB_OUTPUT";
const SUMMARY_ENV: &str = "GITHUB_STEP_SUMMARY";

static NON_ALNUM_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());

/// Sink for workflow outputs and the step summary.
#[derive(Debug, Clone)]
pub struct ActionOutputs {
    output_path: Option<PathBuf>,
    summary_path: Option<PathBuf>,
}

impl ActionOutputs {
    /// Sink wired to the ambient workflow files, when present.
    pub fn from_env() -> Self {
        Self {
            output_path: std::env::var(OUTPUT_ENV).ok().map(PathBuf::from),
            summary_path: std::env::var(SUMMARY_ENV).ok().map(PathBuf::from),
        }
    }

    /// Sink with explicit destinations, for tests and local wiring.
    pub fn with_paths(output_path: Option<PathBuf>, summary_path: Option<PathBuf>) -> Self {
        Self {
            output_path,
            summary_path,
        }
    }

    /// Publish one output value.
    pub fn write(&self, name: &str, value: &str) -> Result<()> {
        match &self.output_path {
            Some(path) => append(path, &format_output(name, value)),
            None => {
                println!("{name}={value}");
                Ok(())
            }
        }
    }

    /// Append lines to the job summary. Without a summary file this is a
    /// no-op rather than an error.
    pub fn summary(&self, lines: &[String]) -> Result<()> {
        match &self.summary_path {
            Some(path) => append(path, &format!("{}\n", lines.join("\n"))),
            None => Ok(()),
        }
    }
}

fn append(path: &Path, text: &str) -> Result<()> {
    let write = || -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(text.as_bytes())
    };
    write().map_err(|source| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

fn format_output(name: &str, value: &str) -> String {
    let base = format!("__AUTOBUMP_{}__", normalize_delimiter_part(name));
    let delimiter = select_delimiter(&base, value);
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

fn normalize_delimiter_part(name: &str) -> String {
    let normalized = NON_ALNUM_RUNS.replace_all(name, "_");
    let trimmed = normalized.trim_matches('_');
    if trimmed.is_empty() {
        "VALUE".to_string()
    } else {
        trimmed.to_uppercase()
    }
}

/// Pick a delimiter the value cannot terminate early.
fn select_delimiter(base: &str, value: &str) -> String {
    if !value.contains(base) {
        return base.to_string();
    }
    for index in 1..1000 {
        let candidate = format!("{base}_{index}");
        if !value.contains(&candidate) {
            return candidate;
        }
    }
    format!("{base}_{}", chrono::Utc::now().timestamp_millis())
}
