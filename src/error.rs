//! Error types for nix-autobump

use std::path::PathBuf;
use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes of the update engine.
///
/// Every variant renders as a single `[tag] ...` diagnostic line. Variants
/// that capture subprocess output or API error payloads expose additional
/// indented context lines through [`Error::detail_lines`], which `main`
/// prints beneath the diagnostic before exiting non-zero.
#[derive(Debug, Error)]
pub enum Error {
    /// A required environment variable is absent.
    #[error("[missing-env] required environment variable {key} is not set")]
    MissingEnv {
        /// Name of the missing variable.
        key: String,
    },

    /// An environment variable is present but unusable.
    #[error("[invalid-env] {key} has unusable value {value:?}")]
    InvalidEnv {
        /// Name of the variable.
        key: String,
        /// The offending value.
        value: String,
    },

    /// A subprocess could not be started at all.
    #[error("[command-spawn] failed to spawn {program}: {source}")]
    CommandSpawn {
        /// Program that failed to start.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A subprocess exited with a non-zero status.
    #[error("[command-failed] `{command}` exited with status {code}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit code (-1 when terminated by signal).
        code: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// A subprocess exceeded its time budget.
    #[error("[command-timeout] `{command}` did not finish within {timeout_secs}s")]
    CommandTimeout {
        /// Rendered command line.
        command: String,
        /// The budget that was exceeded.
        timeout_secs: u64,
    },

    /// A file could not be read.
    #[error("[read-failed] {}: {source}", path.display())]
    ReadFile {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written.
    #[error("[write-failed] {}: {source}", path.display())]
    WriteFile {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// An HTTP request failed (transport error or non-success status).
    #[error("[http] {0}")]
    Http(#[from] reqwest::Error),

    /// A GitHub REST call failed.
    #[error("[github-api] {0}")]
    GitHubApi(#[from] octocrab::Error),

    /// A GitHub GraphQL call returned an error payload.
    #[error("[github-graphql] GraphQL request returned {} error(s)", errors.len())]
    GitHubGraphql {
        /// Messages reported by the API.
        errors: Vec<String>,
    },

    /// JSON that should have a known shape failed to parse.
    #[error("[invalid-json] {context}: {detail}")]
    InvalidJson {
        /// What was being parsed (path or payload description).
        context: String,
        /// The parse failure.
        detail: String,
    },

    /// An update config file is malformed.
    #[error("[invalid-config] {}: {detail}", path.display())]
    InvalidConfig {
        /// The offending config file.
        path: PathBuf,
        /// Which field or shape constraint was violated.
        detail: String,
    },

    /// Two update config files resolve to the same package name.
    #[error("[duplicate-package] two update configs resolve to package name {name:?}")]
    DuplicatePackage {
        /// The contested name.
        name: String,
    },

    /// A package name has no update config.
    #[error("[unknown-package] no update config for package {name:?}")]
    UnknownPackage {
        /// The unmatched name.
        name: String,
    },

    /// A discovery filter named entries that do not exist.
    #[error("[unrecognized-names] unknown {kind}: {}", names.join(", "))]
    UnrecognizedNames {
        /// What the names were supposed to be ("packages" or "flake inputs").
        kind: String,
        /// The unmatched names.
        names: Vec<String>,
    },

    /// A release tag does not start with the configured prefix.
    #[error("[invalid-tag-prefix] release tag {tag:?} does not start with {prefix:?}")]
    InvalidTagPrefix {
        /// The tag as fetched.
        tag: String,
        /// The configured prefix.
        prefix: String,
    },

    /// Stripping the prefix from a release tag left nothing.
    #[error("[empty-version] release tag {tag:?} is empty after stripping its prefix")]
    EmptyVersion {
        /// The tag as fetched.
        tag: String,
    },

    /// An update record has no usable version field.
    #[error("[missing-version] {} has no version", path.display())]
    MissingVersion {
        /// The record that was read.
        path: PathBuf,
    },

    /// A response payload lacks a field the engine needs.
    #[error("[missing-field] {context}: expected {field}")]
    MissingField {
        /// What was being read.
        context: String,
        /// The absent or empty field.
        field: String,
    },

    /// A Cargo lockfile failed to parse.
    #[error("[invalid-lockfile] {context}: {detail}")]
    InvalidLockfile {
        /// Which lockfile (path within the upstream tree).
        context: String,
        /// The parse failure.
        detail: String,
    },

    /// flake.lock does not have the expected shape.
    #[error("[invalid-flake-lock] {detail}")]
    InvalidFlakeLock {
        /// Which node or input is malformed.
        detail: String,
    },

    /// A build reported a hash mismatch for a derivation not in the grouped map.
    #[error("[unknown-derivation] hash mismatch reported for unexpected derivation {name:?}")]
    UnknownDerivation {
        /// The derivation name from the build log.
        name: String,
    },

    /// The fixed-output convergence loop hit its round limit.
    #[error("[hash-resolution-exhausted] {package}: hashes did not settle after {attempts} build attempts")]
    HashResolutionExhausted {
        /// Package being resolved.
        package: String,
        /// Number of build attempts made.
        attempts: u32,
    },

    /// No package name was given and none could be inferred.
    #[error("[missing-package-name] pass --name or run from inside a package directory")]
    MissingPackageName,
}

impl Error {
    /// Extra context lines to print beneath the main diagnostic line.
    ///
    /// Command failures surface their captured stderr and stdout; GraphQL
    /// failures surface each reported message. Everything else fits on the
    /// diagnostic line itself.
    pub fn detail_lines(&self) -> Vec<String> {
        match self {
            Self::CommandFailed { stdout, stderr, .. } => [stderr, stdout]
                .iter()
                .flat_map(|chunk| chunk.lines())
                .filter(|line| !line.trim().is_empty())
                .map(|line| format!("  {line}"))
                .collect(),
            Self::GitHubGraphql { errors } => {
                errors.iter().map(|message| format!("  {message}")).collect()
            }
            _ => Vec::new(),
        }
    }
}
