//! Nix invocations: content prefetching, verification builds, flake updates

use crate::error::{Error, Result};
use crate::process::{CommandSpec, ProcessRunner};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Deliberately wrong sha256 written wherever a real hash is not yet known.
///
/// A build attempted against this value either succeeds (the hash was never
/// checked) or fails with a mismatch report naming the value nix actually
/// computed.
pub const PLACEHOLDER_SHA256: &str = "sha256-AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

const NIX_PATH_KEY: &str = "NIX_PATH";
const NIX_PATH_VALUE: &str = "nixpkgs=flake:nixpkgs";

static GOT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"got:\s*(sha256-[0-9A-Za-z+/=]+)").unwrap());

static MISMATCH_DRV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"hash mismatch in fixed-output derivation '/nix/store/[0-9a-z]+-([^']+)\.drv'")
        .unwrap()
});

/// One fixed-output hash mismatch reported by a failed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashMismatch {
    /// Derivation name from the report, without the store hash prefix.
    /// Empty when the build log named no derivation.
    pub derivation: String,
    /// The hash nix actually computed.
    pub hash: String,
}

/// What one verification build reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildProbe {
    /// The build succeeded with the hashes currently on disk.
    Success,
    /// The build failed with a fixed-output hash mismatch.
    Mismatch(HashMismatch),
}

/// Capability to attempt a build and extract the resulting mismatch, if any.
///
/// A build failure without an extractable mismatch is an error, not a probe
/// result.
#[async_trait]
pub trait BuildOracle: Send + Sync {
    /// Build the flake output `package` once.
    async fn probe(&self, package: &str) -> Result<BuildProbe>;
}

/// Capability to hash remote content the way the build will consume it.
#[async_trait]
pub trait Prefetcher: Send + Sync {
    /// Fetch `url` and return its content hash, unpacking archives first
    /// when `unpack` is set.
    async fn prefetch(&self, url: &str, unpack: bool) -> Result<String>;
}

/// Capability to re-pin one flake input.
#[async_trait]
pub trait FlakeUpdater: Send + Sync {
    /// Update `input` in `flake.lock` to its latest revision.
    async fn flake_update(&self, input: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct PrefetchPayload {
    #[serde(default)]
    hash: String,
}

/// Nix-backed implementation of the capability traits above.
pub struct NixTool<R> {
    runner: R,
    repo_root: PathBuf,
}

impl<R: ProcessRunner> NixTool<R> {
    /// Tool rooted at the repository the flake outputs are built from.
    pub fn new(runner: R, repo_root: &Path) -> Self {
        Self {
            runner,
            repo_root: repo_root.to_path_buf(),
        }
    }
}

#[async_trait]
impl<R: ProcessRunner> FlakeUpdater for NixTool<R> {
    async fn flake_update(&self, input: &str) -> Result<()> {
        debug!(input, "running nix flake update");
        let spec = CommandSpec::new("nix", ["flake", "update", input])
            .current_dir(&self.repo_root)
            .env(NIX_PATH_KEY, NIX_PATH_VALUE);
        self.runner.run_checked(&spec).await?;
        Ok(())
    }
}

#[async_trait]
impl<R: ProcessRunner> Prefetcher for NixTool<R> {
    async fn prefetch(&self, url: &str, unpack: bool) -> Result<String> {
        let mut args = vec!["store", "prefetch-file", "--hash-type", "sha256"];
        if unpack {
            args.push("--unpack");
        }
        args.push("--json");
        args.push(url);

        let spec = CommandSpec::new("nix", args);
        let stdout = self.runner.run_checked(&spec).await?;

        let payload: PrefetchPayload =
            serde_json::from_str(&stdout).map_err(|err| Error::InvalidJson {
                context: "nix store prefetch-file".to_string(),
                detail: err.to_string(),
            })?;
        if payload.hash.is_empty() {
            return Err(Error::MissingField {
                context: "nix store prefetch-file".to_string(),
                field: "hash".to_string(),
            });
        }
        debug!(url, hash = %payload.hash, "prefetched");
        Ok(payload.hash)
    }
}

#[async_trait]
impl<R: ProcessRunner> BuildOracle for NixTool<R> {
    async fn probe(&self, package: &str) -> Result<BuildProbe> {
        let target = format!(".#{package}");
        debug!(%target, "probing build");
        let spec = CommandSpec::new("nix", ["build", target.as_str(), "--no-link"])
            .current_dir(&self.repo_root);
        let output = self.runner.run(&spec).await?;

        if output.success() {
            debug!(%target, "build succeeded");
            return Ok(BuildProbe::Success);
        }

        let log = format!("{}\n{}", output.stdout, output.stderr);
        match GOT_HASH.captures(&log) {
            Some(captures) => {
                let derivation = MISMATCH_DRV
                    .captures(&log)
                    .map(|drv| drv[1].to_string())
                    .unwrap_or_default();
                let hash = captures[1].to_string();
                debug!(%target, derivation, %hash, "build reported a hash mismatch");
                Ok(BuildProbe::Mismatch(HashMismatch { derivation, hash }))
            }
            None => Err(Error::CommandFailed {
                command: spec.to_string(),
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            }),
        }
    }
}
