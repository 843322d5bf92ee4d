//! Hash resolution for target versions
//!
//! Every mode here produces and persists the record that pins one package at
//! one version. The cargo modes cannot compute their hashes analytically:
//! they write a placeholder, attempt the build, and read the correct value
//! out of the resulting mismatch report. The vendored-git-dependency mode
//! repeats that probe once per distinct checkout because a build reports at
//! most one mismatch per invocation.

use crate::cargo_lock;
use crate::error::{Error, Result};
use crate::nix::{BuildOracle, BuildProbe, PLACEHOLDER_SHA256, Prefetcher};
use crate::record::{UpdateRecord, write_record};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Upper bound on verification builds in the fixed-output convergence loop.
pub const MAX_HASH_ROUNDS: u32 = 32;

/// Computes and persists the hash payload of an update record.
pub struct HashResolver<'a> {
    prefetcher: &'a dyn Prefetcher,
    oracle: &'a dyn BuildOracle,
}

impl<'a> HashResolver<'a> {
    /// Resolver over injected prefetch and build capabilities.
    pub fn new(prefetcher: &'a dyn Prefetcher, oracle: &'a dyn BuildOracle) -> Self {
        Self {
            prefetcher,
            oracle,
        }
    }

    /// Pin a single source archive: write `{version, hash}`.
    pub async fn resolve_source(&self, record_path: &Path, version: &str, url: &str) -> Result<()> {
        info!("Prefetching source: {url}");
        let hash = self.prefetcher.prefetch(url, true).await?;
        write_record(record_path, &UpdateRecord::for_source(version, &hash))?;
        info!("Updated {} to {version}", record_path.display());
        Ok(())
    }

    /// Pin a set of per-platform release assets: write `{version, hashes}`.
    ///
    /// The prefetches run concurrently; any single failure abandons the
    /// update with no record written.
    pub async fn resolve_assets(
        &self,
        record_path: &Path,
        version: &str,
        assets: &[(String, String)],
    ) -> Result<()> {
        let fetches = assets.iter().map(|(platform, url)| async move {
            info!("Prefetching {platform}: {url}");
            let hash = self.prefetcher.prefetch(url, false).await?;
            Ok::<_, Error>((platform.clone(), hash))
        });
        let hashes: BTreeMap<String, String> = futures::future::try_join_all(fetches)
            .await?
            .into_iter()
            .collect();

        write_record(record_path, &UpdateRecord::for_assets(version, hashes))?;
        info!("Updated {} to {version}", record_path.display());
        Ok(())
    }

    /// Pin a source archive plus its Cargo vendor hash.
    ///
    /// The placeholder is written first so the probe consumes it. A build
    /// that succeeds anyway never checked the vendor hash, so the
    /// placeholder is left in place rather than mistaken for a real value.
    pub async fn resolve_cargo_vendor(
        &self,
        package: &str,
        record_path: &Path,
        version: &str,
        url: &str,
    ) -> Result<()> {
        info!("Prefetching source: {url}");
        let hash = self.prefetcher.prefetch(url, true).await?;
        let base = UpdateRecord::for_source(version, &hash);

        write_record(record_path, &base.clone().with_cargo_hash(PLACEHOLDER_SHA256))?;
        match self.oracle.probe(package).await? {
            BuildProbe::Success => {
                info!(
                    "Updated {} to {version} (cargoHash unchanged)",
                    record_path.display()
                );
            }
            BuildProbe::Mismatch(mismatch) => {
                write_record(record_path, &base.with_cargo_hash(&mismatch.hash))?;
                info!("Updated {} to {version}", record_path.display());
            }
        }
        Ok(())
    }

    /// Pin a source archive plus fixed-output hashes for every git
    /// dependency in its lockfile.
    ///
    /// Seeds all keys with the placeholder, then converges one derivation
    /// per round: each mismatch report rewrites every key belonging to the
    /// named derivation and persists the intermediate record, so an
    /// interrupted run can be inspected or resumed. A report naming a
    /// derivation outside the grouped map fails hard.
    pub async fn resolve_vendored_git_deps(
        &self,
        package: &str,
        record_path: &Path,
        version: &str,
        url: &str,
        lock_text: &str,
        lock_path: &str,
    ) -> Result<()> {
        info!("Prefetching source: {url}");
        let hash = self.prefetcher.prefetch(url, true).await?;
        let base = UpdateRecord::for_source(version, &hash);

        let deps = cargo_lock::parse_git_dependencies(lock_text, lock_path)?;
        let groups = cargo_lock::group_hash_keys(&deps);
        let mut hashes: BTreeMap<String, String> = groups
            .values()
            .flatten()
            .map(|key| (key.clone(), PLACEHOLDER_SHA256.to_string()))
            .collect();

        write_record(record_path, &base.clone().with_output_hashes(hashes.clone()))?;

        for _ in 0..MAX_HASH_ROUNDS {
            match self.oracle.probe(package).await? {
                BuildProbe::Success => {
                    write_record(record_path, &base.with_output_hashes(hashes))?;
                    info!("Updated {} to {version}", record_path.display());
                    return Ok(());
                }
                BuildProbe::Mismatch(mismatch) => {
                    let keys = groups.get(&mismatch.derivation).ok_or_else(|| {
                        Error::UnknownDerivation {
                            name: mismatch.derivation.clone(),
                        }
                    })?;
                    for key in keys {
                        hashes.insert(key.clone(), mismatch.hash.clone());
                    }
                    write_record(
                        record_path,
                        &base.clone().with_output_hashes(hashes.clone()),
                    )?;
                }
            }
        }

        Err(Error::HashResolutionExhausted {
            package: package.to_string(),
            attempts: MAX_HASH_ROUNDS,
        })
    }
}
