//! Version discovery and update execution for one package

use crate::config::{AssetsConfig, CargoMode, NpmConfig, PackageConfig, TarballConfig};
use crate::error::Result;
use crate::forge::ReleaseSource;
use crate::hash::HashResolver;
use crate::npm::NpmRegistry;
use crate::record::read_version;
use crate::version::{github_asset_url, github_tarball_url, npm_tarball_url, version_from_tag};
use tracing::info;

/// Drives one package from "what is the latest upstream version" to a
/// rewritten update record.
///
/// Versions are compared as plain strings. An upstream re-tag that yields
/// the recorded version string is treated as already up to date, and no
/// hash resolution happens at all in that case.
pub struct UpdateEngine<'a> {
    releases: &'a dyn ReleaseSource,
    npm: &'a dyn NpmRegistry,
    resolver: HashResolver<'a>,
}

impl<'a> UpdateEngine<'a> {
    /// Engine over the given release source, npm registry, and resolver.
    pub fn new(
        releases: &'a dyn ReleaseSource,
        npm: &'a dyn NpmRegistry,
        resolver: HashResolver<'a>,
    ) -> Self {
        Self {
            releases,
            npm,
            resolver,
        }
    }

    /// Update `name` according to its config, writing the record on change.
    pub async fn update_package(&self, name: &str, config: &PackageConfig) -> Result<()> {
        match config {
            PackageConfig::GithubTarball(config) => self.update_tarball(name, config).await,
            PackageConfig::GithubAssets(config) => self.update_assets(name, config).await,
            PackageConfig::NpmTarball(config) => self.update_npm(name, config).await,
        }
    }

    async fn update_tarball(&self, name: &str, config: &TarballConfig) -> Result<()> {
        let release = self
            .releases
            .latest_release(&config.owner, &config.repo)
            .await?;
        let tag = release.tag_name;
        let version = version_from_tag(&tag, &config.tag_prefix)?;
        let current = read_version(&config.record_path)?;
        if version == current {
            info!("{name}: already up to date ({version})");
            return Ok(());
        }

        let url = github_tarball_url(&config.owner, &config.repo, &tag);
        match &config.cargo {
            None => {
                self.resolver
                    .resolve_source(&config.record_path, &version, &url)
                    .await
            }
            Some(CargoMode::VendorHash) => {
                self.resolver
                    .resolve_cargo_vendor(name, &config.record_path, &version, &url)
                    .await
            }
            Some(CargoMode::LockFile { lock_file_path }) => {
                let lock_text = self
                    .releases
                    .file_at_ref(&config.owner, &config.repo, lock_file_path, &tag)
                    .await?;
                self.resolver
                    .resolve_vendored_git_deps(
                        name,
                        &config.record_path,
                        &version,
                        &url,
                        &lock_text,
                        lock_file_path,
                    )
                    .await
            }
        }
    }

    async fn update_assets(&self, name: &str, config: &AssetsConfig) -> Result<()> {
        let release = self
            .releases
            .latest_release(&config.owner, &config.repo)
            .await?;
        let version = version_from_tag(&release.tag_name, &config.tag_prefix)?;
        let current = read_version(&config.record_path)?;
        if version == current {
            info!("{name}: already up to date ({version})");
            return Ok(());
        }

        let assets: Vec<(String, String)> = config
            .assets
            .iter()
            .map(|(platform, asset)| {
                let url =
                    github_asset_url(&config.owner, &config.repo, &release.tag_name, asset);
                (platform.clone(), url)
            })
            .collect();
        self.resolver
            .resolve_assets(&config.record_path, &version, &assets)
            .await
    }

    async fn update_npm(&self, name: &str, config: &NpmConfig) -> Result<()> {
        let version = self.npm.latest_version(&config.package_name).await?;
        let current = read_version(&config.record_path)?;
        if version == current {
            info!("{name}: already up to date ({version})");
            return Ok(());
        }

        let url = npm_tarball_url(&config.package_name, &version);
        self.resolver
            .resolve_source(&config.record_path, &version, &url)
            .await
    }
}
