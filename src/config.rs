//! Discovery and validation of per-package update configs

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name that marks a package as tracked by the updater.
pub const CONFIG_FILE_NAME: &str = "updater.json";
/// File name of the update record kept next to each config.
pub const RECORD_FILE_NAME: &str = "hash.json";
/// Directory under the repository root that holds package definitions.
pub const PACKAGES_DIR: &str = "pkgs";

/// How a Cargo-based package resolves its vendored-dependency hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CargoMode {
    /// One vendor hash, inferred from a single failed build.
    VendorHash,
    /// Per-git-dependency fixed-output hashes driven by the upstream lockfile.
    LockFile {
        /// Path of the lockfile within the upstream source tree.
        lock_file_path: String,
    },
}

/// Config for a package built from a release source tarball.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarballConfig {
    /// Upstream repository owner.
    pub owner: String,
    /// Upstream repository name.
    pub repo: String,
    /// Fixed prefix the release tag must carry before the version.
    pub tag_prefix: String,
    /// Cargo hash handling, when the package vendors Rust dependencies.
    pub cargo: Option<CargoMode>,
    /// Where this package's update record lives.
    pub record_path: PathBuf,
}

/// Config for a package built from per-platform release assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetsConfig {
    /// Upstream repository owner.
    pub owner: String,
    /// Upstream repository name.
    pub repo: String,
    /// Fixed prefix the release tag must carry before the version.
    pub tag_prefix: String,
    /// `(platform, asset file name)` pairs to hash.
    pub assets: Vec<(String, String)>,
    /// Where this package's update record lives.
    pub record_path: PathBuf,
}

/// Config for a package built from an npm registry tarball.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmConfig {
    /// Registry package name.
    pub package_name: String,
    /// Where this package's update record lives.
    pub record_path: PathBuf,
}

/// One package's update config, tagged by `kind` in `updater.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageConfig {
    /// `kind: "github-tarball"`.
    GithubTarball(TarballConfig),
    /// `kind: "github-assets"`.
    GithubAssets(AssetsConfig),
    /// `kind: "npm-tarball"`.
    NpmTarball(NpmConfig),
}

impl PackageConfig {
    /// The update record path shared by every variant.
    pub fn record_path(&self) -> &Path {
        match self {
            Self::GithubTarball(config) => &config.record_path,
            Self::GithubAssets(config) => &config.record_path,
            Self::NpmTarball(config) => &config.record_path,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "kind")]
enum RawConfig {
    #[serde(rename = "github-tarball")]
    GithubTarball {
        owner: String,
        repo: String,
        #[serde(rename = "tagPrefix")]
        tag_prefix: String,
        cargo: Option<RawCargoMode>,
    },
    #[serde(rename = "github-assets")]
    GithubAssets {
        owner: String,
        repo: String,
        #[serde(rename = "tagPrefix")]
        tag_prefix: String,
        assets: Vec<(String, String)>,
    },
    #[serde(rename = "npm-tarball")]
    NpmTarball {
        #[serde(rename = "packageName")]
        package_name: String,
    },
}

#[derive(Deserialize)]
#[serde(tag = "kind")]
enum RawCargoMode {
    #[serde(rename = "cargoHash")]
    CargoHash,
    #[serde(rename = "cargoLock")]
    CargoLock {
        #[serde(rename = "lockFilePath")]
        lock_file_path: String,
    },
}

/// All discovered package configs, keyed by package name.
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: BTreeMap<String, PackageConfig>,
}

impl PackageRegistry {
    /// Walk `<repo_root>/pkgs` and load every `updater.json`.
    ///
    /// The package name is the immediate parent directory of each config
    /// file. Two configs resolving to the same name fail discovery; the
    /// resulting map is sorted by name so downstream matrices are
    /// reproducible.
    pub fn discover(repo_root: &Path) -> Result<Self> {
        let pkgs_root = repo_root.join(PACKAGES_DIR);
        let mut packages = BTreeMap::new();

        for entry in WalkDir::new(&pkgs_root).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map_or_else(|| pkgs_root.clone(), Path::to_path_buf);
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                Error::ReadFile { path, source }
            })?;
            if !entry.file_type().is_file() || entry.file_name() != CONFIG_FILE_NAME {
                continue;
            }

            let config_path = entry.path();
            let name = package_name_for(config_path)?;
            let config = load_config(config_path)?;
            if packages.insert(name.clone(), config).is_some() {
                return Err(Error::DuplicatePackage { name });
            }
        }

        Ok(Self { packages })
    }

    /// Look up one package's config.
    pub fn get(&self, name: &str) -> Result<&PackageConfig> {
        self.packages.get(name).ok_or_else(|| Error::UnknownPackage {
            name: name.to_string(),
        })
    }

    /// Whether `name` has a config.
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Package names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }
}

fn package_name_for(config_path: &Path) -> Result<String> {
    config_path
        .parent()
        .and_then(Path::file_name)
        .and_then(std::ffi::OsStr::to_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidConfig {
            path: config_path.to_path_buf(),
            detail: "unable to infer a package name from the config location".to_string(),
        })
}

fn load_config(path: &Path) -> Result<PackageConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawConfig = serde_json::from_str(&text).map_err(|err| Error::InvalidConfig {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;
    let record_path = path.with_file_name(RECORD_FILE_NAME);

    match raw {
        RawConfig::GithubTarball {
            owner,
            repo,
            tag_prefix,
            cargo,
        } => {
            require_filled(path, "owner", &owner)?;
            require_filled(path, "repo", &repo)?;
            require_filled(path, "tagPrefix", &tag_prefix)?;
            let cargo = match cargo {
                None => None,
                Some(RawCargoMode::CargoHash) => Some(CargoMode::VendorHash),
                Some(RawCargoMode::CargoLock { lock_file_path }) => {
                    require_filled(path, "cargo.lockFilePath", &lock_file_path)?;
                    Some(CargoMode::LockFile { lock_file_path })
                }
            };
            Ok(PackageConfig::GithubTarball(TarballConfig {
                owner,
                repo,
                tag_prefix,
                cargo,
                record_path,
            }))
        }
        RawConfig::GithubAssets {
            owner,
            repo,
            tag_prefix,
            assets,
        } => {
            require_filled(path, "owner", &owner)?;
            require_filled(path, "repo", &repo)?;
            require_filled(path, "tagPrefix", &tag_prefix)?;
            for (index, (platform, asset)) in assets.iter().enumerate() {
                require_filled(path, &format!("assets[{index}].platform"), platform)?;
                require_filled(path, &format!("assets[{index}].asset"), asset)?;
            }
            Ok(PackageConfig::GithubAssets(AssetsConfig {
                owner,
                repo,
                tag_prefix,
                assets,
                record_path,
            }))
        }
        RawConfig::NpmTarball { package_name } => {
            require_filled(path, "packageName", &package_name)?;
            Ok(PackageConfig::NpmTarball(NpmConfig {
                package_name,
                record_path,
            }))
        }
    }
}

fn require_filled(path: &Path, field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidConfig {
            path: path.to_path_buf(),
            detail: format!("field `{field}` must be a non-empty string"),
        });
    }
    Ok(())
}
