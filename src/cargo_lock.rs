//! Extraction of vendored git dependencies from a Cargo lockfile
//!
//! The fixed-output hash map in an update record is keyed per crate
//! (`name-version`), but the build fetches one git checkout per unique
//! repository revision. The grouping here ties those two views together: every
//! crate vendored from the same checkout shares that checkout's derivation
//! name and therefore its hash.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

/// One crate pinned to a git source in the upstream lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitDependency {
    /// Crate name.
    pub name: String,
    /// Crate version.
    pub version: String,
    /// Repository URL with the `git+` scheme prefix, query, and fragment removed.
    pub url: String,
    /// Full revision the source is pinned to.
    pub rev: String,
    /// Derivation name of the fetched checkout: `<repo-name>-<rev[..7]>`.
    pub derivation_name: String,
}

impl GitDependency {
    /// Key this dependency uses in the record's fixed-output hash map.
    pub fn hash_key(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

#[derive(Deserialize)]
struct Lockfile {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
    #[serde(default)]
    source: Option<String>,
}

/// Parse lockfile text and keep only git-sourced packages.
///
/// Registry and path sources have no per-checkout fixed-output hash and are
/// skipped. `context` names the lockfile in parse errors.
pub fn parse_git_dependencies(text: &str, context: &str) -> Result<Vec<GitDependency>> {
    let lockfile: Lockfile = toml::from_str(text).map_err(|err| Error::InvalidLockfile {
        context: context.to_string(),
        detail: err.to_string(),
    })?;

    Ok(lockfile
        .package
        .into_iter()
        .filter_map(|package| {
            let (url, rev) = parse_git_source(package.source.as_deref()?)?;
            let derivation_name = format!("{}-{}", repo_name(&url), short_rev(&rev));
            Some(GitDependency {
                name: package.name,
                version: package.version,
                url,
                rev,
                derivation_name,
            })
        })
        .collect())
}

/// Group hash-map keys by the derivation that fetches them.
///
/// Keys within a group are sorted; the map itself is ordered by derivation
/// name so seeded records come out deterministic.
pub fn group_hash_keys(deps: &[GitDependency]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for dep in deps {
        groups
            .entry(dep.derivation_name.clone())
            .or_default()
            .push(dep.hash_key());
    }
    for keys in groups.values_mut() {
        keys.sort();
    }
    groups
}

fn parse_git_source(source: &str) -> Option<(String, String)> {
    let raw = source.strip_prefix("git+")?;
    let parsed = Url::parse(raw).ok()?;
    let rev = parsed.fragment()?.to_string();
    if rev.is_empty() {
        return None;
    }
    let mut base = parsed;
    base.set_fragment(None);
    base.set_query(None);
    Some((base.to_string(), rev))
}

fn repo_name(url: &str) -> String {
    let tail = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            let segment = parsed
                .path_segments()?
                .filter(|segment| !segment.is_empty())
                .next_back()
                .map(ToString::to_string);
            segment.or_else(|| parsed.host_str().map(ToString::to_string))
        })
        .unwrap_or_else(|| url.to_string());
    tail.strip_suffix(".git").unwrap_or(&tail).to_string()
}

fn short_rev(rev: &str) -> String {
    rev.chars().take(7).collect()
}
