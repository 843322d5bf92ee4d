//! Release tags, version strings, and download URL construction

use crate::error::{Error, Result};

/// Strip the configured prefix from a release tag to get the version.
///
/// Fails when the tag does not start with the prefix, and when stripping
/// leaves nothing (a tag equal to its prefix carries no version).
pub fn version_from_tag(tag: &str, prefix: &str) -> Result<String> {
    let version = tag.strip_prefix(prefix).ok_or_else(|| Error::InvalidTagPrefix {
        tag: tag.to_string(),
        prefix: prefix.to_string(),
    })?;
    if version.is_empty() {
        return Err(Error::EmptyVersion {
            tag: tag.to_string(),
        });
    }
    Ok(version.to_string())
}

/// Source tarball for a tagged GitHub release.
pub fn github_tarball_url(owner: &str, repo: &str, tag: &str) -> String {
    format!("https://github.com/{owner}/{repo}/archive/refs/tags/{tag}.tar.gz")
}

/// One prebuilt asset attached to a tagged GitHub release.
pub fn github_asset_url(owner: &str, repo: &str, tag: &str, asset: &str) -> String {
    format!("https://github.com/{owner}/{repo}/releases/download/{tag}/{asset}")
}

/// Published tarball for an npm package version.
///
/// The registry serves scoped packages under their literal name here, so the
/// name is not percent-encoded.
pub fn npm_tarball_url(package_name: &str, version: &str) -> String {
    format!("https://registry.npmjs.org/{package_name}/-/{package_name}-{version}.tgz")
}
