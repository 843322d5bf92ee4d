//! npm registry client

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Looks up the latest published version of an npm package.
#[async_trait]
pub trait NpmRegistry: Send + Sync {
    /// The version the registry's `latest` dist-tag points at.
    async fn latest_version(&self, package_name: &str) -> Result<String>;
}

#[derive(Deserialize)]
struct VersionManifest {
    version: String,
}

/// npm registry client using reqwest
pub struct NpmClient {
    client: Client,
    base_url: String,
}

impl NpmClient {
    /// Client against the public npm registry.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_REGISTRY_URL)
    }

    /// Client against a different registry root (used by tests).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn manifest_url(&self, package_name: &str) -> String {
        format!(
            "{}/{}/latest",
            self.base_url,
            urlencoding::encode(package_name)
        )
    }
}

#[async_trait]
impl NpmRegistry for NpmClient {
    async fn latest_version(&self, package_name: &str) -> Result<String> {
        debug!(package_name, "fetching latest npm version");
        let manifest: VersionManifest = self
            .client
            .get(self.manifest_url(package_name))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if manifest.version.is_empty() {
            return Err(Error::MissingField {
                context: format!("npm package {package_name}"),
                field: "version".to_string(),
            });
        }
        debug!(package_name, version = %manifest.version, "got latest npm version");
        Ok(manifest.version)
    }
}
