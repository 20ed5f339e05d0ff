use super::{RestClient, ServiceCredentials};
use ocbridge_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct BundleVersion {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(default)]
    consistent: Option<bool>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    versions: Vec<BundleVersion>,
}

/// Extract the server version from a bundle version document.
///
/// A consistent installation reports one `version`; an inconsistent one
/// reports a `versions` list, whose first entry is taken.
pub fn parse_version(body: &str) -> Result<Option<String>> {
    let response: VersionResponse = serde_json::from_str(body)
        .map_err(|e| Error::remote(format!("Invalid version response: {}", e)))?;

    if response.consistent == Some(false) {
        tracing::warn!("Media server reports inconsistent bundle versions");
    }

    Ok(response
        .version
        .or_else(|| response.versions.into_iter().find_map(|v| v.version)))
}

/// Client for the system information service at the server root.
pub struct SysinfoClient(RestClient);

impl SysinfoClient {
    pub fn new(credentials: ServiceCredentials, timeout: Duration) -> Self {
        Self(RestClient::new(credentials, timeout))
    }

    /// Version of the installed media server bundles.
    pub async fn get_base_version(&self) -> Result<Option<String>> {
        let response = self
            .0
            .get("/sysinfo/bundles/version?prefix=opencast")
            .await?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::remote(format!("Failed to read version response: {}", e)))?;

        parse_version(&body)
    }
}
