use super::{RestClient, ServiceCredentials};
use ocbridge_common::{Error, Result, ServiceKind};
use serde::Deserialize;
use std::time::Duration;

/// One entry of the service registry listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RestComponent {
    #[serde(rename = "type")]
    pub service_type: String,
    pub host: String,
    pub path: String,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// A registry entry reduced to the URL to store and the kind to store it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub url: String,
    pub kind: String,
}

/// The registry emits a bare object instead of a list when only one service
/// is registered.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<RestComponent>),
    One(RestComponent),
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(default)]
    service: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
struct ServicesResponse {
    #[serde(default)]
    services: Option<ServiceList>,
}

/// Parse a `services.json` document into registry entries.
pub fn parse_services(body: &str) -> Result<Vec<RestComponent>> {
    let response: ServicesResponse = serde_json::from_str(body)
        .map_err(|e| Error::remote(format!("Invalid services response: {}", e)))?;

    let components = match response.services.and_then(|s| s.service) {
        Some(OneOrMany::Many(list)) => list,
        Some(OneOrMany::One(component)) => vec![component],
        None => Vec::new(),
    };

    Ok(components)
}

/// Reduce registry entries to storable descriptors.
///
/// Remote proxies, services bound to localhost, and hosts not served over
/// `scheme` are skipped. The URL is host plus path with any `docs` path
/// segment removed; the kind is the path without its leading slash.
pub fn retrieve_rest_services(components: &[RestComponent], scheme: &str) -> Vec<ServiceDescriptor> {
    let prefix = format!("{}://", scheme.to_lowercase());

    components
        .iter()
        .filter(|c| !c.service_type.contains("remote"))
        .filter(|c| !is_localhost(&c.host))
        .filter(|c| c.host.to_lowercase().starts_with(&prefix))
        .map(|c| ServiceDescriptor {
            url: format!("{}{}", c.host, strip_docs_segments(&c.path)),
            kind: c.path.strip_prefix('/').unwrap_or(&c.path).to_string(),
        })
        .collect()
}

fn strip_docs_segments(path: &str) -> String {
    path.split('/')
        .enumerate()
        .filter(|(i, segment)| *i == 0 || *segment != "docs")
        .map(|(_, segment)| segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Any host name starting with `localhost`, e.g. `localhost.localdomain`.
fn is_localhost(host: &str) -> bool {
    let host = host.trim().to_ascii_lowercase();
    let authority = host
        .split_once("://")
        .map_or(host.as_str(), |(_, rest)| rest);
    authority.starts_with("localhost")
}

/// Client for the service registry.
pub struct ServicesClient(RestClient);

impl ServicesClient {
    pub fn new(credentials: ServiceCredentials, timeout: Duration) -> Result<Self> {
        credentials.validate(ServiceKind::SERVICES)?;
        Ok(Self(RestClient::new(credentials, timeout)))
    }

    /// Fetch all registered services.
    pub async fn get_rest_components(&self) -> Result<Vec<RestComponent>> {
        let response = self.0.get("/services.json").await?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::remote(format!("Failed to read services response: {}", e)))?;

        parse_services(&body)
    }
}
