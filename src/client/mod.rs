//! REST clients for the Opencast media server.

pub mod mediapackage;
pub mod services;
pub mod sysinfo;

pub use mediapackage::{MediaPackage, MediaPackageClient};
pub use services::{retrieve_rest_services, RestComponent, ServiceDescriptor, ServicesClient};
pub use sysinfo::SysinfoClient;

use ocbridge_common::{ConfigId, Error, Result, ServiceKind};
use ocbridge_db::queries;
use reqwest::{Client, Response, StatusCode};
use rusqlite::Connection;
use std::time::Duration;

/// Default timeout for media server requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URL and credentials for one remote service.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredentials {
    pub service_url: String,
    pub service_user: String,
    pub service_password: String,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("service_url", &self.service_url)
            .field("service_user", &self.service_user)
            .field("service_password", &"<redacted>")
            .finish()
    }
}

impl ServiceCredentials {
    pub fn new(service_url: &str, service_user: &str, service_password: &str) -> Self {
        Self {
            service_url: service_url.trim_end_matches('/').to_string(),
            service_user: service_user.to_string(),
            service_password: service_password.to_string(),
        }
    }

    /// Resolve the credentials for `kind` from the stored configuration: the
    /// endpoint URL discovered for that kind plus the configured user and
    /// password.
    pub fn resolve(conn: &Connection, config_id: ConfigId, kind: &ServiceKind) -> Result<Self> {
        let record = queries::config::find_config(conn, config_id)?
            .ok_or_else(|| Error::configuration(kind.as_str()))?;
        let endpoint = queries::endpoints::get_endpoint(conn, config_id, kind)?
            .ok_or_else(|| Error::configuration(kind.as_str()))?;

        Ok(Self::new(
            &endpoint.service_url,
            &record.config.user,
            &record.config.password,
        ))
    }

    /// Reject credentials whose base URL is empty or not absolute.
    fn validate(&self, service: &str) -> Result<()> {
        match url::Url::parse(&self.service_url) {
            Ok(url) if url.has_host() => Ok(()),
            _ => Err(Error::configuration(service)),
        }
    }
}

/// Authenticated HTTP access to one service base URL.
pub struct RestClient {
    client: Client,
    credentials: ServiceCredentials,
}

impl RestClient {
    pub fn new(credentials: ServiceCredentials, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.credentials.service_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.credentials.service_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        let response = self
            .client
            .get(self.url(path))
            .basic_auth(
                &self.credentials.service_user,
                Some(&self.credentials.service_password),
            )
            .send()
            .await
            .map_err(|e| Error::remote(format!("GET {} failed: {}", path, e)))?;

        self.check_status(path, response)
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Response> {
        let response = self
            .client
            .post(self.url(path))
            .basic_auth(
                &self.credentials.service_user,
                Some(&self.credentials.service_password),
            )
            .form(form)
            .send()
            .await
            .map_err(|e| Error::remote(format!("POST {} failed: {}", path, e)))?;

        self.check_status(path, response)
    }

    fn check_status(&self, path: &str, response: Response) -> Result<Response> {
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::access_denied(self.base_url()))
            }
            status if !status.is_success() => {
                Err(Error::remote(format!("{} returned {}", path, status)))
            }
            _ => Ok(response),
        }
    }
}

/// The two registry calls configuration reconciliation needs.
#[async_trait::async_trait]
pub trait OpencastApi: Send + Sync {
    /// Version of the media server rooted at `credentials.service_url`.
    async fn base_version(&self, credentials: &ServiceCredentials) -> Result<Option<String>>;

    /// Raw registry entries from the services endpoint at
    /// `credentials.service_url`.
    async fn rest_components(&self, credentials: &ServiceCredentials)
        -> Result<Vec<RestComponent>>;
}

/// [`OpencastApi`] over HTTP.
pub struct HttpOpencastApi {
    timeout: Duration,
}

impl HttpOpencastApi {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpOpencastApi {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait::async_trait]
impl OpencastApi for HttpOpencastApi {
    async fn base_version(&self, credentials: &ServiceCredentials) -> Result<Option<String>> {
        SysinfoClient::new(credentials.clone(), self.timeout)
            .get_base_version()
            .await
    }

    async fn rest_components(
        &self,
        credentials: &ServiceCredentials,
    ) -> Result<Vec<RestComponent>> {
        ServicesClient::new(credentials.clone(), self.timeout)?
            .get_rest_components()
            .await
    }
}
