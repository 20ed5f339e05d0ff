//! Configuration reconciliation.
//!
//! Every configuration save stores the submitted settings, queries the media
//! server's version and service registry, and rewrites the endpoint table to
//! match. Each run ends in exactly one [`Outcome`] and one [`StatusMessage`].

use crate::cache::{Cache, ALL_SERIES_KEY};
use crate::client::{retrieve_rest_services, OpencastApi, ServiceCredentials};
use ocbridge_common::{ConfigId, Result, ServiceKind, StatusMessage};
use ocbridge_db::models::{ConfigRecord, Endpoint, ServiceSettings};
use ocbridge_db::pool::{get_conn, DbPool};
use ocbridge_db::queries;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Payload of a configuration save.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyConfigRequest {
    pub config: ServiceSettings,
}

/// Terminal state of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The URL has no scheme; no network call was made.
    InvalidUrl,
    /// The media server rejected the credentials.
    CredentialFailure,
    /// The registry could not be read or listed no usable service.
    NoServices,
    /// At least one recognized service was registered.
    ServicesFound { registered: usize },
}

impl Outcome {
    /// Whether cached series data is cleared after this outcome.
    ///
    /// A credential failure returns before the clear, so stale series data
    /// survives until the next save or TTL expiry.
    pub fn clears_series_cache(&self) -> bool {
        !matches!(self, Self::CredentialFailure)
    }
}

/// Result handed back to the caller for display.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyResult {
    pub config: ConfigRecord,
    pub message: StatusMessage,
    #[serde(skip)]
    pub outcome: Outcome,
}

/// `scheme://host[:port]` of `url`, or `None` when the URL has no scheme or
/// no host.
pub fn service_root(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;
    let scheme = parsed.scheme().to_string();

    let root = match parsed.port() {
        Some(port) => format!("{}://{}:{}", scheme, host, port),
        None => format!("{}://{}", scheme, host),
    };
    Some((scheme, root))
}

pub struct ConfigReconciler {
    pool: DbPool,
    cache: Cache,
    api: Arc<dyn OpencastApi>,
    config_id: ConfigId,
}

impl ConfigReconciler {
    pub fn new(pool: DbPool, cache: Cache, api: Arc<dyn OpencastApi>) -> Self {
        Self {
            pool,
            cache,
            api,
            config_id: ConfigId::SINGLETON,
        }
    }

    pub fn config_id(&self) -> ConfigId {
        self.config_id
    }

    /// Store `request` and reconcile the endpoint table against the server.
    ///
    /// Remote failures become an error message; only database failures are
    /// returned as `Err`.
    pub async fn apply_config(&self, request: ApplyConfigRequest) -> Result<ApplyResult> {
        let mut record = {
            let conn = get_conn(&self.pool)?;
            queries::config::store_config(&conn, self.config_id, &request.config)?
        };

        self.cache.expire(ALL_SERIES_KEY);

        let (outcome, message) = self.reconcile_endpoints(&mut record).await?;

        if outcome.clears_series_cache() {
            self.cache.clear_cached_series_data();
        } else {
            tracing::warn!("Series cache left intact after credential failure");
        }

        tracing::info!(outcome = ?outcome, "Configuration applied: {}", message.text);

        Ok(ApplyResult {
            config: record,
            message,
            outcome,
        })
    }

    async fn reconcile_endpoints(
        &self,
        record: &mut ConfigRecord,
    ) -> Result<(Outcome, StatusMessage)> {
        let Some((scheme, root)) = service_root(&record.config.url) else {
            let conn = get_conn(&self.pool)?;
            queries::endpoints::delete_endpoints(&conn, self.config_id)?;
            return Ok((
                Outcome::InvalidUrl,
                StatusMessage::error(format!("Invalid URL scheme: \"{}\"", record.config.url)),
            ));
        };

        let root_credentials =
            ServiceCredentials::new(&root, &record.config.user, &record.config.password);

        let version = match self.api.base_version(&root_credentials).await {
            Ok(version) => version,
            Err(e) if e.is_access_denied() => return self.credential_failure(&root),
            Err(e) => {
                tracing::warn!("Version request to {} failed: {}", root, e);
                None
            }
        };

        let services_credentials = {
            let conn = get_conn(&self.pool)?;
            queries::endpoints::delete_endpoints(&conn, self.config_id)?;

            record.config.version = version;
            *record = queries::config::store_config(&conn, self.config_id, &record.config)?;

            queries::endpoints::set_endpoint(
                &conn,
                self.config_id,
                &format!("{}/services", root),
                &ServiceKind::services(),
            )?;

            ServiceCredentials::resolve(&conn, self.config_id, &ServiceKind::services())?
        };

        let components = match self.api.rest_components(&services_credentials).await {
            Ok(components) => components,
            Err(e) if e.is_access_denied() => return self.credential_failure(&root),
            Err(e) => {
                tracing::warn!("Service registry at {} unavailable: {}", root, e);
                Vec::new()
            }
        };

        if components.is_empty() {
            self.remove_services_endpoint()?;
            return Ok((
                Outcome::NoServices,
                StatusMessage::error(format!(
                    "No endpoints found for the Opencast installation at \"{}\". \
                     Please check the entered data.",
                    root
                )),
            ));
        }

        let mut registered = HashSet::new();
        {
            let conn = get_conn(&self.pool)?;
            for service in retrieve_rest_services(&components, &scheme) {
                let kind = ServiceKind::new(&service.kind);
                if kind.is_recognized() {
                    queries::endpoints::set_endpoint(&conn, self.config_id, &service.url, &kind)?;
                    registered.insert(kind);
                } else {
                    tracing::debug!("Ignoring unrecognized service {}", service.kind);
                }
            }
        }

        if registered.is_empty() {
            self.remove_services_endpoint()?;
            return Ok((
                Outcome::NoServices,
                StatusMessage::error(format!(
                    "No endpoints found for the Opencast installation at \"{}\". \
                     Please check the entered data, paying attention to http vs https \
                     and whether your Opencast installation supports https.",
                    root
                )),
            ));
        }

        Ok((
            Outcome::ServicesFound {
                registered: registered.len(),
            },
            StatusMessage::success(format!(
                "The Opencast installation \"{}\" was configured successfully.",
                root
            )),
        ))
    }

    fn credential_failure(&self, root: &str) -> Result<(Outcome, StatusMessage)> {
        tracing::warn!("Media server at {} rejected the configured credentials", root);
        self.remove_services_endpoint()?;
        Ok((
            Outcome::CredentialFailure,
            StatusMessage::error(format!(
                "Invalid credentials for the Opencast installation at \"{}\". \
                 Please check the entered data.",
                root
            )),
        ))
    }

    fn remove_services_endpoint(&self) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        queries::endpoints::remove_endpoint(&conn, self.config_id, &ServiceKind::services())?;
        Ok(())
    }

    /// Current configuration record, if one has been saved.
    pub fn current_config(&self) -> Result<Option<ConfigRecord>> {
        let conn = get_conn(&self.pool)?;
        queries::config::find_config(&conn, self.config_id)
    }

    /// Endpoints currently registered for the configuration.
    pub fn endpoints(&self) -> Result<Vec<Endpoint>> {
        let conn = get_conn(&self.pool)?;
        queries::endpoints::list_endpoints(&conn, self.config_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RestComponent;
    use assert_matches::assert_matches;
    use ocbridge_common::MessageType;
    use ocbridge_db::pool::init_memory_pool;
    use fake::FakeApi;
    use ocbridge_common::Error;

    /// Scripted [`OpencastApi`] double.
    mod fake {
        use super::*;
        use std::sync::Mutex;

        pub struct FakeApi {
            pub version: Result<Option<String>>,
            pub components: Result<Vec<RestComponent>>,
            pub calls: Mutex<Vec<String>>,
        }

        fn clone_result<T: Clone>(r: &Result<T>) -> Result<T> {
            match r {
                Ok(v) => Ok(v.clone()),
                Err(Error::AccessDenied(h)) => Err(Error::access_denied(h.clone())),
                Err(e) => Err(Error::remote(e.to_string())),
            }
        }

        #[async_trait::async_trait]
        impl OpencastApi for FakeApi {
            async fn base_version(&self, c: &ServiceCredentials) -> Result<Option<String>> {
                self.calls
                    .lock()
                    .unwrap()
                    .push(format!("version {}", c.service_url));
                clone_result(&self.version)
            }

            async fn rest_components(
                &self,
                c: &ServiceCredentials,
            ) -> Result<Vec<RestComponent>> {
                self.calls
                    .lock()
                    .unwrap()
                    .push(format!("services {}", c.service_url));
                clone_result(&self.components)
            }
        }
    }

    fn component(host: &str, path: &str) -> RestComponent {
        RestComponent {
            service_type: format!("org.opencastproject{}", path.replace('/', ".")),
            host: host.to_string(),
            path: path.to_string(),
            online: Some(true),
            active: Some(true),
        }
    }

    fn reconciler(api: FakeApi) -> (ConfigReconciler, Arc<FakeApi>, Cache) {
        let pool = init_memory_pool().unwrap();
        let cache = Cache::default();
        let api = Arc::new(api);
        (
            ConfigReconciler::new(pool, cache.clone(), api.clone()),
            api,
            cache,
        )
    }

    fn request(url: &str) -> ApplyConfigRequest {
        ApplyConfigRequest {
            config: ServiceSettings::new(url, "admin", "opencast"),
        }
    }

    #[test]
    fn test_service_root() {
        assert_eq!(
            service_root("https://oc.example.org/admin-ng/index.html"),
            Some(("https".to_string(), "https://oc.example.org".to_string()))
        );
        assert_eq!(
            service_root("http://oc.example.org:8080/"),
            Some(("http".to_string(), "http://oc.example.org:8080".to_string()))
        );
        assert_eq!(service_root("oc.example.org"), None);
        assert_eq!(service_root(""), None);
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_calls() {
        let (reconciler, api, _) = reconciler(FakeApi {
            version: Ok(Some("13.4".to_string())),
            components: Ok(vec![]),
            calls: Default::default(),
        });

        let result = reconciler.apply_config(request("oc.example.org")).await.unwrap();

        assert_eq!(result.outcome, Outcome::InvalidUrl);
        assert_eq!(result.message.kind, MessageType::Error);
        assert!(result.message.text.contains("oc.example.org"));
        assert!(api.calls.lock().unwrap().is_empty());
        assert!(reconciler.endpoints().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_services_found() {
        let host = "https://oc.example.org";
        let (reconciler, api, _) = reconciler(FakeApi {
            version: Ok(Some("13.4".to_string())),
            components: Ok(vec![
                component(host, "/services"),
                component(host, "/ingest"),
                component(host, "/Search"),
                component(host, "/videoeditor"),
            ]),
            calls: Default::default(),
        });

        let result = reconciler.apply_config(request(host)).await.unwrap();

        assert_matches!(result.outcome, Outcome::ServicesFound { registered: 3 });
        assert_eq!(result.message.kind, MessageType::Success);
        assert_eq!(result.config.config.version.as_deref(), Some("13.4"));

        let endpoints = reconciler.endpoints().unwrap();
        let urls: Vec<_> = endpoints.iter().map(|e| e.service_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://oc.example.org/ingest",
                "https://oc.example.org/Search",
                "https://oc.example.org/services",
            ]
        );

        let calls = api.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                "version https://oc.example.org".to_string(),
                "services https://oc.example.org/services".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_version_credential_failure_keeps_other_endpoints() {
        let (reconciler, _, _) = reconciler(FakeApi {
            version: Err(Error::access_denied("https://oc.example.org")),
            components: Ok(vec![]),
            calls: Default::default(),
        });

        {
            let conn = get_conn(&reconciler.pool).unwrap();
            queries::config::store_config(
                &conn,
                ConfigId::SINGLETON,
                &ServiceSettings::new("https://oc.example.org", "admin", "old"),
            )
            .unwrap();
            queries::endpoints::set_endpoint(
                &conn,
                ConfigId::SINGLETON,
                "https://oc.example.org/ingest",
                &ServiceKind::new("ingest"),
            )
            .unwrap();
            queries::endpoints::set_endpoint(
                &conn,
                ConfigId::SINGLETON,
                "https://oc.example.org/services",
                &ServiceKind::services(),
            )
            .unwrap();
        }

        let result = reconciler
            .apply_config(request("https://oc.example.org"))
            .await
            .unwrap();

        assert_eq!(result.outcome, Outcome::CredentialFailure);
        assert!(result.message.is_error());

        let kinds: Vec<_> = reconciler
            .endpoints()
            .unwrap()
            .into_iter()
            .map(|e| e.service_type.to_string())
            .collect();
        assert_eq!(kinds, vec!["ingest".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_version_check_continues() {
        let (reconciler, _, _) = reconciler(FakeApi {
            version: Err(Error::remote("timeout")),
            components: Ok(vec![component("https://oc.example.org", "/services")]),
            calls: Default::default(),
        });

        let result = reconciler
            .apply_config(request("https://oc.example.org"))
            .await
            .unwrap();

        assert_matches!(result.outcome, Outcome::ServicesFound { registered: 1 });
        assert_eq!(result.config.config.version, None);
    }

    #[test]
    fn test_outcome_cache_rule() {
        assert!(Outcome::InvalidUrl.clears_series_cache());
        assert!(Outcome::NoServices.clears_series_cache());
        assert!(Outcome::ServicesFound { registered: 1 }.clears_series_cache());
        assert!(!Outcome::CredentialFailure.clears_series_cache());
    }
}
