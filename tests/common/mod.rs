//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, default config and
//! a full [`AppContext`]. The [`TestHarness::with_server`] constructor starts
//! Axum on a random port for HTTP-level testing, and the `mock_*` helpers
//! script a media server on a [`MockServer`].

#![allow(dead_code)]

use std::net::SocketAddr;

use ocbridge::config::Config;
use ocbridge::reconcile::{ApplyConfigRequest, ApplyResult};
use ocbridge::server::{create_router, AppContext};
use ocbridge_db::models::ServiceSettings;
use ocbridge_db::pool::{init_memory_pool, DbPool};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER: &str = "admin";
pub const PASSWORD: &str = "opencast";
/// `Basic` credentials for [`USER`]:[`PASSWORD`].
pub const BASIC_AUTH: &str = "Basic YWRtaW46b3BlbmNhc3Q=";

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone());
        Self { ctx, db }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(test_config()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Save settings pointing at `url` with the test credentials.
    pub async fn apply(&self, url: &str) -> ApplyResult {
        self.ctx
            .reconciler
            .apply_config(ApplyConfigRequest {
                config: ServiceSettings::new(url, USER, PASSWORD),
            })
            .await
            .expect("apply_config failed")
    }

    /// Registered endpoints as `(kind, url)` pairs, ordered by kind.
    pub fn endpoints(&self) -> Vec<(String, String)> {
        self.ctx
            .reconciler
            .endpoints()
            .expect("failed to list endpoints")
            .into_iter()
            .map(|e| (e.service_type.to_string(), e.service_url))
            .collect()
    }
}

/// Default config with a short media server timeout.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.http.timeout_secs = 5;
    config
}

/// One registry entry for `path` served from `host`.
pub fn service(host: &str, path: &str) -> Value {
    json!({
        "type": format!("org.opencastproject{}", path.replace('/', ".")),
        "host": host,
        "path": path,
        "online": true,
        "active": true,
    })
}

/// A `services.json` document listing `entries`.
pub fn services_body(entries: Vec<Value>) -> Value {
    json!({ "services": { "service": entries } })
}

pub async fn mock_version(server: &MockServer, version: &str) {
    Mock::given(method("GET"))
        .and(path("/sysinfo/bundles/version"))
        .and(query_param("prefix", "opencast"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "consistent": true,
            "version": version,
        })))
        .mount(server)
        .await;
}

pub async fn mock_version_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/sysinfo/bundles/version"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub async fn mock_services(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/services/services.json"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mock_services_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/services/services.json"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mount version and registry mocks advertising `paths` on the mock server
/// itself.
pub async fn mock_opencast(server: &MockServer, paths: &[&str]) {
    let host = server.uri();
    mock_version(server, "13.4").await;
    mock_services(
        server,
        services_body(paths.iter().map(|p| service(&host, p)).collect()),
    )
    .await;
}
