use crate::cache::Cache;
use crate::client::HttpOpencastApi;
use crate::config::Config;
use crate::reconcile::ConfigReconciler;
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use ocbridge_db::pool::DbPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod error;
pub mod routes_config;
pub mod routes_mediapackage;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub db_pool: DbPool,
    pub cache: Cache,
    pub reconciler: Arc<ConfigReconciler>,
}

impl AppContext {
    /// Wire a context talking to the real media server.
    pub fn new(config: Config, db_pool: DbPool) -> Self {
        let cache = Cache::new(Duration::from_secs(config.cache.series_ttl_secs));
        let api = Arc::new(HttpOpencastApi::new(http_timeout(&config)));
        let reconciler = Arc::new(ConfigReconciler::new(db_pool.clone(), cache.clone(), api));

        Self {
            config: Arc::new(config),
            db_pool,
            cache,
            reconciler,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        http_timeout(&self.config)
    }
}

fn http_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.http.timeout_secs)
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&ctx.config.server.cors_origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes(&ctx))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Configured CORS origins; unparsable entries are skipped.
fn allowed_origins(origins: &[String]) -> AllowOrigin {
    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim_end_matches('/')) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();
    AllowOrigin::list(values)
}

fn api_routes(ctx: &AppContext) -> Router<AppContext> {
    let routes =
        routes_config::config_routes().merge(routes_mediapackage::mediapackage_routes());

    // Apply auth middleware only if enabled
    if ctx.config.server.auth.enabled {
        routes.layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::api_auth_middleware,
        ))
    } else {
        routes
    }
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(ctx: AppContext) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
