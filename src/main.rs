mod cli;

use ocbridge::{
    config,
    reconcile::ApplyConfigRequest,
    server::{self, AppContext},
};
use ocbridge_db::models::ServiceSettings;
use ocbridge_db::pool::{init_pool, DbPool};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn open_context(config: config::Config, config_path: Option<&Path>) -> Result<AppContext> {
    let db_path = config::database_path(&config, config_path);
    let db_path_str = db_path.to_string_lossy();
    tracing::info!("Initializing database at {}", db_path_str);
    let db_pool: DbPool = init_pool(&db_path_str)?;

    Ok(AppContext::new(config, db_pool))
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting ocbridge");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    if !config.server.auth.enabled {
        tracing::warn!("API authentication is disabled; anyone who can reach the server can change its configuration");
    }

    let ctx = open_context(config, config_path)?;
    let result = server::start_server(ctx).await;

    tracing::info!("Shutting down...");
    result
}

async fn apply(
    url: String,
    user: String,
    password: String,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let ctx = open_context(config, config_path)?;

    let request = ApplyConfigRequest {
        config: ServiceSettings::new(&url, &user, &password),
    };
    let result = ctx.reconciler.apply_config(request).await?;

    if result.message.is_error() {
        anyhow::bail!("{}", result.message.text);
    }

    println!("{}", result.message.text);
    for endpoint in ctx.reconciler.endpoints()? {
        println!("  {:<16} {}", endpoint.service_type, endpoint.service_url);
    }

    Ok(())
}

fn list_endpoints(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let ctx = open_context(config, config_path)?;

    let endpoints = ctx.reconciler.endpoints()?;
    if endpoints.is_empty() {
        println!("No endpoints registered. Run `ocbridge apply` first.");
        return Ok(());
    }

    for endpoint in endpoints {
        println!("{:<16} {}", endpoint.service_type, endpoint.service_url);
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "ocbridge=trace,ocbridge_db=debug,ocbridge_common=debug,tower_http=debug".to_string()
        } else {
            "ocbridge=debug,ocbridge_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Apply {
            url,
            user,
            password,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(apply(url, user, password, cli.config.as_deref()))
        }
        Commands::Endpoints => list_endpoints(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("ocbridge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Auth enabled: {}", config.server.auth.enabled);
            println!("  HTTP timeout: {}s", config.http.timeout_secs);
            println!("  Series cache TTL: {}s", config.cache.series_ttl_secs);
            println!(
                "  Database: {}",
                config::database_path(&config, Some(p)).display()
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
