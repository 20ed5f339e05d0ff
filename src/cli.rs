use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ocbridge")]
#[command(author, version, about = "Opencast configuration and REST bridge")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Start {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Save the Opencast connection settings and discover its endpoints
    Apply {
        /// Opencast base URL, including the scheme
        #[arg(long)]
        url: String,

        /// API user
        #[arg(long)]
        user: String,

        /// API password
        #[arg(long, env = "OCBRIDGE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List the endpoints discovered by the last apply
    Endpoints,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
