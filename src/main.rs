mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use qabot::config::QabotConfig;
use qabot::server;

#[derive(Parser)]
#[command(name = "qabot", version, about = "Chat service that learns from its conversations")]
struct Cli {
    /// Path to a TOML config file (default: ~/.qabot/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Verbose logging and per-request tracing
        #[arg(long)]
        debug: bool,
    },
    /// Print knowledge store statistics
    Stats,
    /// Print every learned Q/A pair as JSON, most used first
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let mut config = match &cli.config {
        Some(path) => QabotConfig::load_from(path)?,
        None => QabotConfig::load()?,
    };

    if let Command::Serve { host, port, debug } = &cli.command {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
        if *debug {
            config.server.debug = true;
        }
    }

    // Debug mode lowers the default filter unless a level was set explicitly.
    let level = if config.server.debug && config.server.log_level == "info" {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { .. } => server::serve(config).await?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Export => cli::export::export(&config)?,
    }

    Ok(())
}
