#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod config;
mod logging;
mod shutdown;
mod telemetry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use add::{GatewayState, Service, router};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

/// Add gateway: `sum` and `concat` over HTTP/JSON
#[derive(Parser)]
#[command(name = "add-server")]
#[command(about = "Add gateway: sum and concat over HTTP/JSON")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address override (e.g. 0.0.0.0:8080)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.bind, cli.verbose);

    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let (otel_layer, provider) = match telemetry::init_tracing(&config.tracing)? {
        Some((layer, provider)) => (Some(layer), Some(provider)),
        None => (None, None),
    };
    logging::init_logging(&config.logging, otel_layer)?;

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    };

    if let Some(provider) = provider {
        telemetry::shutdown_tracing(&provider);
    }
    result
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("configuration is valid");
    println!("{}", config.to_json()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    let service = Arc::new(Service::new(config.gateway.max_concat_len));
    let state = GatewayState::build(service, &config.gateway)?;
    let app = router(Arc::new(state));

    let listener = TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        require_token = config.gateway.require_token,
        "add gateway listening"
    );

    let cancel = CancellationToken::new();
    let cancel_for_signals = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = shutdown::wait_for_shutdown().await {
            tracing::warn!(error = %e, "signal handling failed, falling back to ctrl_c()");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "ctrl_c() failed, shutting down");
            }
        }
        cancel_for_signals.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("server error")?;

    tracing::info!("add gateway stopped");
    Ok(())
}
