//! Fleet agent binary

use anyhow::Context;
use clap::Parser;
use fleet_agent::{AgentConfig, AgentRuntime, DryRunHandler, GrpcHubClient, StaticInspector};
use fleet_observability::init_tracing;
use fleet_types::HandlerSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fleet agent CLI
#[derive(Parser)]
#[command(name = "fleet-agent")]
#[command(about = "Fleet agent - executes hub operations in one cluster", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FLEET_AGENT_CONFIG")]
    config: Option<String>,

    /// Hub gRPC endpoint
    #[arg(long, env = "FLEET_AGENT_HUB_ENDPOINT")]
    hub_endpoint: Option<String>,

    /// Log level
    #[arg(long, env = "FLEET_AGENT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "FLEET_AGENT_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AgentConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(endpoint) = cli.hub_endpoint {
        config.hub_endpoint = endpoint;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }

    init_tracing(&config.logging)?;

    let client = Arc::new(GrpcHubClient::connect(&config)?);
    let inspector = Arc::new(StaticInspector::from(&config.cluster));
    let handlers = HandlerSet::uniform(Arc::new(DryRunHandler));
    let runtime = AgentRuntime::new(config, client, inspector, handlers);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        cluster_name = %runtime.cluster_name(),
        "Starting fleet-agent"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    runtime.run(shutdown).await?;
    tracing::info!("fleet-agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received terminate signal, shutting down"),
    }
}
