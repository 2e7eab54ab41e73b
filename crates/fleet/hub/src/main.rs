//! Fleet Hub daemon
//!
//! Accepts agent connections over gRPC and dispatches queued operations to
//! them.

use anyhow::Context;
use clap::Parser;
use fleet_hub::{serve, shutdown_signal, Hub, HubConfig};
use fleet_observability::init_tracing;
use tokio_util::sync::CancellationToken;

/// Fleet hub CLI
#[derive(Parser)]
#[command(name = "fleetd")]
#[command(about = "Fleet hub - dispatches cluster operations to agents", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FLEET_HUB_CONFIG")]
    config: Option<String>,

    /// gRPC listen address
    #[arg(short, long, env = "FLEET_HUB_LISTEN_ADDR")]
    listen: Option<String>,

    /// Number of dispatch workers
    #[arg(short, long, env = "FLEET_HUB_WORKERS")]
    workers: Option<usize>,

    /// Log level
    #[arg(long, env = "FLEET_HUB_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "FLEET_HUB_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = HubConfig::load(cli.config.as_deref()).context("loading configuration")?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.grpc_listen_addr = listen
            .parse()
            .with_context(|| format!("invalid listen address: {listen}"))?;
    }
    if let Some(workers) = cli.workers {
        config.orchestrator.workers = workers;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }

    init_tracing(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.grpc_listen_addr,
        workers = config.orchestrator.workers,
        tls = config.server.tls.is_some(),
        "Starting fleetd"
    );

    let hub = Hub::new(&config);
    let ctx = CancellationToken::new();
    hub.start(ctx.clone())?;

    let served = serve(&hub, &config.server, shutdown_signal()).await;

    tracing::info!("fleetd shutting down");
    hub.stop().await;
    ctx.cancel();

    served?;
    Ok(())
}
