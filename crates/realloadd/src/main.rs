//! realloadd — the real-load scoring daemon.
//!
//! Runs the `CpuRealUsage` plugin out of process:
//! - Load sampler (periodic Prometheus instant query)
//! - Scoring API for the placement engine
//! - Prometheus exposition of the cached loads
//!
//! # Usage
//!
//! ```text
//! realloadd run --config /etc/realload/realload.toml
//! realloadd run --prometheus-addr http://prometheus:9090 --interval 30 --timeout 10
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};

use realload_core::{PluginArgs, RealloadConfig, ServerConfig};
use realload_plugin::CpuRealUsage;

#[derive(Parser)]
#[command(name = "realloadd", about = "Real-load node scoring daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the sampler and serve the scoring API.
    Run {
        /// Path to realload.toml. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Prometheus base URL. Empty disables sampling.
        #[arg(long)]
        prometheus_addr: Option<String>,

        /// Seconds between sampling cycles.
        #[arg(long)]
        interval: Option<u64>,

        /// Per-query timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Address for the scoring API.
        #[arg(long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,realloadd=debug,realload=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            prometheus_addr,
            interval,
            timeout,
            listen,
        } => {
            let mut config = match config {
                Some(path) => RealloadConfig::from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => RealloadConfig {
                    plugin: PluginArgs::new("", 30, 10),
                    server: ServerConfig::default(),
                },
            };
            if let Some(addr) = prometheus_addr {
                config.plugin.prometheus_api_addr = addr;
            }
            if let Some(secs) = interval {
                config.plugin.query_metric_interval_seconds = secs;
            }
            if let Some(secs) = timeout {
                config.plugin.query_metric_time_seconds = secs;
            }
            if let Some(addr) = listen {
                config.server.listen = addr;
            }

            run(config).await
        }
    }
}

async fn run(config: RealloadConfig) -> anyhow::Result<()> {
    info!("realload daemon starting");

    // Bad plugin arguments are fatal.
    let plugin = Arc::new(CpuRealUsage::new(config.plugin).context("invalid plugin arguments")?);
    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {:?}", config.server.listen))?;

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let sampler_handle = plugin.spawn_sampler(shutdown_rx);

    // ── Start API server ───────────────────────────────────────

    let router = realload_api::build_router(Arc::clone(&plugin));
    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c, shutting down");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for the sampler to stop.
    let _ = sampler_handle.await;

    info!("realload daemon stopped");
    Ok(())
}
