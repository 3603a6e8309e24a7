//! Authenticated reverse-proxy gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                  GATEWAY                     │
//!                     │                                              │
//!   Browser request   │  ┌───────────┐   ┌──────────┐   ┌─────────┐ │
//!   ──────────────────┼─▶│route guard│──▶│  header  │──▶│forwarder│─┼──▶ Backend
//!                     │  │ (session) │   │  policy  │   │         │ │     API
//!                     │  └───────────┘   │ + token  │   └────┬────┘ │
//!                     │                  └──────────┘        │      │
//!   Browser response  │  ┌──────┐   ┌───────────────┐        │      │
//!   ◀─────────────────┼──│ CORS │◀──│   response    │◀───────┘      │
//!                     │  └──────┘   │  normalizer   │               │
//!                     │             └───────────────┘               │
//!                     │  ┌────────────────────────────────────────┐ │
//!                     │  │ config · identity client · metrics ·   │ │
//!                     │  │ lifecycle                              │ │
//!                     │  └────────────────────────────────────────┘ │
//!                     └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_gateway::config::{apply_env_overrides, load_config};
use portal_gateway::{GatewayConfig, GatewayServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "portal-gateway", about = "Authenticated reverse-proxy gateway")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("portal-gateway v0.1.0 starting");

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    apply_env_overrides(&mut config);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.base_url,
        fallback = ?config.identity.fallback,
        request_timeout_secs = config.timeouts.request_secs,
        "configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "listening for connections"
    );

    // Initialize metrics server
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            portal_gateway::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            );
        }
    }

    // Ctrl+C triggers graceful shutdown.
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            shutdown.trigger();
        }
    });

    // Create and run the gateway server
    let server = GatewayServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
