//! Server mode CLI logic
//!
//! Contains the core logic for running the HTTP server mode.

use crate::{Settings, config::ConfigLoader, server::app, utils::version};
use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Arguments for server mode
#[derive(Debug, Default)]
pub struct ServerArgs {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub config: Option<String>,
    pub channel: Option<String>,
    pub verbose: bool,
}

/// Resolve settings from every source and validate them
///
/// Precedence, highest first: command line, environment, configuration file
/// (from `--config`, TWITCH_STATUS_CONFIG or the default location), defaults.
pub fn resolve_settings(args: &ServerArgs) -> crate::Result<Settings> {
    let config_path = match &args.config {
        Some(config) => Some(std::path::PathBuf::from(config)),
        None => ConfigLoader::get_config_path(),
    };

    let mut settings = ConfigLoader::new().load_unvalidated(config_path.as_deref())?;

    if let Some(host) = &args.host {
        settings.server.host = host.clone();
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(channel) = &args.channel {
        settings.twitch.channel = Some(channel.clone());
    }
    settings.logging.verbose = args.verbose;

    settings.validate()?;
    Ok(settings)
}

/// Pick the log filter
///
/// `--verbose` wins over RUST_LOG, which wins over `logging.level`.
pub fn build_env_filter(verbose: bool, configured_level: &str) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(configured_level)
    }
}

/// Run server mode with the given arguments
pub async fn run_server_mode(args: ServerArgs) -> Result<()> {
    // Configuration is loaded before logging so logging.level can take effect.
    // A broken configuration is fatal.
    let settings = resolve_settings(&args).context("invalid configuration")?;

    tracing_subscriber::registry()
        .with(build_env_filter(args.verbose, &settings.logging.level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();

    tracing::info!("Starting {}", version::get_detailed_version());

    let app = app::create_app(settings.clone())?;

    let addr = parse_and_bind_address(&settings.server.host, settings.server.port).await?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        "Twitch status server v{} listening on {}",
        version::get_version(),
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Parse host string and attempt to bind to the address
///
/// `::` falls back to `0.0.0.0` when IPv6 is unavailable.
pub async fn parse_and_bind_address(host: &str, port: u16) -> Result<std::net::SocketAddr> {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(ip)) if ip == Ipv6Addr::UNSPECIFIED => {
            let addr = SocketAddr::new(IpAddr::V6(ip), port);
            match tokio::net::TcpListener::bind(addr).await {
                Ok(_) => {
                    tracing::debug!("IPv6 available, using {}", addr);
                    Ok(addr)
                }
                Err(e) => {
                    let fallback = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
                    tracing::warn!(
                        "Could not listen on {} ({}), falling back to {}",
                        addr,
                        e,
                        fallback
                    );
                    Ok(fallback)
                }
            }
        }
        Ok(ip) => Ok(SocketAddr::new(ip, port)),
        Err(_) => anyhow::bail!(
            "Invalid host address: {}. Use an IP address such as '::' or '0.0.0.0'",
            host
        ),
    }
}
