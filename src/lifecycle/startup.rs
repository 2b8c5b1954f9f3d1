//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Compile the route table and build the server
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Signal handlers are registered first, so an early SIGTERM still ends
//!   in a clean exit once serving starts
//! - Listener binds last (traffic only when ready)

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use crate::config::{load_config, ConfigError, Overrides, ProxyConfig};
use crate::http::ProxyServer;
use crate::lifecycle::signals::Signals;
use crate::net::{self, ListenerError};
use crate::observability::{logging, metrics};
use crate::routing::OriginError;

/// Anything that stops the proxy from starting (or keeps it from serving).
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] AddrParseError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid route table: {0}")]
    Routes(#[from] OriginError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Inputs gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub overrides: Overrides,
}

/// Boot the proxy and serve until SIGINT/SIGTERM.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let signals = Signals::install().map_err(StartupError::Signals)?;
    let config = load_config(options.config_path.as_deref(), &options.overrides)?;
    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?options.config_path,
        "dev-proxy starting"
    );
    log_route_table(&config);

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = ProxyServer::new(&config)?;

    let listener = match net::bind(&config.listener).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Cannot open listening socket");
            return Err(e.into());
        }
    };

    server.run(listener, signals.recv()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn log_route_table(config: &ProxyConfig) {
    for (index, route) in config.routes.iter().enumerate() {
        tracing::info!(
            index,
            name = route.name.as_deref().unwrap_or(route.prefix.as_str()),
            prefix = %route.prefix,
            origin = %route.target,
            preserve_path = route.preserve_path,
            "Route"
        );
    }
    tracing::info!(origin = %config.default_target, "Default route");
}
