//! dev-proxy: development reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  DEV PROXY                   │
//!   Client Request        │  ┌─────────┐   ┌─────────┐   ┌───────────┐   │
//!   ──────────────────────┼─▶│   net   │──▶│  http   │──▶│  routing  │   │
//!                         │  │listener │   │ server  │   │ prefix    │   │
//!                         │  └─────────┘   └─────────┘   │ table     │   │
//!                         │                              └─────┬─────┘   │
//!                         │                                    ▼         │
//!   Client Response       │  ┌─────────┐   ┌─────────┐   ┌───────────┐   │
//!   ◀─────────────────────┼──│response │◀──│upstream │◀──│  origin   │◀──┼── Origin
//!                         │  │ relay   │   │ client  │   │ (A or B)  │   │   Server
//!                         │  └─────────┘   └─────────┘   └───────────┘   │
//!                         │                                              │
//!                         │  config · observability · resilience ·       │
//!                         │  lifecycle                                   │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use dev_proxy::config::Overrides;
use dev_proxy::lifecycle::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "dev-proxy", version)]
#[command(about = "Forward requests to development servers by path prefix", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in defaults are used without one.
    #[arg(short, long, env = "DEV_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port. Overrides the PORT environment variable and the config file.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = StartupOptions {
        config_path: cli.config,
        overrides: Overrides { port: cli.port },
    };

    match lifecycle::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("dev-proxy: {e}");
            ExitCode::FAILURE
        }
    }
}
