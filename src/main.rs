//! microserver binary.
//!
//! ```text
//! CLI → config (file or defaults, then overrides) → logging
//!     → route registry (/status) → Server::new → start
//! Ctrl+C / SIGTERM → stop → drain → exit
//! ```

use std::path::PathBuf;

use clap::Parser;

use microserver::config::{load_config, ServerConfig};
use microserver::lifecycle::signals::spawn_signal_listener;
use microserver::observability::logging;
use microserver::routing::RouteRegistry;
use microserver::{status, Server};

#[derive(Debug, Parser)]
#[command(name = "microserver")]
#[command(version, about = "Minimal embedded HTTP server", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Worker pool size.
    #[arg(long)]
    max_threads: Option<usize>,

    /// Static resource directory.
    #[arg(long)]
    resources_dir: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(max_threads) = self.max_threads {
            config.listener.max_threads = max_threads;
        }
        if let Some(dir) = &self.resources_dir {
            config.resources.dir = dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    cli.apply(&mut config);

    logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "microserver starting"
    );

    let registry = status::register(RouteRegistry::builder()).build()?;
    let server = Server::new(config, registry)?;

    let signals = spawn_signal_listener(server.shutdown_handle());
    let result = server.start().await;
    signals.abort();

    if let Err(e) = &result {
        tracing::error!(error = %e, "Server failed");
    }
    result?;
    Ok(())
}
