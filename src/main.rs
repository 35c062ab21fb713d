//! Chat server entry point
//!
//! Loads configuration, starts the registry actor and the TCP listener,
//! and accepts connections until shutdown.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_hub::{handle_connection, BannedPhraseFilter, Registry, ServerConfig};

/// Default configuration file (without extension; TOML expected)
const DEFAULT_CONFIG_PATH: &str = "chat";

/// Channel buffer size for registry commands
const CHANNEL_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_hub=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_hub=info")),
        )
        .init();

    // Get config file path from command line or use default
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = ServerConfig::load(&config_path)?;
    let filter = Arc::new(BannedPhraseFilter::new(config.banned_phrases.clone()));
    info!(
        "Configuration loaded: port {}, {} banned phrase(s)",
        config.port,
        filter.phrases().len()
    );

    // Start TCP listener
    let listener = TcpListener::bind(config.socket_addr()).await?;
    info!("{} listening on {}", config.server_name, config.socket_addr());

    // Create the registry actor channel and start it; the watch channel
    // carries the empty-registry shutdown trigger back to this loop.
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let registry = Registry::new(cmd_rx, shutdown_tx, config.idle_shutdown);
    tokio::spawn(registry.run());

    // Connection accept loop
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        info!("New connection from {}", addr);
                        let cmd_tx = cmd_tx.clone();
                        let filter = filter.clone();
                        let max_line_length = config.max_line_length;

                        // Spawn handler task for each connection
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(stream, cmd_tx, filter, max_line_length).await
                            {
                                error!("Connection handler error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                info!("Registry empty; stopping the accept loop");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received; shutting down");
                break;
            }
        }
    }

    Ok(())
}
