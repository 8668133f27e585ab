//! Multiplayer Minesweeper Server - Entry Point
//!
//! Starts the TCP listener and GameServer actor, accepting connections.

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use minesweeper_server::config::CHANNEL_BUFFER_SIZE;
use minesweeper_server::{handle_connection, GameServer, RoomRegistry, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=minesweeper_server=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("minesweeper_server=info")),
        )
        .init();

    let config = ServerConfig::from_env();

    let listener = TcpListener::bind(&config.addr).await?;
    info!("Minesweeper server listening on {}", config.addr);

    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let server = GameServer::new(cmd_rx, RoomRegistry::new(config.max_players));
    tokio::spawn(server.run());

    info!(
        "GameServer actor started ({} players per room)",
        config.max_players
    );

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
