//! Turn-based Multiplayer Minesweeper Server Library
//!
//! A WebSocket game server built with tokio-tungstenite using the Actor
//! pattern for state management.
//!
//! # Features
//! - Room creation with 6-character codes and difficulty presets
//! - Room joining up to a configurable player count
//! - Turn-ordered reveal and flag actions with flood-fill reveal
//! - Win/loss detection broadcast to every player in the room
//! - Host and turn hand-over on disconnect
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `GameServer` is the central actor owning the `RoomRegistry`
//! - Each connection has a `handler` task communicating with the server
//! - No locks needed - every room mutation goes through the actor
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use minesweeper_server::{handle_connection, GameServer, RoomRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(GameServer::new(cmd_rx, RoomRegistry::new(2)).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx));
//!     }
//! }
//! ```

pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod turn;
pub mod types;

// Re-export main types for convenience
pub use board::{Board, Cell, GameConfig, GameMode};
pub use client::Client;
pub use config::ServerConfig;
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use message::{ClientMessage, ServerMessage};
pub use registry::RoomRegistry;
pub use room::{GameState, Player, Room};
pub use server::{GameServer, ServerCommand};
pub use turn::{ActionKind, ActionOutcome, PlayerAction, TurnPhase};
pub use types::{ClientId, RoomCode};
