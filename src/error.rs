//! Error types for the game server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// recoverable game errors (reported to the originating client only).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Room not found with the given code
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Room already holds the configured number of players
    #[error("Room is full")]
    RoomFull,

    /// Action submitted after the game ended
    #[error("Game is over")]
    GameEnded,

    /// Action submitted by a player who does not hold the turn
    #[error("Out of turn")]
    OutOfTurn,

    /// Coordinates outside the board
    #[error("Invalid coordinates: ({row}, {col})")]
    InvalidCoordinates { row: String, col: String },

    /// Action kind other than reveal or flag
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

/// Message send errors
///
/// Occurs when a client's outbound channel cannot take another message.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The client is not draining its buffer fast enough
    #[error("Client buffer full")]
    Lagging,
}
