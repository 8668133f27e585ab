//! Client struct definition
//!
//! Represents a connected client and its outbound message channel.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Connected client information
#[derive(Debug)]
pub struct Client {
    /// Connection id, also used as player id
    pub id: ClientId,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Client {
    /// Create a new client with the given ID and sender channel
    pub fn new(id: ClientId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, sender }
    }

    /// Queue a message for this client without waiting
    ///
    /// Returns `Lagging` when the buffer is full and `ChannelClosed`
    /// once the client has disconnected.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Lagging,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}
