//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake,
//! message parsing, and bidirectional communication with the GameServer.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::config::CLIENT_BUFFER_SIZE;
use crate::error::AppError;
use crate::message::{ClientMessage, ServerMessage};
use crate::server::ServerCommand;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Performs WebSocket handshake, sets up bidirectional communication,
/// and manages the connection lifecycle.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let client_id = ClientId::new();
    info!("Client {} connected from {}", client_id, peer_addr);

    // Channel for server -> client messages
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(CLIENT_BUFFER_SIZE);

    // Register with GameServer
    if cmd_tx
        .send(ServerCommand::Connect {
            client_id,
            sender: msg_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register client {} - server closed", client_id);
        return Err(AppError::ChannelSend);
    }

    // The client needs its own id to recognise its turn
    let connected_msg = ServerMessage::Connected { client_id };
    let json = serde_json::to_string(&connected_msg)?;
    ws_sender.send(Message::Text(json.into())).await?;

    let cmd_tx_read = cmd_tx.clone();

    // Read task (WebSocket -> ServerCommand)
    let read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    let cmd = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => client_message_to_command(client_id, client_msg),
                        Err(e) => {
                            warn!("Invalid JSON from {}: {}", client_id, e);
                            ServerCommand::Malformed {
                                client_id,
                                reason: format!("Invalid message format: {}", e),
                            }
                        }
                    };
                    if cmd_tx_read.send(cmd).await.is_err() {
                        debug!("Server closed, ending read task for {}", client_id);
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Client {} sent close frame", client_id);
                    break;
                }
                Ok(Message::Ping(_)) => {
                    // Pong is handled automatically by tungstenite
                    debug!("Ping from {}", client_id);
                }
                Ok(Message::Pong(_)) => {
                    debug!("Pong from {}", client_id);
                }
                Ok(_) => {
                    // Binary or other message types - ignore
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", client_id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", client_id);
    });

    // Write task (ServerMessage -> WebSocket)
    let write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task for {}", client_id);
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                }
            }
        }
        debug!("Write task ended for {}", client_id);

        let _ = ws_sender.close().await;
    });

    tokio::select! {
        _ = read_task => {
            debug!("Read task completed for {}", client_id);
        }
        _ = write_task => {
            debug!("Write task completed for {}", client_id);
        }
    }

    // Runs as its own step in the actor; anything already applied stays applied
    let _ = cmd_tx.send(ServerCommand::Disconnect { client_id }).await;

    info!("Client {} disconnected", client_id);

    Ok(())
}

/// Convert a ClientMessage to a ServerCommand
fn client_message_to_command(client_id: ClientId, msg: ClientMessage) -> ServerCommand {
    match msg {
        ClientMessage::CreateGame {
            game_mode,
            custom_config,
            player_name,
        } => ServerCommand::CreateGame {
            client_id,
            game_mode,
            custom_config,
            player_name,
        },
        ClientMessage::JoinGame {
            room_id,
            player_name,
        } => ServerCommand::JoinGame {
            client_id,
            room_id,
            player_name,
        },
        ClientMessage::PlayerAction {
            room_id,
            action,
            row,
            col,
        } => ServerCommand::PlayerAction {
            client_id,
            room_id,
            action,
            row,
            col,
        },
        ClientMessage::LeaveGame => ServerCommand::LeaveGame { client_id },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_frame_to_command() {
        let id = ClientId::new();
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"playerAction","roomId":"ABC123","action":"flag","row":1,"col":2}"#,
        )
        .unwrap();

        match client_message_to_command(id, msg) {
            ServerCommand::PlayerAction {
                client_id,
                room_id,
                action,
                row,
                col,
            } => {
                assert_eq!(client_id, id);
                assert_eq!(room_id, "ABC123");
                assert_eq!(action, "flag");
                assert_eq!((row, col), (json!(1), json!(2)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_leave_frame_to_command() {
        let id = ClientId::new();
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"leaveGame"}"#).unwrap();
        assert!(matches!(
            client_message_to_command(id, msg),
            ServerCommand::LeaveGame { client_id } if client_id == id
        ));
    }
}
