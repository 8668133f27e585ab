//! GameServer Actor implementation
//!
//! The central actor that owns the room registry, every client channel and
//! the client-room mapping. Commands are handled one at a time, so each
//! action on a room is validated, applied and broadcast before the next
//! command is looked at.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::board::{CustomConfig, GameConfig, GameMode};
use crate::client::Client;
use crate::error::{AppError, SendError};
use crate::message::ServerMessage;
use crate::registry::RoomRegistry;
use crate::room::Player;
use crate::turn::{self, ActionOutcome};
use crate::types::{ClientId, RoomCode};

/// Name given to a room creator who did not send one
const DEFAULT_HOST_NAME: &str = "Player 1";

/// Name given to a joining player who did not send one
const DEFAULT_GUEST_NAME: &str = "Player 2";

/// Commands sent from handlers to the GameServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        client_id: ClientId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Client disconnected
    Disconnect {
        client_id: ClientId,
    },
    /// Create a new room
    CreateGame {
        client_id: ClientId,
        game_mode: String,
        custom_config: Option<CustomConfig>,
        player_name: Option<String>,
    },
    /// Join an existing room
    JoinGame {
        client_id: ClientId,
        room_id: String,
        player_name: Option<String>,
    },
    /// Reveal or flag a cell
    PlayerAction {
        client_id: ClientId,
        room_id: String,
        action: String,
        row: Value,
        col: Value,
    },
    /// Leave the current room
    LeaveGame {
        client_id: ClientId,
    },
    /// Client sent a frame that could not be parsed
    Malformed {
        client_id: ClientId,
        reason: String,
    },
}

/// The main GameServer actor
pub struct GameServer {
    /// All connected clients: ClientId -> Client
    clients: HashMap<ClientId, Client>,
    /// All live rooms
    registry: RoomRegistry,
    /// Client to room mapping for fast lookup: ClientId -> RoomCode
    client_rooms: HashMap<ClientId, RoomCode>,
    /// Clients whose outbound buffer overflowed during the current command
    lagging: Vec<ClientId>,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl GameServer {
    /// Create a new GameServer around a registry and command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>, registry: RoomRegistry) -> Self {
        Self {
            clients: HashMap::new(),
            registry,
            client_rooms: HashMap::new(),
            lagging: Vec::new(),
            receiver,
        }
    }

    /// Run the GameServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("GameServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("GameServer shutting down ({} rooms dropped)", self.registry.len());
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { client_id, sender } => {
                self.handle_connect(client_id, sender).await;
            }
            ServerCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id).await;
            }
            ServerCommand::CreateGame {
                client_id,
                game_mode,
                custom_config,
                player_name,
            } => {
                self.handle_create_game(client_id, &game_mode, custom_config, player_name)
                    .await;
            }
            ServerCommand::JoinGame {
                client_id,
                room_id,
                player_name,
            } => {
                self.handle_join_game(client_id, room_id, player_name).await;
            }
            ServerCommand::PlayerAction {
                client_id,
                room_id,
                action,
                row,
                col,
            } => {
                self.handle_player_action(client_id, room_id, &action, &row, &col)
                    .await;
            }
            ServerCommand::LeaveGame { client_id } => {
                self.leave_current_room(client_id).await;
            }
            ServerCommand::Malformed { client_id, reason } => {
                self.send_to(client_id, ServerMessage::Error { message: reason });
            }
        }

        self.evict_lagging().await;
    }

    /// Handle new client connection
    async fn handle_connect(&mut self, client_id: ClientId, sender: mpsc::Sender<ServerMessage>) {
        info!("Client {} connected", client_id);
        let client = Client::new(client_id, sender);
        self.clients.insert(client_id, client);
        debug!(
            "Total clients: {}, Total rooms: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    /// Handle client disconnection
    async fn handle_disconnect(&mut self, client_id: ClientId) {
        info!("Client {} disconnected", client_id);

        self.leave_current_room(client_id).await;
        self.clients.remove(&client_id);

        debug!(
            "Total clients: {}, Total rooms: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    /// Handle room creation
    async fn handle_create_game(
        &mut self,
        client_id: ClientId,
        game_mode: &str,
        custom_config: Option<CustomConfig>,
        player_name: Option<String>,
    ) {
        if !self.clients.contains_key(&client_id) {
            return;
        }

        // A client plays in one room at a time
        self.leave_current_room(client_id).await;

        let config = GameConfig::for_mode(GameMode::parse(game_mode), custom_config.as_ref());
        let player = Player::new(
            client_id,
            player_name.unwrap_or_else(|| DEFAULT_HOST_NAME.to_string()),
        );

        let room = self.registry.create_room(config, player.clone());
        let room_code = room.code.clone();
        let created = ServerMessage::game_created(room);
        let roster = ServerMessage::room_update(room);
        self.client_rooms.insert(client_id, room_code.clone());

        info!(
            "{} ({}) created room {}; host has the first turn",
            player.name, client_id, room_code
        );

        self.send_to(client_id, created);
        self.broadcast(&room_code, ServerMessage::PlayerJoined { player });
        self.broadcast(&room_code, roster);
    }

    /// Handle room joining
    async fn handle_join_game(
        &mut self,
        client_id: ClientId,
        room_id: String,
        player_name: Option<String>,
    ) {
        if !self.clients.contains_key(&client_id) {
            return;
        }

        let room_code = RoomCode::from_string(room_id);

        // Rejoining the room the client is already in just resends the state
        if self.client_rooms.get(&client_id) == Some(&room_code) {
            if let Some(room) = self.registry.find_room(&room_code) {
                let joined = ServerMessage::game_joined(room);
                self.send_to(client_id, joined);
            }
            return;
        }

        // Check the target before giving up the current room
        let admissible = match self.registry.find_room(&room_code) {
            None => Err(AppError::RoomNotFound(room_code.to_string())),
            Some(room) if room.is_full() => Err(AppError::RoomFull),
            Some(_) => Ok(()),
        };
        if let Err(e) = admissible {
            debug!("Client {} could not join {}: {}", client_id, room_code, e);
            self.send_to(client_id, e.into());
            return;
        }

        self.leave_current_room(client_id).await;

        let player = Player::new(
            client_id,
            player_name.unwrap_or_else(|| DEFAULT_GUEST_NAME.to_string()),
        );
        let added = self
            .registry
            .add_player(&room_code, player.clone())
            .map(|room| (ServerMessage::game_joined(room), ServerMessage::room_update(room)));
        let (joined, roster) = match added {
            Ok(messages) => messages,
            Err(e) => {
                self.send_to(client_id, e.into());
                return;
            }
        };
        self.client_rooms.insert(client_id, room_code.clone());

        info!("{} ({}) joined room {}", player.name, client_id, room_code);

        self.send_to(client_id, joined);
        self.broadcast(&room_code, ServerMessage::PlayerJoined { player });
        self.broadcast(&room_code, roster);
    }

    /// Handle a reveal or flag request
    ///
    /// Missing rooms and finished games are ignored without a reply.
    async fn handle_player_action(
        &mut self,
        client_id: ClientId,
        room_id: String,
        action: &str,
        row: &Value,
        col: &Value,
    ) {
        let room_code = RoomCode::from_string(room_id);

        let result = {
            let Some(room) = self.registry.find_room_mut(&room_code) else {
                debug!("Action for unknown room {} ignored", room_code);
                return;
            };
            if room.state.is_finished() {
                debug!("Action for finished room {} ignored", room_code);
                return;
            }
            turn::submit_action(room, client_id, action, row, col)
                .map(|outcome| (outcome, ServerMessage::board_update(room)))
        };

        let (outcome, update) = match result {
            Ok(accepted) => accepted,
            Err(e) => {
                debug!("Action from {} in {} rejected: {}", client_id, room_code, e);
                self.send_to(client_id, e.into());
                return;
            }
        };

        self.broadcast(&room_code, update);

        if let ActionOutcome::Ended { won } = outcome {
            info!(
                "Game in room {} over: {}",
                room_code,
                if won { "board cleared" } else { "mine hit" }
            );
            self.broadcast(&room_code, ServerMessage::GameOver { won });
        }
    }

    /// Remove a client from their room and notify whoever is left
    async fn leave_current_room(&mut self, client_id: ClientId) {
        let Some(room_code) = self.client_rooms.remove(&client_id) else {
            return;
        };

        let Some(departure) = self.registry.remove_player(&room_code, client_id) else {
            warn!("Client {} mapped to missing room {}", client_id, room_code);
            return;
        };

        info!("Client {} left room {}", client_id, room_code);

        if departure.emptied {
            info!("Room {} deleted as it is empty", room_code);
            return;
        }

        let Some(roster) = self
            .registry
            .find_room(&room_code)
            .map(ServerMessage::room_update)
        else {
            return;
        };

        self.broadcast(&room_code, ServerMessage::PlayerLeft { player_id: client_id });
        self.broadcast(&room_code, roster);

        if let Some(new_host_id) = departure.new_host {
            info!("New host for room {}: {}", room_code, new_host_id);
            self.broadcast(&room_code, ServerMessage::NewHost { new_host_id });
        }

        if let Some(next) = departure.new_turn {
            debug!("Turn in room {} passed to {}", room_code, next);
            self.broadcast(
                &room_code,
                ServerMessage::TurnUpdate {
                    current_player_turn_id: Some(next),
                },
            );
        }
    }

    /// Helper: Send a message to one client without waiting
    ///
    /// A client whose buffer is full is queued for eviction.
    fn send_to(&mut self, client_id: ClientId, msg: ServerMessage) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };
        match client.send(msg) {
            Ok(()) => {}
            Err(SendError::Lagging) => {
                if !self.lagging.contains(&client_id) {
                    warn!("Client {} is not reading, dropping it", client_id);
                    self.lagging.push(client_id);
                }
            }
            Err(SendError::ChannelClosed) => {
                debug!("Client {} channel closed", client_id);
            }
        }
    }

    /// Helper: Send a message to every player in a room
    fn broadcast(&mut self, room_code: &RoomCode, msg: ServerMessage) {
        let Some(room) = self.registry.find_room(room_code) else {
            return;
        };
        let player_ids: Vec<ClientId> = room.player_ids().collect();
        for player_id in player_ids {
            self.send_to(player_id, msg.clone());
        }
    }

    /// Disconnect every client that fell behind while handling a command
    ///
    /// Evicting one client notifies its room, which can overflow another
    /// buffer, so this runs until the queue stays empty.
    async fn evict_lagging(&mut self) {
        while let Some(client_id) = self.lagging.pop() {
            if self.clients.contains_key(&client_id) {
                self.handle_disconnect(client_id).await;
            }
        }
    }
}
