//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's tagged enum.
//! The `type` field carries the event name; the remaining fields are the
//! event's arguments, all in camelCase.

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::{Board, CustomConfig, GameConfig};
use crate::error::AppError;
use crate::room::{GameState, Player, Room};
use crate::types::{ClientId, RoomCode};

/// Client → Server message
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Create a new room and become its host
    CreateGame {
        #[serde(default)]
        game_mode: String,
        #[serde(default)]
        custom_config: Option<CustomConfig>,
        #[serde(default)]
        player_name: Option<String>,
    },
    /// Join an existing room by id
    JoinGame {
        room_id: String,
        #[serde(default)]
        player_name: Option<String>,
    },
    /// Reveal or flag a cell
    ///
    /// Coordinates stay raw so that unusable values are answered with an
    /// `actionError` rather than a parse failure.
    PlayerAction {
        room_id: String,
        action: String,
        #[serde(default)]
        row: Value,
        #[serde(default)]
        col: Value,
    },
    /// Leave the current room without disconnecting
    LeaveGame,
}

/// Server → Client message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Connection successful, connection id issued
    Connected { client_id: ClientId },
    /// Room created; sent to the creator only
    GameCreated {
        room_id: RoomCode,
        board: Board,
        game_state: GameState,
        game_config: GameConfig,
        current_player_turn_id: Option<ClientId>,
    },
    /// Room joined; sent to the joiner only
    GameJoined {
        room_id: RoomCode,
        board: Board,
        game_state: GameState,
        game_config: GameConfig,
        current_player_turn_id: Option<ClientId>,
    },
    /// Join refused
    JoinError { message: String },
    /// A player entered the room
    PlayerJoined { player: Player },
    /// Full roster after any membership change
    RoomUpdate { players: Roster },
    /// Board and state after an accepted action
    BoardUpdate {
        board: Board,
        game_state: GameState,
        current_player_turn_id: Option<ClientId>,
    },
    /// Game ended on the last action
    GameOver { won: bool },
    /// Action sent out of turn
    TurnError { message: String },
    /// Turn moved without an action (holder left)
    TurnUpdate { current_player_turn_id: Option<ClientId> },
    /// Action refused before it was applied
    ActionError { message: String },
    /// A player left the room
    PlayerLeft { player_id: ClientId },
    /// Host role moved to another player
    NewHost { new_host_id: ClientId },
    /// Frame could not be understood
    Error { message: String },
}

/// Room roster, serialized as an object keyed by connection id in join order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster(pub Vec<Player>);

impl Serialize for Roster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|p| (p.id.to_string(), p)))
    }
}

impl ServerMessage {
    pub fn game_created(room: &Room) -> Self {
        Self::GameCreated {
            room_id: room.code.clone(),
            board: room.board.clone(),
            game_state: room.state,
            game_config: room.config,
            current_player_turn_id: room.current_turn,
        }
    }

    pub fn game_joined(room: &Room) -> Self {
        Self::GameJoined {
            room_id: room.code.clone(),
            board: room.board.clone(),
            game_state: room.state,
            game_config: room.config,
            current_player_turn_id: room.current_turn,
        }
    }

    pub fn board_update(room: &Room) -> Self {
        Self::BoardUpdate {
            board: room.board.clone(),
            game_state: room.state,
            current_player_turn_id: room.current_turn,
        }
    }

    pub fn room_update(room: &Room) -> Self {
        Self::RoomUpdate {
            players: Roster(room.players.clone()),
        }
    }
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        match err {
            AppError::RoomNotFound(_) => ServerMessage::JoinError {
                message: "Room not found.".to_string(),
            },
            AppError::RoomFull => ServerMessage::JoinError {
                message: "Room is full.".to_string(),
            },
            AppError::OutOfTurn => ServerMessage::TurnError {
                message: "It is not your turn.".to_string(),
            },
            AppError::InvalidCoordinates { row, col } => ServerMessage::ActionError {
                message: format!("Invalid coordinates ({}, {}).", row, col),
            },
            AppError::UnknownAction(action) => ServerMessage::ActionError {
                message: format!("Unknown action '{}'.", action),
            },
            AppError::GameEnded => ServerMessage::ActionError {
                message: "The game is over.".to_string(),
            },
            AppError::Json(e) => ServerMessage::Error {
                message: format!("Invalid message format: {}", e),
            },
            // Fatal errors are not typically converted (connection closes)
            _ => ServerMessage::Error {
                message: "Internal error".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_game_deserialize() {
        let json = r#"{"type": "createGame", "gameMode": "custom", "customConfig": {"rows": 5}, "playerName": "Alice"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::CreateGame {
                game_mode,
                custom_config,
                player_name,
            } => {
                assert_eq!(game_mode, "custom");
                assert!(custom_config.is_some_and(|c| c.rows.is_some() && c.bombs.is_none()));
                assert_eq!(player_name.as_deref(), Some("Alice"));
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_create_game_defaults() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "createGame"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::CreateGame { custom_config: None, player_name: None, .. }
        ));
    }

    #[test]
    fn test_player_action_deserialize() {
        let json = r#"{"type": "playerAction", "roomId": "ABC123", "action": "reveal", "row": 3, "col": -1}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::PlayerAction { room_id, action, row, col } => {
                assert_eq!(room_id, "ABC123");
                assert_eq!(action, "reveal");
                assert_eq!((row, col), (Value::from(3), Value::from(-1)));
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_player_action_keeps_unusable_coordinates() {
        let json = r#"{"type": "playerAction", "roomId": "ABC123", "action": "flag", "row": "x", "col": 1.5}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::PlayerAction { row: Value::String(_), col: Value::Number(_), .. }
        ));

        let json = r#"{"type": "playerAction", "roomId": "ABC123", "action": "flag"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::PlayerAction { row: Value::Null, col: Value::Null, .. }
        ));
    }

    #[test]
    fn test_board_update_serialize() {
        let id = ClientId::new();
        let msg = ServerMessage::BoardUpdate {
            board: Board::with_mines(1, 1, &[]),
            game_state: GameState::new(&GameConfig::new(1, 1, 0)),
            current_player_turn_id: Some(id),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "boardUpdate");
        assert_eq!(json["gameState"]["bombsLeft"], 0);
        assert_eq!(json["gameState"]["gameOver"], false);
        assert_eq!(json["currentPlayerTurnId"], id.to_string());
        assert_eq!(json["board"][0][0]["isRevealed"], false);
    }

    #[test]
    fn test_roster_keeps_join_order() {
        let first = Player::new(ClientId::new(), "Zed");
        let second = Player::new(ClientId::new(), "Amy");
        let msg = ServerMessage::RoomUpdate {
            players: Roster(vec![first.clone(), second.clone()]),
        };
        let json = serde_json::to_string(&msg).unwrap();

        let first_at = json.find(&first.id.to_string()).unwrap();
        let second_at = json.find(&second.id.to_string()).unwrap();
        assert!(first_at < second_at);
        assert!(json.contains("\"name\":\"Zed\""));
    }

    #[test]
    fn test_error_events() {
        let msg: ServerMessage = AppError::OutOfTurn.into();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "turnError");
        assert_eq!(json["message"], "It is not your turn.");

        let msg: ServerMessage = AppError::RoomFull.into();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "joinError");
        assert_eq!(json["message"], "Room is full.");

        let msg: ServerMessage = AppError::UnknownAction("dig".to_string()).into();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "actionError");

        let msg: ServerMessage = AppError::InvalidCoordinates {
            row: "\"x\"".to_string(),
            col: "2".to_string(),
        }
        .into();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "actionError");
        assert_eq!(json["message"], "Invalid coordinates (\"x\", 2).");
    }

    #[test]
    fn test_new_host_field_names() {
        let id = ClientId::new();
        let json = serde_json::to_value(ServerMessage::NewHost { new_host_id: id }).unwrap();
        assert_eq!(json["newHostId"], id.to_string());

        let json = serde_json::to_value(ServerMessage::PlayerLeft { player_id: id }).unwrap();
        assert_eq!(json["type"], "playerLeft");
        assert_eq!(json["playerId"], id.to_string());
    }
}
