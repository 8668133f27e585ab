//! Room struct definition
//!
//! A room is one game: its board, the players taking turns on it, the host
//! and whose move it is.

use serde::{Deserialize, Serialize};

use crate::board::{Board, GameConfig};
use crate::error::AppError;
use crate::types::{ClientId, RoomCode};

/// A participant in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Connection id of the player
    pub id: ClientId,
    pub name: String,
}

impl Player {
    pub fn new(id: ClientId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Summary state paired with the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub game_over: bool,
    pub game_won: bool,
    /// Mines minus flags placed; never below zero
    pub bombs_left: usize,
    /// Accepted actions so far
    pub moves: u32,
}

impl GameState {
    /// Fresh state for a new game
    pub fn new(config: &GameConfig) -> Self {
        Self {
            game_over: false,
            game_won: false,
            bombs_left: config.bombs,
            moves: 0,
        }
    }

    /// Whether the game has ended, by a mine or by a win
    pub fn is_finished(&self) -> bool {
        self.game_over || self.game_won
    }
}

/// What changed when a player left a room
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Departure {
    /// The room has no players left and should be deleted
    pub emptied: bool,
    /// Set when the departing player was host
    pub new_host: Option<ClientId>,
    /// Set when the departing player held the turn
    pub new_turn: Option<ClientId>,
}

/// A game room
///
/// Players are kept in join order, which is also the turn order.
#[derive(Debug, Clone)]
pub struct Room {
    /// Room code for identification
    pub code: RoomCode,
    /// Players in join order
    pub players: Vec<Player>,
    pub board: Board,
    pub config: GameConfig,
    pub state: GameState,
    /// Connection id of the current host
    pub host: ClientId,
    /// Connection id of the player who moves next
    pub current_turn: Option<ClientId>,
    /// Maximum number of players
    pub capacity: usize,
}

impl Room {
    /// Create a room whose host also holds the first turn
    pub fn new(code: RoomCode, board: Board, config: GameConfig, host: Player, capacity: usize) -> Self {
        let host_id = host.id;
        Self {
            code,
            players: vec![host],
            board,
            state: GameState::new(&config),
            config,
            host: host_id,
            current_turn: Some(host_id),
            capacity,
        }
    }

    /// Check if the room is at capacity
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Check if a client is in this room
    pub fn contains(&self, client_id: ClientId) -> bool {
        self.players.iter().any(|p| p.id == client_id)
    }

    pub fn player(&self, client_id: ClientId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == client_id)
    }

    /// Connection ids of every player, in join order
    pub fn player_ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.players.iter().map(|p| p.id)
    }

    /// Append a player to the room
    pub fn add_player(&mut self, player: Player) -> Result<(), AppError> {
        if self.is_full() {
            return Err(AppError::RoomFull);
        }
        if !self.contains(player.id) {
            self.players.push(player);
        }
        Ok(())
    }

    /// Player after `client_id` in join order, wrapping around
    ///
    /// Returns `client_id` itself when it is the only player, and `None`
    /// when it is not in the room.
    pub fn next_player_after(&self, client_id: ClientId) -> Option<ClientId> {
        let index = self.players.iter().position(|p| p.id == client_id)?;
        let next = (index + 1) % self.players.len();
        Some(self.players[next].id)
    }

    /// Remove a player and hand over host and turn if they held them
    ///
    /// The empty check comes first: an emptied room reports no successors.
    /// A finished game keeps its turn pinned on the player who ended it.
    pub fn remove_player(&mut self, client_id: ClientId) -> Departure {
        let Some(index) = self.players.iter().position(|p| p.id == client_id) else {
            return Departure::default();
        };
        self.players.remove(index);

        if self.players.is_empty() {
            self.current_turn = None;
            return Departure {
                emptied: true,
                ..Departure::default()
            };
        }

        let mut departure = Departure::default();

        if self.host == client_id {
            self.host = self.players[0].id;
            departure.new_host = Some(self.host);
        }

        if self.current_turn == Some(client_id) && !self.state.is_finished() {
            // The player who followed the leaver now sits at `index`
            let successor = self.players[index % self.players.len()].id;
            self.current_turn = Some(successor);
            departure.new_turn = Some(successor);
        }

        departure
    }
}
