//! Room registry
//!
//! Owns every live room. Callers look a room up for each operation instead
//! of holding on to it between commands.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::board::{Board, GameConfig};
use crate::error::AppError;
use crate::room::{Departure, Player, Room};
use crate::types::{ClientId, RoomCode};

/// In-memory store of rooms keyed by room code
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    /// Players admitted per room
    max_players: usize,
}

impl RoomRegistry {
    pub fn new(max_players: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            max_players,
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Create a room with a freshly generated random board
    pub fn create_room(&mut self, config: GameConfig, host: Player) -> &Room {
        let board = Board::generate(config, &mut rand::thread_rng());
        self.create_room_with_board(board, config, host)
    }

    /// Create a room around a prepared board
    pub fn create_room_with_board(&mut self, board: Board, config: GameConfig, host: Player) -> &Room {
        let code = self.unused_code();
        info!(
            "Room {} created by {} ({}x{}, {} bombs)",
            code, host.id, config.rows, config.cols, config.bombs
        );
        let room = Room::new(code.clone(), board, config, host, self.max_players);
        self.rooms.entry(code).or_insert(room)
    }

    /// Generate a room code not used by any live room
    fn unused_code(&self) -> RoomCode {
        loop {
            let code = RoomCode::generate();
            if !self.rooms.contains_key(&code) {
                break code;
            }
            debug!("Room code {} collided, regenerating", code);
        }
    }

    pub fn find_room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn find_room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn remove_room(&mut self, code: &RoomCode) -> Option<Room> {
        let room = self.rooms.remove(code);
        if room.is_some() {
            debug!("Room {} deleted", code);
        }
        room
    }

    /// Add a player to an existing room
    pub fn add_player(&mut self, code: &RoomCode, player: Player) -> Result<&Room, AppError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| AppError::RoomNotFound(code.to_string()))?;
        room.add_player(player)?;
        Ok(room)
    }

    /// Remove a player, deleting the room once nobody is left
    ///
    /// Returns `None` if the room does not exist.
    pub fn remove_player(&mut self, code: &RoomCode, client_id: ClientId) -> Option<Departure> {
        let room = self.rooms.get_mut(code)?;
        let departure = room.remove_player(client_id);
        if departure.emptied {
            self.remove_room(code);
        }
        Some(departure)
    }
}
