//! Basic type definitions for the game server
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based connection identifier, doubling as player identity
//! - `RoomCode`: 6-character uppercase alphanumeric room code

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of generated room codes
pub const ROOM_CODE_LEN: usize = 6;

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4. A player keeps the id of the connection they joined
/// with for the lifetime of the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room code (6-character uppercase alphanumeric)
///
/// Human-shareable, not meant to be unguessable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Generate a new random room code
    pub fn generate() -> Self {
        use rand::Rng;
        let code: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(ROOM_CODE_LEN)
            .map(char::from)
            .collect::<String>()
            .to_uppercase();
        Self(code)
    }

    /// Create a RoomCode from client input (trimmed, converted to uppercase)
    pub fn from_string(code: String) -> Self {
        Self(code.trim().to_uppercase())
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_unique() {
        let id1 = ClientId::new();
        let id2 = ClientId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_client_id_serializes_as_plain_string() {
        let id = ClientId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn test_room_code_shape() {
        let code = RoomCode::generate();
        assert_eq!(code.0.len(), ROOM_CODE_LEN);
        assert!(code
            .0
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_room_code_from_input() {
        let code = RoomCode::from_string(" abc123 ".to_string());
        assert_eq!(code.0, "ABC123");
    }
}
