//! Server configuration
//!
//! Resolved once at startup from the command line and environment.

use std::env;

use tracing::warn;

/// Default bind address
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Default number of players per room
pub const DEFAULT_MAX_PLAYERS: usize = 2;

/// Channel buffer size for server commands
pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// Channel buffer size for each client's outbound messages
pub const CLIENT_BUFFER_SIZE: usize = 32;

const ADDR_VAR: &str = "MINESWEEPER_ADDR";
const MAX_PLAYERS_VAR: &str = "MINESWEEPER_MAX_PLAYERS";

/// Runtime settings for the server process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the TCP listener binds to
    pub addr: String,
    /// Maximum players admitted to a single room
    pub max_players: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process arguments and environment
    ///
    /// The bind address comes from the first argument, then `MINESWEEPER_ADDR`.
    /// Room capacity comes from `MINESWEEPER_MAX_PLAYERS`.
    pub fn from_env() -> Self {
        Self::resolve(
            env::args().nth(1),
            env::var(ADDR_VAR).ok(),
            env::var(MAX_PLAYERS_VAR).ok(),
        )
    }

    fn resolve(arg: Option<String>, addr_var: Option<String>, max_players_var: Option<String>) -> Self {
        let addr = arg
            .or(addr_var)
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let max_players = match max_players_var {
            None => DEFAULT_MAX_PLAYERS,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    warn!(
                        "Ignoring {}={:?}, using {}",
                        MAX_PLAYERS_VAR, raw, DEFAULT_MAX_PLAYERS
                    );
                    DEFAULT_MAX_PLAYERS
                }
            },
        };

        Self { addr, max_players }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::resolve(None, None, None);
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_argument_wins_over_env() {
        let config = ServerConfig::resolve(
            Some("127.0.0.1:9000".to_string()),
            Some("127.0.0.1:9001".to_string()),
            None,
        );
        assert_eq!(config.addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_max_players_parsing() {
        let config = ServerConfig::resolve(None, None, Some("4".to_string()));
        assert_eq!(config.max_players, 4);

        let config = ServerConfig::resolve(None, None, Some("0".to_string()));
        assert_eq!(config.max_players, DEFAULT_MAX_PLAYERS);

        let config = ServerConfig::resolve(None, None, Some("many".to_string()));
        assert_eq!(config.max_players, DEFAULT_MAX_PLAYERS);
    }
}
