//! Turn coordination
//!
//! Decides who may act, applies an accepted action to the room through the
//! board engine and moves the turn on in join order.

use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::error::AppError;
use crate::room::Room;
use crate::types::ClientId;

/// Where a room is in its turn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Waiting for the given player to act
    WaitingForAction(ClientId),
    /// Mine hit or board cleared; no more actions
    Ended,
}

impl Room {
    pub fn phase(&self) -> TurnPhase {
        match self.current_turn {
            Some(id) if !self.state.is_finished() => TurnPhase::WaitingForAction(id),
            _ => TurnPhase::Ended,
        }
    }
}

/// Kind of move a player can make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Reveal,
    Flag,
}

impl FromStr for ActionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reveal" => Ok(Self::Reveal),
            "flag" => Ok(Self::Flag),
            other => Err(AppError::UnknownAction(other.to_string())),
        }
    }
}

/// A validated move request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerAction {
    pub kind: ActionKind,
    pub row: usize,
    pub col: usize,
}

/// Board index from a raw coordinate: a non-negative whole number
fn coordinate(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
        .map(|f| f as usize)
}

impl PlayerAction {
    /// Parse a raw request; anything that is not a board index is rejected
    /// here, board bounds are checked when the action is applied
    pub fn parse(action: &str, row: &Value, col: &Value) -> Result<Self, AppError> {
        let kind = action.parse()?;
        match (coordinate(row), coordinate(col)) {
            (Some(row), Some(col)) => Ok(Self { kind, row, col }),
            _ => Err(AppError::InvalidCoordinates {
                row: row.to_string(),
                col: col.to_string(),
            }),
        }
    }
}

/// Result of an accepted action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Game continues with the given player to move
    Continue { next_turn: ClientId },
    /// Game ended on this action
    Ended { won: bool },
}

/// Check that `actor` holds the turn in an active room
pub fn ensure_turn(room: &Room, actor: ClientId) -> Result<(), AppError> {
    match room.phase() {
        TurnPhase::Ended => Err(AppError::GameEnded),
        TurnPhase::WaitingForAction(holder) if holder == actor => Ok(()),
        TurnPhase::WaitingForAction(_) => Err(AppError::OutOfTurn),
    }
}

/// Check the turn, parse the raw request and apply it
///
/// Errors are reported in that order, so a player acting out of turn hears
/// about the turn before anything else.
pub fn submit_action(
    room: &mut Room,
    actor: ClientId,
    action: &str,
    row: &Value,
    col: &Value,
) -> Result<ActionOutcome, AppError> {
    ensure_turn(room, actor)?;
    let action = PlayerAction::parse(action, row, col)?;
    apply_action(room, actor, action)
}

/// Validate and apply one action, then advance the turn
///
/// Nothing in the room changes unless the whole action is valid. Board and
/// state are computed from the current snapshot and swapped in together.
pub fn apply_action(
    room: &mut Room,
    actor: ClientId,
    action: PlayerAction,
) -> Result<ActionOutcome, AppError> {
    ensure_turn(room, actor)?;

    let PlayerAction { kind, row, col } = action;
    if !room.board.contains(row, col) {
        return Err(AppError::InvalidCoordinates {
            row: row.to_string(),
            col: col.to_string(),
        });
    }

    let mut state = room.state;
    let board = match kind {
        ActionKind::Reveal => {
            let was_hidden = room.board.cell(row, col).is_some_and(|c| !c.is_revealed);
            let board = room.board.reveal(row, col);
            let hit_mine = was_hidden && board.cell(row, col).is_some_and(|c| c.is_bomb && c.is_revealed);
            if hit_mine {
                state.game_over = true;
                board.reveal_all_mines()
            } else {
                board
            }
        }
        ActionKind::Flag => {
            let outcome = room.board.toggle_flag(row, col, state.bombs_left);
            state.bombs_left = outcome.bombs_left;
            outcome.board
        }
    };

    if !state.game_over && board.is_won() {
        state.game_won = true;
        state.game_over = true;
    }
    state.moves += 1;

    room.board = board;
    room.state = state;

    let outcome = if state.is_finished() {
        room.current_turn = Some(actor);
        ActionOutcome::Ended {
            won: state.game_won,
        }
    } else {
        let next_turn = room.next_player_after(actor).unwrap_or(actor);
        room.current_turn = Some(next_turn);
        ActionOutcome::Continue { next_turn }
    };

    debug!(
        "Room {}: {:?} at ({}, {}) by {} -> {:?}",
        room.code, kind, row, col, actor, outcome
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::board::{Board, GameConfig};
    use crate::room::Player;
    use crate::types::RoomCode;

    fn two_player_room(board: Board, bombs: usize) -> (Room, ClientId, ClientId) {
        let a = ClientId::new();
        let b = ClientId::new();
        let config = GameConfig::new(board.rows(), board.cols(), bombs);
        let mut room = Room::new(RoomCode::generate(), board, config, Player::new(a, "A"), 2);
        room.add_player(Player::new(b, "B")).unwrap();
        (room, a, b)
    }

    fn reveal(row: usize, col: usize) -> PlayerAction {
        PlayerAction {
            kind: ActionKind::Reveal,
            row,
            col,
        }
    }

    fn flag(row: usize, col: usize) -> PlayerAction {
        PlayerAction {
            kind: ActionKind::Flag,
            row,
            col,
        }
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(
            PlayerAction::parse("flag", &json!(2), &json!(3)).unwrap(),
            flag(2, 3)
        );
        assert_eq!(
            PlayerAction::parse("reveal", &json!(4.0), &json!(0)).unwrap(),
            reveal(4, 0)
        );
        assert!(matches!(
            PlayerAction::parse("chord", &json!(0), &json!(0)),
            Err(AppError::UnknownAction(a)) if a == "chord"
        ));
        assert!(matches!(
            PlayerAction::parse("reveal", &json!(-1), &json!(0)),
            Err(AppError::InvalidCoordinates { row, col }) if row == "-1" && col == "0"
        ));
    }

    #[test]
    fn test_parse_rejects_non_index_coordinates() {
        for (row, col) in [
            (json!("x"), json!(0)),
            (json!(0), json!(1.5)),
            (json!(null), json!(0)),
            (json!(true), json!([1])),
            (json!(-0.5), json!(0)),
        ] {
            assert!(matches!(
                PlayerAction::parse("flag", &row, &col),
                Err(AppError::InvalidCoordinates { .. })
            ));
        }
    }

    #[test]
    fn test_turn_alternates() {
        let board = Board::with_mines(5, 5, &[(4, 4)]);
        let (mut room, a, b) = two_player_room(board, 1);

        assert_eq!(
            apply_action(&mut room, a, flag(0, 0)).unwrap(),
            ActionOutcome::Continue { next_turn: b }
        );
        assert_eq!(
            apply_action(&mut room, b, flag(0, 0)).unwrap(),
            ActionOutcome::Continue { next_turn: a }
        );
        assert_eq!(room.phase(), TurnPhase::WaitingForAction(a));
        assert_eq!(room.state.moves, 2);
        assert_eq!(room.state.bombs_left, 1);
    }

    #[test]
    fn test_out_of_turn_leaves_room_untouched() {
        let board = Board::with_mines(5, 5, &[(4, 4)]);
        let (mut room, a, b) = two_player_room(board, 1);

        apply_action(&mut room, a, flag(1, 1)).unwrap();
        let board_before = room.board.clone();
        let state_before = room.state;

        let result = apply_action(&mut room, a, reveal(0, 0));
        assert!(matches!(result, Err(AppError::OutOfTurn)));
        assert_eq!(room.board, board_before);
        assert_eq!(room.state, state_before);
        assert_eq!(room.current_turn, Some(b));
    }

    #[test]
    fn test_invalid_coordinates_rejected_before_mutation() {
        let board = Board::with_mines(3, 3, &[(1, 1)]);
        let (mut room, a, _) = two_player_room(board, 1);
        let before = room.board.clone();

        let result = apply_action(&mut room, a, reveal(3, 0));
        assert!(matches!(
            result,
            Err(AppError::InvalidCoordinates { row, col }) if row == "3" && col == "0"
        ));
        assert_eq!(room.board, before);
        assert_eq!(room.state.moves, 0);
        assert_eq!(room.current_turn, Some(a));
    }

    #[test]
    fn test_mine_ends_game_and_pins_turn() {
        let board = Board::with_mines(3, 3, &[(1, 1), (0, 0)]);
        let (mut room, a, _) = two_player_room(board, 2);

        let outcome = apply_action(&mut room, a, reveal(1, 1)).unwrap();
        assert_eq!(outcome, ActionOutcome::Ended { won: false });
        assert!(room.state.game_over);
        assert!(!room.state.game_won);
        assert_eq!(room.current_turn, Some(a));
        assert_eq!(room.phase(), TurnPhase::Ended);
        assert!(room.board.cell(0, 0).is_some_and(|c| c.is_revealed));

        let result = apply_action(&mut room, a, reveal(2, 2));
        assert!(matches!(result, Err(AppError::GameEnded)));
    }

    #[test]
    fn test_win_ends_game() {
        let board = Board::with_mines(3, 3, &[(0, 0)]);
        let (mut room, a, b) = two_player_room(board, 1);

        apply_action(&mut room, a, flag(0, 0)).unwrap();
        let outcome = apply_action(&mut room, b, reveal(2, 2)).unwrap();

        assert_eq!(outcome, ActionOutcome::Ended { won: true });
        assert!(room.state.game_over && room.state.game_won);
        assert_eq!(room.current_turn, Some(b));
        assert_eq!(room.state.moves, 2);
        assert_eq!(room.state.bombs_left, 0);
    }

    #[test]
    fn test_single_player_keeps_turn() {
        let a = ClientId::new();
        let board = Board::with_mines(4, 4, &[(3, 3)]);
        let config = GameConfig::new(4, 4, 1);
        let mut room = Room::new(RoomCode::generate(), board, config, Player::new(a, "A"), 2);

        assert_eq!(
            apply_action(&mut room, a, flag(0, 0)).unwrap(),
            ActionOutcome::Continue { next_turn: a }
        );
    }

    #[test]
    fn test_submit_reports_turn_before_bad_input() {
        let board = Board::with_mines(3, 3, &[(1, 1)]);
        let (mut room, a, b) = two_player_room(board, 1);

        assert!(matches!(
            submit_action(&mut room, b, "dig", &json!(-5), &json!(0)),
            Err(AppError::OutOfTurn)
        ));
        assert!(matches!(
            submit_action(&mut room, a, "dig", &json!(0), &json!(0)),
            Err(AppError::UnknownAction(_))
        ));
        assert!(matches!(
            submit_action(&mut room, a, "reveal", &json!(0), &json!(3)),
            Err(AppError::InvalidCoordinates { row, col }) if row == "0" && col == "3"
        ));
        assert_eq!(room.state.moves, 0);

        assert_eq!(
            submit_action(&mut room, a, "reveal", &json!(0), &json!(0)).unwrap(),
            ActionOutcome::Continue { next_turn: b }
        );
    }

    #[test]
    fn test_rejoined_room_rotates_again() {
        let board = Board::with_mines(5, 5, &[(4, 4)]);
        let (mut room, a, b) = two_player_room(board, 1);

        room.remove_player(a);
        assert_eq!(room.current_turn, Some(b));

        let c = ClientId::new();
        room.add_player(Player::new(c, "C")).unwrap();
        assert_eq!(
            apply_action(&mut room, b, flag(0, 0)).unwrap(),
            ActionOutcome::Continue { next_turn: c }
        );
    }
}
