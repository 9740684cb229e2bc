//! Game-over detection.

use serde::{Deserialize, Serialize};

use super::board::Board;
use super::moves::GameWinner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeReason {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub winner: GameWinner,
    pub reason: OutcomeReason,
}

/// Halfmove clock value at which the fifty-move rule ends the game.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Terminal check on the board after a move. Checkmate is won by the side that
/// just moved; every other terminal state is a draw.
pub fn detect_outcome(board: &Board) -> Option<Outcome> {
    if board.is_checkmate() {
        return Some(Outcome {
            winner: board.side_to_move().opposite().into(),
            reason: OutcomeReason::Checkmate,
        });
    }
    let reason = if board.is_stalemate() {
        OutcomeReason::Stalemate
    } else if board.is_insufficient_material() {
        OutcomeReason::InsufficientMaterial
    } else if board.halfmove_clock() >= FIFTY_MOVE_HALFMOVES {
        OutcomeReason::FiftyMoveRule
    } else {
        return None;
    };
    Some(Outcome {
        winner: GameWinner::Draw,
        reason,
    })
}
