//! Turn resolution: which actor plays the side to move.

use super::board::{side_to_move, Side};
use super::session::{ActorKind, Session};
use crate::errors::domain::DomainError;

/// The actor whose turn it is, with the side it plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnActor {
    pub side: Side,
    pub actor: ActorKind,
}

impl TurnActor {
    pub fn is_human(&self) -> bool {
        matches!(self.actor, ActorKind::Player { .. })
    }
}

/// Map the board's side to move onto the session's seat assignment.
///
/// Pure: reads only the second FEN field, never the position itself.
pub fn resolve_turn(session: &Session, board: &str) -> Result<TurnActor, DomainError> {
    let side = side_to_move(board)?;
    Ok(TurnActor {
        side,
        actor: session.actor_for(side).clone(),
    })
}
