//! Domain layer: session model, board wrapper, and the pure turn rules.

pub mod board;
pub mod moves;
pub mod outcome;
pub mod seed_derivation;
pub mod session;
pub mod trigger;
pub mod turn;

// Re-exports for ergonomics
pub use board::{side_to_move, Board, Side, STARTING_FEN};
pub use moves::{CallbackToken, GameWinner, LatestMoveHead, MoveCandidate, MoveRecord, RunId};
pub use outcome::{detect_outcome, Outcome, OutcomeReason};
pub use seed_derivation::{derive_move_seed, session_seed};
pub use session::{ActorKind, GameStatus, LastError, Session, SessionId};
pub use trigger::{ActorResult, TurnTrigger};
pub use turn::{resolve_turn, TurnActor};
