//! Actor contract shared by every seat implementation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::board::Played;
use crate::domain::{MoveCandidate, Side, SessionId};
use crate::errors::domain::DomainError;

/// Failure reported by an actor. The cause is surfaced verbatim on the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorError {
    pub cause: String,
}

impl ActorError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor error: {}", self.cause)
    }
}

impl std::error::Error for ActorError {}

impl From<ActorError> for DomainError {
    fn from(err: ActorError) -> Self {
        DomainError::actor(err.cause)
    }
}

/// What an actor sees when asked for a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRequest {
    pub session_id: SessionId,
    pub side: Side,
    pub board: String,
    pub move_count: u32,
    pub san_list: String,
}

/// Free-text note an actor attaches to its move (e.g. a model's justification).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorComment {
    pub author: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorMove {
    pub candidate: MoveCandidate,
    pub comment: Option<ActorComment>,
}

impl ActorMove {
    pub fn from_played(played: Played) -> Self {
        Self {
            candidate: MoveCandidate {
                san: played.san,
                board: played.board.to_fen(),
            },
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: ActorComment) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// The run must park until an external device reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspendRequest {
    pub device: String,
    /// Move the device is asked to execute, when something pre-computed one.
    pub suggested_move: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorReply {
    Move(ActorMove),
    Suspend(SuspendRequest),
    /// A human is to move and nothing was supplied.
    AwaitHuman,
}
