//! Inbound work items: everything that can start or continue a run.

use serde::{Deserialize, Serialize};

use super::moves::CallbackToken;
use super::session::SessionId;
use crate::errors::domain::DomainError;

/// What a suspended external actor reports when it calls back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActorResult {
    Moved { san: String },
    Failed { cause: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnTrigger {
    /// Plain "take the next turn" message (self-scheduled or external).
    Advance { session_id: SessionId },
    /// A human's move for the side they play.
    HumanMove { session_id: SessionId, san: String },
    /// A suspended actor calling back.
    Resume {
        callback_token: CallbackToken,
        result: ActorResult,
    },
}

impl TurnTrigger {
    pub fn advance(session_id: SessionId) -> Self {
        TurnTrigger::Advance { session_id }
    }

    /// Ordering key; resume triggers carry the session inside their token.
    pub fn session_id(&self) -> Result<SessionId, DomainError> {
        match self {
            TurnTrigger::Advance { session_id } | TurnTrigger::HumanMove { session_id, .. } => {
                Ok(session_id.clone())
            }
            TurnTrigger::Resume { callback_token, .. } => callback_token.session_id(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TurnTrigger::Advance { .. } => "advance",
            TurnTrigger::HumanMove { .. } => "human_move",
            TurnTrigger::Resume { .. } => "resume",
        }
    }
}
