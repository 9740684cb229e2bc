//! Move log and the mutable latest-move head.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use ulid::Ulid;

use super::board::{Side, STARTING_FEN};
use super::session::SessionId;
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};

/// Identity of one orchestration run; written to the head as its lock token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Continuation token handed to a suspended actor: `<session-id>#<ulid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackToken(String);

impl CallbackToken {
    pub fn issue(session_id: &SessionId) -> Self {
        Self(format!("{}#{}", session_id.as_str(), Ulid::new()))
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let token = raw.trim();
        match token.rsplit_once('#') {
            Some((session, nonce)) if !session.trim().is_empty() && !nonce.is_empty() => {
                Ok(Self(token.to_string()))
            }
            _ => Err(DomainError::conflict(
                ConflictKind::StaleCallback,
                "callback token is malformed",
            )),
        }
    }

    /// The session this token was issued for.
    pub fn session_id(&self) -> Result<SessionId, DomainError> {
        let (session, _) = self.0.rsplit_once('#').ok_or_else(|| {
            DomainError::conflict(ConflictKind::StaleCallback, "callback token is malformed")
        })?;
        SessionId::new(session)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameWinner {
    White,
    Black,
    Draw,
}

impl GameWinner {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GameWinner::White => "WHITE",
            GameWinner::Black => "BLACK",
            GameWinner::Draw => "DRAW",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "WHITE" => Ok(GameWinner::White),
            "BLACK" => Ok(GameWinner::Black),
            "DRAW" => Ok(GameWinner::Draw),
            other => Err(DomainError::validation(
                ValidationKind::Other("GameWinner".into()),
                format!("unknown game winner '{other}'"),
            )),
        }
    }
}

impl From<Side> for GameWinner {
    fn from(side: Side) -> Self {
        match side {
            Side::White => GameWinner::White,
            Side::Black => GameWinner::Black,
        }
    }
}

/// A move proposed for commit: SAN plus the board it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCandidate {
    pub san: String,
    pub board: String,
}

/// Immutable log entry; `sequence == move_count`, 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub session_id: SessionId,
    pub sequence: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    pub board: String,
    pub move_count: u32,
    pub san: Option<String>,
    pub run_id: Option<String>,
}

/// The single mutable pointer for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestMoveHead {
    pub session_id: SessionId,
    pub board: String,
    pub move_count: u32,
    pub san_list: String,
    pub lock_token: Option<String>,
    pub callback_token: Option<String>,
    pub suggested_move: Option<String>,
    pub game_winner: Option<GameWinner>,
    pub version: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl LatestMoveHead {
    pub fn initial(session_id: SessionId) -> Self {
        Self {
            session_id,
            board: STARTING_FEN.to_string(),
            move_count: 0,
            san_list: String::new(),
            lock_token: None,
            callback_token: None,
            suggested_move: None,
            game_winner: None,
            version: 1,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    /// A run or a suspended actor owns the session.
    pub fn is_owned(&self) -> bool {
        self.lock_token.is_some() || self.callback_token.is_some()
    }
}

/// Append one ply to the running history, `"1. e4 2. e5 "` style.
pub fn append_san(san_list: &str, move_number: u32, san: &str) -> String {
    format!("{san_list}{move_number}. {san} ")
}
