use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::board::Side;
use crate::errors::domain::{DomainError, ValidationKind};

const MAX_SESSION_ID_LEN: usize = 128;

/// Externally assigned, stable session identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::InvalidSessionId,
                "session id must not be empty",
            ));
        }
        if trimmed.len() > MAX_SESSION_ID_LEN {
            return Err(DomainError::validation(
                ValidationKind::InvalidSessionId,
                format!("session id longer than {MAX_SESSION_ID_LEN} bytes"),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who plays a color. Closed set; every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActorKind {
    /// A human; moves arrive through the human-move ingress.
    Player { id: String },
    /// A generative model reached over HTTP.
    Model { model_ref: String },
    /// Built-in search engine.
    Engine { level: u8 },
    /// Uniform random legal moves.
    Random {
        #[serde(default)]
        seed: Option<u64>,
    },
    /// A slow physical device; the run suspends until its callback.
    /// `assist` asks the engine at that level for the move the device executes.
    External {
        device: String,
        #[serde(default)]
        assist: Option<u8>,
    },
}

impl ActorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActorKind::Player { .. } => "player",
            ActorKind::Model { .. } => "model",
            ActorKind::Engine { .. } => "engine",
            ActorKind::Random { .. } => "random",
            ActorKind::External { .. } => "external",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Playing,
    Paused,
    Completed,
    Error,
}

impl GameStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Playing => "PLAYING",
            GameStatus::Paused => "PAUSED",
            GameStatus::Completed => "COMPLETED",
            GameStatus::Error => "ERROR",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "PLAYING" => Ok(GameStatus::Playing),
            "PAUSED" => Ok(GameStatus::Paused),
            "COMPLETED" => Ok(GameStatus::Completed),
            "ERROR" => Ok(GameStatus::Error),
            other => Err(DomainError::validation(
                ValidationKind::Other("GameStatus".into()),
                format!("unknown game status '{other}'"),
            )),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure recorded by the catch-all handler. `kind` is an `ErrorCode` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub kind: String,
    pub cause: String,
}

impl LastError {
    pub fn from_error(err: &DomainError) -> Self {
        Self {
            kind: err.code().as_str().to_string(),
            cause: err.cause().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub white: ActorKind,
    pub black: ActorKind,
    pub status: GameStatus,
    pub last_error: Option<LastError>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Session {
    pub fn new(id: SessionId, white: ActorKind, black: ActorKind) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            white,
            black,
            status: GameStatus::Playing,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn actor_for(&self, side: Side) -> &ActorKind {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }
}
