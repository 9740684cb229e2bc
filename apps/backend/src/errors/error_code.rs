//! Error codes for the Gambit backend.
//!
//! This module defines all error codes used throughout the application.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses and in `Session.last_error.kind`.

use core::fmt;

/// Centralized error codes.
///
/// Each variant maps to a canonical SCREAMING_SNAKE_CASE string. The strings are
/// persisted on sessions that enter the `ERROR` status, so renaming one is a data
/// migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// Session ID missing or malformed
    InvalidSessionId,
    /// Board encoding could not be parsed
    InvalidBoardEncoding,
    /// Move is not legal in the current position
    IllegalMove,
    /// Move submitted for a side the caller does not play
    OutOfTurn,
    /// Session is not in the PLAYING status
    NotPlaying,
    /// Unknown status or actor payload
    ValidationError,
    /// General bad request error
    BadRequest,

    // Resource Not Found
    /// Session not found
    SessionNotFound,
    /// Latest-move head not found
    HeadNotFound,
    /// General not found error
    NotFound,

    // Orchestration Conflicts
    /// Another run owns the session
    AlreadyLocked,
    /// Head changed between dispatch and commit
    MoveConflict,
    /// Callback token no longer matches the head
    StaleCallback,
    /// Conditional head write predicate did not hold
    ConditionFailed,
    /// Move record with this sequence already exists
    DuplicateRecord,
    /// Session with this ID already exists
    SessionExists,
    /// Generic conflict (fallback for unmatched conflicts)
    Conflict,

    // Actor Failures
    /// The actor chosen for the turn failed
    ActorError,

    // System Errors
    /// Database error
    DbError,
    /// Database unavailable
    DbUnavailable,
    /// Database timeout
    DbTimeout,
    /// Persisted data could not be decoded
    DataCorruption,
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSessionId => "INVALID_SESSION_ID",
            Self::InvalidBoardEncoding => "INVALID_BOARD_ENCODING",
            Self::IllegalMove => "ILLEGAL_MOVE",
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::NotPlaying => "NOT_PLAYING",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",

            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::HeadNotFound => "HEAD_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::AlreadyLocked => "ALREADY_LOCKED",
            Self::MoveConflict => "MOVE_CONFLICT",
            Self::StaleCallback => "STALE_CALLBACK",
            Self::ConditionFailed => "CONDITION_FAILED",
            Self::DuplicateRecord => "DUPLICATE_RECORD",
            Self::SessionExists => "SESSION_EXISTS",
            Self::Conflict => "CONFLICT",

            Self::ActorError => "ACTOR_ERROR",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
