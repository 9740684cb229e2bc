//! Domain-level error type used across the orchestration core and adapters.
//!
//! This error type is HTTP- and DB-agnostic. Handlers return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::ErrorCode;

/// Infra error kinds to distinguish operational failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InfraErrorKind {
    Timeout,
    DbUnavailable,
    DataCorruption,
    Other(String),
}

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Session,
    Head,
    Other(String),
}

/// Domain-level validation kinds
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    InvalidSessionId,
    InvalidBoardEncoding,
    IllegalMove,
    OutOfTurn,
    NotPlaying,
    Other(String),
}

/// Domain-level conflict kinds
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    /// A different run holds the session lock
    AlreadyLocked,
    /// The head moved on between dispatch and commit
    MoveConflict,
    /// Callback token does not match the head
    StaleCallback,
    /// Conditional head write predicate did not hold
    ConditionFailed,
    /// Move record sequence already taken
    DuplicateRecord,
    SessionExists,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input validation or game rule violation
    Validation(ValidationKind, String),
    /// Semantic conflict
    Conflict(ConflictKind, String),
    /// Missing resource in domain terms
    NotFound(NotFoundKind, String),
    /// The actor playing the turn failed; the payload is the actor's cause
    Actor(String),
    /// Infrastructure/operational failures
    Infra(InfraErrorKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation {kind:?}: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::Actor(cause) => write!(f, "actor error: {cause}"),
            DomainError::Infra(kind, d) => write!(f, "infra {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn actor(cause: impl Into<String>) -> Self {
        Self::Actor(cause.into())
    }
    pub fn infra(kind: InfraErrorKind, detail: impl Into<String>) -> Self {
        Self::Infra(kind, detail.into())
    }

    /// Stable code for this error; persisted as `LastError.kind`.
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::Validation(kind, _) => match kind {
                ValidationKind::InvalidSessionId => ErrorCode::InvalidSessionId,
                ValidationKind::InvalidBoardEncoding => ErrorCode::InvalidBoardEncoding,
                ValidationKind::IllegalMove => ErrorCode::IllegalMove,
                ValidationKind::OutOfTurn => ErrorCode::OutOfTurn,
                ValidationKind::NotPlaying => ErrorCode::NotPlaying,
                ValidationKind::Other(_) => ErrorCode::ValidationError,
            },
            DomainError::Conflict(kind, _) => match kind {
                ConflictKind::AlreadyLocked => ErrorCode::AlreadyLocked,
                ConflictKind::MoveConflict => ErrorCode::MoveConflict,
                ConflictKind::StaleCallback => ErrorCode::StaleCallback,
                ConflictKind::ConditionFailed => ErrorCode::ConditionFailed,
                ConflictKind::DuplicateRecord => ErrorCode::DuplicateRecord,
                ConflictKind::SessionExists => ErrorCode::SessionExists,
                ConflictKind::Other(_) => ErrorCode::Conflict,
            },
            DomainError::NotFound(kind, _) => match kind {
                NotFoundKind::Session => ErrorCode::SessionNotFound,
                NotFoundKind::Head => ErrorCode::HeadNotFound,
                NotFoundKind::Other(_) => ErrorCode::NotFound,
            },
            DomainError::Actor(_) => ErrorCode::ActorError,
            DomainError::Infra(kind, _) => match kind {
                InfraErrorKind::Timeout => ErrorCode::DbTimeout,
                InfraErrorKind::DbUnavailable => ErrorCode::DbUnavailable,
                InfraErrorKind::DataCorruption => ErrorCode::DataCorruption,
                InfraErrorKind::Other(_) => ErrorCode::DbError,
            },
        }
    }

    /// Human-readable cause without the kind prefix.
    pub fn cause(&self) -> &str {
        match self {
            DomainError::Validation(_, d)
            | DomainError::Conflict(_, d)
            | DomainError::NotFound(_, d)
            | DomainError::Infra(_, d) => d,
            DomainError::Actor(cause) => cause,
        }
    }

    pub fn is_conflict(&self, kind: &ConflictKind) -> bool {
        matches!(self, DomainError::Conflict(k, _) if k == kind)
    }
}
