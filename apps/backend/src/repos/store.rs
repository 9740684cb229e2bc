//! The persistent store port.
//!
//! Every read and write of sessions, heads and move records goes through
//! [`GameStore`]. Head writes are conditional: the caller states what it
//! expects the head to look like and the store applies the patch only if
//! that still holds.

use async_trait::async_trait;

use crate::domain::{
    GameStatus, GameWinner, LastError, LatestMoveHead, MoveRecord, Session, SessionId,
};
use crate::errors::domain::DomainError;

/// Expectation on one of the head's token columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TokenExpect {
    #[default]
    Any,
    Absent,
    Equals(String),
}

impl TokenExpect {
    pub fn holds(&self, actual: Option<&str>) -> bool {
        match self {
            TokenExpect::Any => true,
            TokenExpect::Absent => actual.is_none(),
            TokenExpect::Equals(expected) => actual == Some(expected.as_str()),
        }
    }
}

/// Predicate for [`GameStore::conditional_update_head`]. The default holds for any head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadPredicate {
    pub lock: TokenExpect,
    pub callback: TokenExpect,
    pub move_count: Option<u32>,
    pub board: Option<String>,
}

impl HeadPredicate {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn lock_absent(mut self) -> Self {
        self.lock = TokenExpect::Absent;
        self
    }

    pub fn lock_equals(mut self, token: impl Into<String>) -> Self {
        self.lock = TokenExpect::Equals(token.into());
        self
    }

    pub fn callback_absent(mut self) -> Self {
        self.callback = TokenExpect::Absent;
        self
    }

    pub fn callback_equals(mut self, token: impl Into<String>) -> Self {
        self.callback = TokenExpect::Equals(token.into());
        self
    }

    pub fn move_count(mut self, count: u32) -> Self {
        self.move_count = Some(count);
        self
    }

    pub fn board(mut self, fen: impl Into<String>) -> Self {
        self.board = Some(fen.into());
        self
    }

    pub fn matches(&self, head: &LatestMoveHead) -> bool {
        self.lock.holds(head.lock_token.as_deref())
            && self.callback.holds(head.callback_token.as_deref())
            && self.move_count.map_or(true, |n| n == head.move_count)
            && self.board.as_ref().map_or(true, |b| *b == head.board)
    }
}

/// Partial head update. Clearable columns use `Option<Option<_>>`:
/// `Some(None)` clears, `None` leaves the column alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadPatch {
    pub board: Option<String>,
    pub move_count: Option<u32>,
    pub san_list: Option<String>,
    pub lock_token: Option<Option<String>>,
    pub callback_token: Option<Option<String>>,
    pub suggested_move: Option<Option<String>>,
    pub game_winner: Option<Option<GameWinner>>,
}

impl HeadPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_board(mut self, fen: impl Into<String>) -> Self {
        self.board = Some(fen.into());
        self
    }

    pub fn with_move_count(mut self, count: u32) -> Self {
        self.move_count = Some(count);
        self
    }

    pub fn with_san_list(mut self, san_list: impl Into<String>) -> Self {
        self.san_list = Some(san_list.into());
        self
    }

    pub fn with_lock(mut self, token: impl Into<String>) -> Self {
        self.lock_token = Some(Some(token.into()));
        self
    }

    pub fn clear_lock(mut self) -> Self {
        self.lock_token = Some(None);
        self
    }

    pub fn with_callback(mut self, token: impl Into<String>) -> Self {
        self.callback_token = Some(Some(token.into()));
        self
    }

    pub fn clear_callback(mut self) -> Self {
        self.callback_token = Some(None);
        self
    }

    pub fn with_suggested_move(mut self, san: Option<String>) -> Self {
        self.suggested_move = Some(san);
        self
    }

    pub fn with_winner(mut self, winner: GameWinner) -> Self {
        self.game_winner = Some(Some(winner));
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to an in-memory head. Stores bump `version` and `updated_at` themselves.
    pub fn apply(&self, head: &mut LatestMoveHead) {
        if let Some(board) = &self.board {
            head.board = board.clone();
        }
        if let Some(count) = self.move_count {
            head.move_count = count;
        }
        if let Some(san_list) = &self.san_list {
            head.san_list = san_list.clone();
        }
        if let Some(lock) = &self.lock_token {
            head.lock_token = lock.clone();
        }
        if let Some(callback) = &self.callback_token {
            head.callback_token = callback.clone();
        }
        if let Some(suggested) = &self.suggested_move {
            head.suggested_move = suggested.clone();
        }
        if let Some(winner) = self.game_winner {
            head.game_winner = winner;
        }
    }
}

#[async_trait]
pub trait GameStore: Send + Sync {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// Insert a session together with its initial head.
    /// Fails with `Conflict(SessionExists)` if the id is taken.
    async fn create_session(
        &self,
        session: &Session,
        head: &LatestMoveHead,
    ) -> Result<(), DomainError>;

    /// Set the status and overwrite the stored last error.
    async fn update_session_status(
        &self,
        id: &SessionId,
        status: GameStatus,
        error: Option<LastError>,
    ) -> Result<Session, DomainError>;

    async fn get_latest_head(&self, id: &SessionId)
        -> Result<Option<LatestMoveHead>, DomainError>;

    /// Apply `patch` only if `predicate` holds. Fails with
    /// `Conflict(ConditionFailed)` when it does not, `NotFound(Head)` when
    /// there is no head.
    async fn conditional_update_head(
        &self,
        id: &SessionId,
        predicate: &HeadPredicate,
        patch: &HeadPatch,
    ) -> Result<LatestMoveHead, DomainError>;

    /// Fails with `Conflict(DuplicateRecord)` if the sequence is taken.
    async fn append_move_record(&self, record: &MoveRecord) -> Result<(), DomainError>;

    async fn latest_move_record(&self, id: &SessionId)
        -> Result<Option<MoveRecord>, DomainError>;

    async fn list_move_records(&self, id: &SessionId) -> Result<Vec<MoveRecord>, DomainError>;

    /// Remove a session with its head and records. Never called by the turn engine.
    async fn delete_session(&self, id: &SessionId) -> Result<(), DomainError>;
}
