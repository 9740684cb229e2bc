//! Store wrapper that fails one chosen call.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use gambit_backend::domain::{
    GameStatus, LastError, LatestMoveHead, MoveRecord, Session, SessionId,
};
use gambit_backend::errors::domain::{DomainError, InfraErrorKind};
use gambit_backend::repos::{GameStore, HeadPatch, HeadPredicate};
use parking_lot::Mutex;

pub struct FaultyStore {
    inner: Arc<dyn GameStore>,
    /// Calls left before the fault; negative when disarmed.
    countdown: AtomicI64,
    calls: Mutex<Vec<&'static str>>,
    tripped: Mutex<Option<&'static str>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn GameStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            countdown: AtomicI64::new(-1),
            calls: Mutex::new(Vec::new()),
            tripped: Mutex::new(None),
        })
    }

    /// Fail the `n`-th call from now (0 = the next one), once.
    pub fn fail_nth(&self, n: u32) {
        self.calls.lock().clear();
        *self.tripped.lock() = None;
        self.countdown.store(i64::from(n), Ordering::SeqCst);
    }

    /// The operation the fault hit, if it fired.
    pub fn tripped(&self) -> Option<&'static str> {
        *self.tripped.lock()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn tick(&self, op: &'static str) -> Result<(), DomainError> {
        self.calls.lock().push(op);
        if self.countdown.fetch_sub(1, Ordering::SeqCst) == 0 {
            *self.tripped.lock() = Some(op);
            return Err(DomainError::infra(
                InfraErrorKind::DbUnavailable,
                format!("injected fault in {op}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl GameStore for FaultyStore {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        self.tick("get_session")?;
        self.inner.get_session(id).await
    }

    async fn create_session(
        &self,
        session: &Session,
        head: &LatestMoveHead,
    ) -> Result<(), DomainError> {
        self.tick("create_session")?;
        self.inner.create_session(session, head).await
    }

    async fn update_session_status(
        &self,
        id: &SessionId,
        status: GameStatus,
        error: Option<LastError>,
    ) -> Result<Session, DomainError> {
        self.tick("update_session_status")?;
        self.inner.update_session_status(id, status, error).await
    }

    async fn get_latest_head(
        &self,
        id: &SessionId,
    ) -> Result<Option<LatestMoveHead>, DomainError> {
        self.tick("get_latest_head")?;
        self.inner.get_latest_head(id).await
    }

    async fn conditional_update_head(
        &self,
        id: &SessionId,
        predicate: &HeadPredicate,
        patch: &HeadPatch,
    ) -> Result<LatestMoveHead, DomainError> {
        self.tick("conditional_update_head")?;
        self.inner.conditional_update_head(id, predicate, patch).await
    }

    async fn append_move_record(&self, record: &MoveRecord) -> Result<(), DomainError> {
        self.tick("append_move_record")?;
        self.inner.append_move_record(record).await
    }

    async fn latest_move_record(
        &self,
        id: &SessionId,
    ) -> Result<Option<MoveRecord>, DomainError> {
        self.tick("latest_move_record")?;
        self.inner.latest_move_record(id).await
    }

    async fn list_move_records(&self, id: &SessionId) -> Result<Vec<MoveRecord>, DomainError> {
        self.tick("list_move_records")?;
        self.inner.list_move_records(id).await
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), DomainError> {
        self.tick("delete_session")?;
        self.inner.delete_session(id).await
    }
}
