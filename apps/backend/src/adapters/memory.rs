//! In-process store backed by `DashMap`.
//!
//! Conditional head updates run under the head's shard lock, so the
//! predicate check and the write are atomic with respect to other callers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use time::OffsetDateTime;

use crate::domain::{GameStatus, LastError, LatestMoveHead, MoveRecord, Session, SessionId};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::repos::{GameStore, HeadPatch, HeadPredicate};

#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: DashMap<SessionId, Session>,
    heads: DashMap<SessionId, LatestMoveHead>,
    records: DashMap<SessionId, BTreeMap<u32, MoveRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

fn session_missing(id: &SessionId) -> DomainError {
    DomainError::not_found(NotFoundKind::Session, format!("session {id}"))
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.get(id).map(|s| s.clone()))
    }

    async fn create_session(
        &self,
        session: &Session,
        head: &LatestMoveHead,
    ) -> Result<(), DomainError> {
        match self.sessions.entry(session.id.clone()) {
            Entry::Occupied(_) => Err(DomainError::conflict(
                ConflictKind::SessionExists,
                format!("session {} already exists", session.id),
            )),
            Entry::Vacant(slot) => {
                self.heads.insert(session.id.clone(), head.clone());
                slot.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn update_session_status(
        &self,
        id: &SessionId,
        status: GameStatus,
        error: Option<LastError>,
    ) -> Result<Session, DomainError> {
        let mut session = self.sessions.get_mut(id).ok_or_else(|| session_missing(id))?;
        session.status = status;
        session.last_error = error;
        session.updated_at = OffsetDateTime::now_utc();
        Ok(session.clone())
    }

    async fn get_latest_head(
        &self,
        id: &SessionId,
    ) -> Result<Option<LatestMoveHead>, DomainError> {
        Ok(self.heads.get(id).map(|h| h.clone()))
    }

    async fn conditional_update_head(
        &self,
        id: &SessionId,
        predicate: &HeadPredicate,
        patch: &HeadPatch,
    ) -> Result<LatestMoveHead, DomainError> {
        let mut head = self.heads.get_mut(id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Head, format!("head of {id}"))
        })?;
        if !predicate.matches(&head) {
            return Err(DomainError::conflict(
                ConflictKind::ConditionFailed,
                format!("head of {id} changed (version {})", head.version),
            ));
        }
        patch.apply(&mut head);
        head.version += 1;
        head.updated_at = OffsetDateTime::now_utc();
        Ok(head.clone())
    }

    async fn append_move_record(&self, record: &MoveRecord) -> Result<(), DomainError> {
        if !self.sessions.contains_key(&record.session_id) {
            return Err(session_missing(&record.session_id));
        }
        let mut log = self.records.entry(record.session_id.clone()).or_default();
        if log.contains_key(&record.sequence) {
            return Err(DomainError::conflict(
                ConflictKind::DuplicateRecord,
                format!(
                    "record {} of {} already exists",
                    record.sequence, record.session_id
                ),
            ));
        }
        log.insert(record.sequence, record.clone());
        Ok(())
    }

    async fn latest_move_record(
        &self,
        id: &SessionId,
    ) -> Result<Option<MoveRecord>, DomainError> {
        Ok(self
            .records
            .get(id)
            .and_then(|log| log.values().next_back().cloned()))
    }

    async fn list_move_records(&self, id: &SessionId) -> Result<Vec<MoveRecord>, DomainError> {
        Ok(self
            .records
            .get(id)
            .map(|log| log.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), DomainError> {
        self.sessions.remove(id).ok_or_else(|| session_missing(id))?;
        self.heads.remove(id);
        self.records.remove(id);
        Ok(())
    }
}
