//! Session lifecycle: creation, operator status changes, views, deletion.
//!
//! None of these touch the head's tokens except an explicit force release,
//! which is how an operator unsticks a session whose run died or whose
//! device never called back.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{
    ActorKind, GameStatus, LatestMoveHead, MoveRecord, Session, SessionId, TurnTrigger,
};
use crate::errors::domain::{DomainError, ValidationKind};
use crate::queue::TriggerSink;
use crate::repos::{require_head, require_session, GameStore, HeadPatch, HeadPredicate};

/// Session with its head and full move log.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session: Session,
    pub head: LatestMoveHead,
    pub moves: Vec<MoveRecord>,
}

pub struct SessionsService {
    store: Arc<dyn GameStore>,
    triggers: Arc<dyn TriggerSink>,
}

impl SessionsService {
    pub fn new(store: Arc<dyn GameStore>, triggers: Arc<dyn TriggerSink>) -> Self {
        Self { store, triggers }
    }

    /// Create a session at the starting position and schedule its first turn.
    pub async fn create_session(
        &self,
        id: SessionId,
        white: ActorKind,
        black: ActorKind,
    ) -> Result<Session, DomainError> {
        let session = Session::new(id.clone(), white, black);
        let head = LatestMoveHead::initial(id.clone());
        self.store.create_session(&session, &head).await?;
        info!(
            session_id = %id,
            white = session.white.label(),
            black = session.black.label(),
            "session created"
        );
        self.triggers.enqueue(TurnTrigger::advance(id)).await?;
        Ok(session)
    }

    /// Operator status change. Only `Playing` and `Paused` may be requested;
    /// `Completed` and `Error` belong to the turn engine.
    ///
    /// `force_release` clears the lock and callback tokens first.
    pub async fn change_status(
        &self,
        id: &SessionId,
        status: GameStatus,
        force_release: bool,
    ) -> Result<Session, DomainError> {
        let current = require_session(self.store.as_ref(), id).await?;
        if !matches!(status, GameStatus::Playing | GameStatus::Paused) {
            return Err(DomainError::validation(
                ValidationKind::Other("StatusChange".into()),
                format!("status {status} cannot be requested"),
            ));
        }
        if current.status == GameStatus::Completed {
            return Err(DomainError::validation(
                ValidationKind::NotPlaying,
                format!("session {id} is completed"),
            ));
        }

        if force_release {
            let patch = HeadPatch::new()
                .clear_lock()
                .clear_callback()
                .with_suggested_move(None);
            self.store
                .conditional_update_head(id, &HeadPredicate::any(), &patch)
                .await?;
            warn!(session_id = %id, "session tokens force-released by operator");
        }

        let updated = match status {
            GameStatus::Playing => {
                let session = self
                    .store
                    .update_session_status(id, GameStatus::Playing, None)
                    .await?;
                self.triggers
                    .enqueue(TurnTrigger::advance(id.clone()))
                    .await?;
                session
            }
            _ => {
                self.store
                    .update_session_status(id, status, current.last_error.clone())
                    .await?
            }
        };
        info!(
            session_id = %id,
            from = %current.status,
            to = %updated.status,
            "session status changed"
        );
        Ok(updated)
    }

    pub async fn get_session_view(&self, id: &SessionId) -> Result<SessionView, DomainError> {
        let session = require_session(self.store.as_ref(), id).await?;
        let head = require_head(self.store.as_ref(), id).await?;
        let moves = self.store.list_move_records(id).await?;
        Ok(SessionView {
            session,
            head,
            moves,
        })
    }

    pub async fn delete_session(&self, id: &SessionId) -> Result<(), DomainError> {
        self.store.delete_session(id).await?;
        info!(session_id = %id, "session deleted");
        Ok(())
    }
}
