//! Session lock: the head's `lock_token` names the run that owns the turn.

use tracing::{debug, info};

use super::TurnFlowService;
use crate::domain::{LatestMoveHead, RunId, SessionId};
use crate::errors::domain::{ConflictKind, DomainError};
use crate::repos::{HeadPatch, HeadPredicate};

impl TurnFlowService {
    /// Write `run_id` as the lock, provided nobody owns the session and the
    /// head is still the one the turn was resolved against.
    ///
    /// A lost race surfaces as `Conflict(AlreadyLocked)`; nothing is written.
    pub(super) async fn acquire_lock(
        &self,
        session_id: &SessionId,
        run_id: &RunId,
        seen: &LatestMoveHead,
    ) -> Result<LatestMoveHead, DomainError> {
        let predicate = HeadPredicate::any()
            .lock_absent()
            .callback_absent()
            .move_count(seen.move_count)
            .board(seen.board.clone());
        let patch = HeadPatch::new().with_lock(run_id.as_str());

        match self
            .store
            .conditional_update_head(session_id, &predicate, &patch)
            .await
        {
            Ok(head) => {
                info!(session_id = %session_id, run_id = %run_id, "lock acquired");
                Ok(head)
            }
            Err(e) if e.is_conflict(&ConflictKind::ConditionFailed) => {
                debug!(session_id = %session_id, run_id = %run_id, "lock held elsewhere");
                Err(DomainError::conflict(
                    ConflictKind::AlreadyLocked,
                    format!("session {session_id} is owned by another run"),
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Drop our own lock without committing.
    pub(super) async fn release_lock(
        &self,
        session_id: &SessionId,
        run_id: &RunId,
    ) -> Result<(), DomainError> {
        let predicate = HeadPredicate::any().lock_equals(run_id.as_str());
        self.store
            .conditional_update_head(session_id, &predicate, &HeadPatch::new().clear_lock())
            .await?;
        info!(session_id = %session_id, run_id = %run_id, "lock released");
        Ok(())
    }
}
