//! Head loading with crash repair.

use tracing::{info, warn};

use super::store::{GameStore, HeadPatch, HeadPredicate};
use crate::domain::moves::append_san;
use crate::domain::{LatestMoveHead, Session, SessionId};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};

pub async fn require_session(
    store: &dyn GameStore,
    id: &SessionId,
) -> Result<Session, DomainError> {
    store
        .get_session(id)
        .await?
        .ok_or_else(|| DomainError::not_found(NotFoundKind::Session, format!("session {id}")))
}

pub async fn require_head(
    store: &dyn GameStore,
    id: &SessionId,
) -> Result<LatestMoveHead, DomainError> {
    store
        .get_latest_head(id)
        .await?
        .ok_or_else(|| DomainError::not_found(NotFoundKind::Head, format!("head of {id}")))
}

/// Read the head, rolling it forward when the move log is ahead of it.
///
/// Records are appended before the head is updated, so a run that died in
/// between leaves the newest record unreflected. Locks and tokens are not
/// touched here; only board, count and history are re-derived.
pub async fn load_head(
    store: &dyn GameStore,
    id: &SessionId,
) -> Result<LatestMoveHead, DomainError> {
    let head = require_head(store, id).await?;
    let Some(record) = store.latest_move_record(id).await? else {
        return Ok(head);
    };
    if record.move_count <= head.move_count {
        return Ok(head);
    }

    warn!(
        session_id = %id,
        head_move_count = head.move_count,
        record_move_count = record.move_count,
        "head behind move log, repairing"
    );
    let san_list = match &record.san {
        Some(san) => append_san(&head.san_list, record.move_count, san),
        None => head.san_list.clone(),
    };
    let predicate = HeadPredicate::any()
        .move_count(head.move_count)
        .board(head.board.clone());
    let patch = HeadPatch::new()
        .with_board(record.board.clone())
        .with_move_count(record.move_count)
        .with_san_list(san_list);

    match store.conditional_update_head(id, &predicate, &patch).await {
        Ok(repaired) => {
            info!(session_id = %id, move_count = repaired.move_count, "head repaired");
            Ok(repaired)
        }
        // Someone else moved the head on first; theirs is at least as fresh.
        Err(e) if e.is_conflict(&ConflictKind::ConditionFailed) => require_head(store, id).await,
        Err(e) => Err(e),
    }
}
