//! Commit step: the single point where a move becomes part of the game.
//!
//! The record is appended before the head moves. A crash in between leaves
//! a record the head does not reflect yet; `load_head` rolls it forward.

use time::OffsetDateTime;
use tracing::{info, warn};

use super::machine::{CommittedMove, RunContext, Transition};
use super::{FlowState, TurnFlowService};
use crate::domain::board::normalize_fen;
use crate::domain::moves::append_san;
use crate::domain::{LatestMoveHead, MoveRecord, RunId, SessionId};
use crate::errors::domain::{ConflictKind, DomainError};
use crate::events::{emit, GameEvent};
use crate::repos::{require_head, HeadPatch, HeadPredicate};

impl TurnFlowService {
    pub(super) async fn commit(&self, mut ctx: RunContext) -> Result<Transition, DomainError> {
        let run_id = ctx.run_id()?.clone();
        let prior = ctx.head()?.clone();
        let candidate = ctx
            .candidate
            .clone()
            .ok_or_else(|| DomainError::actor("no move to commit"))?;

        // The head must still be the one this run dispatched against.
        let current = require_head(self.store.as_ref(), &ctx.session_id).await?;
        if current.lock_token.as_deref() != Some(run_id.as_str())
            || current.move_count != prior.move_count
            || current.board != prior.board
        {
            return Err(DomainError::conflict(
                ConflictKind::MoveConflict,
                format!(
                    "head moved since dispatch (expected move {}, found {})",
                    prior.move_count, current.move_count
                ),
            ));
        }

        // Replay the move; the actor's claimed board has to agree.
        let played = ctx.board()?.play_san(&candidate.san)?;
        let board = played.board.to_fen();
        if normalize_fen(&candidate.board)? != board {
            return Err(DomainError::conflict(
                ConflictKind::MoveConflict,
                format!("{} does not lead to the proposed board", candidate.san),
            ));
        }

        let move_count = prior.move_count + 1;
        let record = MoveRecord {
            session_id: ctx.session_id.clone(),
            sequence: move_count,
            recorded_at: OffsetDateTime::now_utc(),
            board: board.clone(),
            move_count,
            san: Some(played.san.clone()),
            run_id: Some(run_id.as_str().to_string()),
        };
        self.append_record(&record).await?;

        let predicate = HeadPredicate::any()
            .lock_equals(run_id.as_str())
            .move_count(prior.move_count);
        let patch = HeadPatch::new()
            .with_board(board.clone())
            .with_move_count(move_count)
            .with_san_list(append_san(&prior.san_list, move_count, &played.san))
            .clear_lock()
            .with_suggested_move(None);
        let head = match self
            .store
            .conditional_update_head(&ctx.session_id, &predicate, &patch)
            .await
        {
            Ok(head) => head,
            Err(e) if e.is_conflict(&ConflictKind::ConditionFailed) => {
                self.settle_after_repair(&ctx.session_id, &run_id, &record)
                    .await?
            }
            Err(e) => return Err(e),
        };

        info!(
            run_id = %run_id,
            move_count,
            san = %played.san,
            "move committed"
        );

        let side = ctx.turn()?.side;
        if let Some(comment) = ctx.comment.take() {
            emit(
                self.events.as_ref(),
                GameEvent::Comment {
                    session_id: ctx.session_id.clone(),
                    author: comment.author,
                    text: comment.text,
                },
            )
            .await;
        }
        emit(
            self.events.as_ref(),
            GameEvent::MoveCommitted {
                session_id: ctx.session_id.clone(),
                move_count,
                san: played.san.clone(),
                board: board.clone(),
                side,
            },
        )
        .await;

        ctx.committed = Some(CommittedMove {
            move_count,
            san: played.san,
            board,
        });
        ctx.board = Some(played.board);
        ctx.head = Some(head);
        Ok(Transition::Next(FlowState::Detect, ctx))
    }

    /// Append, treating an identical existing record as ours.
    async fn append_record(&self, record: &MoveRecord) -> Result<(), DomainError> {
        match self.store.append_move_record(record).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_conflict(&ConflictKind::DuplicateRecord) => {
                let existing = self.store.latest_move_record(&record.session_id).await?;
                match existing {
                    Some(prev) if prev.sequence == record.sequence && prev.board == record.board => {
                        warn!(sequence = record.sequence, "record already present, reusing");
                        Ok(())
                    }
                    _ => Err(DomainError::conflict(
                        ConflictKind::MoveConflict,
                        format!("move {} was recorded by someone else", record.sequence),
                    )),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// The head update lost its predicate. If a concurrent repair already
    /// rolled the head forward to our record, only our lock is left to clear.
    async fn settle_after_repair(
        &self,
        session_id: &SessionId,
        run_id: &RunId,
        record: &MoveRecord,
    ) -> Result<LatestMoveHead, DomainError> {
        let head = require_head(self.store.as_ref(), session_id).await?;
        let ours = head.move_count == record.move_count
            && head.board == record.board
            && head.lock_token.as_deref() == Some(run_id.as_str());
        if !ours {
            return Err(DomainError::conflict(
                ConflictKind::MoveConflict,
                "head changed during commit",
            ));
        }
        let predicate = HeadPredicate::any().lock_equals(run_id.as_str());
        let patch = HeadPatch::new().clear_lock().with_suggested_move(None);
        self.store
            .conditional_update_head(session_id, &predicate, &patch)
            .await
    }
}
