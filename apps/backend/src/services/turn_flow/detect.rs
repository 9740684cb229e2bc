//! Detect step: finish the game or schedule the next turn.

use tracing::{debug, info};

use super::machine::{RunContext, Transition};
use super::{TurnFlowService, TurnOutcome};
use crate::domain::{detect_outcome, GameStatus, GameWinner, TurnTrigger};
use crate::errors::domain::{DomainError, InfraErrorKind};
use crate::events::{emit, GameEvent};
use crate::repos::{require_session, HeadPatch, HeadPredicate};

impl TurnFlowService {
    pub(super) async fn detect(&self, ctx: RunContext) -> Result<Transition, DomainError> {
        let outcome = detect_outcome(ctx.board()?);
        let committed = ctx.committed.clone();

        let Some(outcome) = outcome else {
            // Only continue the loop for a session nobody paused meanwhile.
            let session = require_session(self.store.as_ref(), &ctx.session_id).await?;
            if session.status == GameStatus::Playing {
                self.triggers
                    .enqueue(TurnTrigger::advance(ctx.session_id.clone()))
                    .await?;
                debug!("next turn scheduled");
            } else {
                debug!(status = %session.status, "session no longer playing, not scheduling");
            }
            // Detect is only entered without a commit for terminal heads.
            let c = committed.ok_or_else(|| {
                DomainError::infra(
                    InfraErrorKind::Other("TurnFlow".into()),
                    "ongoing game reached detect without a committed move",
                )
            })?;
            return Ok(Transition::Finish(TurnOutcome::Committed {
                move_count: c.move_count,
                san: c.san,
                winner: None,
            }));
        };

        self.finalize(&ctx, outcome.winner).await?;
        info!(
            winner = outcome.winner.as_str(),
            reason = ?outcome.reason,
            "game over"
        );
        emit(
            self.events.as_ref(),
            GameEvent::GameCompleted {
                session_id: ctx.session_id.clone(),
                winner: outcome.winner,
                reason: outcome.reason,
            },
        )
        .await;

        Ok(Transition::Finish(match committed {
            Some(c) => TurnOutcome::Committed {
                move_count: c.move_count,
                san: c.san,
                winner: Some(outcome.winner),
            },
            None => TurnOutcome::Finalized {
                winner: outcome.winner,
            },
        }))
    }

    /// Winner on the head first, then the session status. Both writes are
    /// idempotent, so a rerun after a crash in between converges.
    async fn finalize(&self, ctx: &RunContext, winner: GameWinner) -> Result<(), DomainError> {
        let head = ctx.head()?;
        if head.game_winner != Some(winner) {
            self.store
                .conditional_update_head(
                    &ctx.session_id,
                    &HeadPredicate::any(),
                    &HeadPatch::new().with_winner(winner),
                )
                .await?;
        }
        self.store
            .update_session_status(&ctx.session_id, GameStatus::Completed, None)
            .await?;
        Ok(())
    }
}
