//! Parking a run on an external device, and picking it back up.
//!
//! Suspending writes a callback token next to the run's lock and hands the
//! token to the device. The run then ends; no task waits on the device.
//! When the device calls back with a matching token, the callback is
//! cleared and the run continues at Commit under the lock it left behind.

use tracing::{debug, info, warn};

use super::machine::{RunContext, Transition};
use super::{FlowState, SkipReason, TurnFlowService, TurnOutcome};
use crate::actors::ActuationRequest;
use crate::domain::{
    resolve_turn, ActorResult, Board, CallbackToken, LatestMoveHead, MoveCandidate, RunId,
    SessionId,
};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::events::{emit, GameEvent};
use crate::repos::{load_head, require_session, HeadPatch, HeadPredicate};

impl TurnFlowService {
    pub(super) async fn suspend(&self, ctx: RunContext) -> Result<Transition, DomainError> {
        let run_id = ctx.run_id()?;
        let request = ctx
            .suspend
            .clone()
            .ok_or_else(|| DomainError::actor("suspend requested without a device"))?;
        let token = CallbackToken::issue(&ctx.session_id);

        let predicate = HeadPredicate::any()
            .lock_equals(run_id.as_str())
            .callback_absent();
        let patch = HeadPatch::new()
            .with_callback(token.as_str())
            .with_suggested_move(request.suggested_move.clone());
        self.store
            .conditional_update_head(&ctx.session_id, &predicate, &patch)
            .await
            .map_err(|e| {
                if e.is_conflict(&ConflictKind::ConditionFailed) {
                    DomainError::conflict(
                        ConflictKind::MoveConflict,
                        "head changed before the run could suspend",
                    )
                } else {
                    e
                }
            })?;

        let actuation = ActuationRequest {
            session_id: ctx.session_id.clone(),
            device: request.device.clone(),
            callback_token: token.as_str().to_string(),
            board: ctx.head()?.board.clone(),
            suggested_move: request.suggested_move.clone(),
        };
        self.actuators.request(&actuation).await?;

        info!(
            run_id = %run_id,
            device = %request.device,
            "run suspended on external device"
        );
        emit(
            self.events.as_ref(),
            GameEvent::TurnSuspended {
                session_id: ctx.session_id.clone(),
                device: request.device,
                callback_token: token.as_str().to_string(),
                suggested_move: request.suggested_move,
            },
        )
        .await;

        Ok(Transition::Finish(TurnOutcome::Suspended {
            callback_token: token.as_str().to_string(),
        }))
    }

    /// Match the token against the head, clear it, and continue at Commit.
    ///
    /// Anything that does not match is a superseded or duplicate callback
    /// and is dropped as `Skipped(StaleCallback)`.
    pub(super) async fn resume_parked(
        &self,
        raw_token: &str,
        result: ActorResult,
    ) -> Result<TurnOutcome, DomainError> {
        let stale = Ok(TurnOutcome::Skipped(SkipReason::StaleCallback));
        let Ok(token) = CallbackToken::parse(raw_token) else {
            debug!("malformed callback token dropped");
            return stale;
        };
        let Ok(session_id) = token.session_id() else {
            return stale;
        };

        let head = match load_head(self.store.as_ref(), &session_id).await {
            Ok(head) => head,
            Err(DomainError::NotFound(NotFoundKind::Head | NotFoundKind::Session, _)) => {
                debug!(session_id = %session_id, "callback for unknown session dropped");
                return stale;
            }
            Err(e) => return Err(e),
        };
        if head.callback_token.as_deref() != Some(token.as_str()) {
            debug!(session_id = %session_id, "stale callback dropped");
            return stale;
        }

        // The run that parked keeps its lock; adopt it. A missing lock means
        // someone force-cleared it, so take a fresh one in the same write.
        let run_id = head
            .lock_token
            .clone()
            .map(RunId::from_token)
            .unwrap_or_else(RunId::generate);
        let predicate = HeadPredicate::any().callback_equals(token.as_str());
        let patch = HeadPatch::new()
            .clear_callback()
            .with_suggested_move(None)
            .with_lock(run_id.as_str());
        let head = match self
            .store
            .conditional_update_head(&session_id, &predicate, &patch)
            .await
        {
            Ok(head) => head,
            Err(e) if e.is_conflict(&ConflictKind::ConditionFailed) => {
                debug!(session_id = %session_id, "callback lost the race, dropped");
                return stale;
            }
            Err(e) => return Err(e),
        };
        info!(session_id = %session_id, run_id = %run_id, "run resumed");

        // From here the run owns the session again; failures go to the catch-all.
        match self.prepare_resumed(&session_id, &run_id, head, result).await {
            Ok(ctx) => self.run(FlowState::Commit, ctx).await,
            Err(err) => Err(self
                .catch_all(&session_id, Some(&run_id), FlowState::Suspend, err)
                .await),
        }
    }

    async fn prepare_resumed(
        &self,
        session_id: &SessionId,
        run_id: &RunId,
        head: LatestMoveHead,
        result: ActorResult,
    ) -> Result<RunContext, DomainError> {
        let san = match result {
            ActorResult::Moved { san } => san,
            ActorResult::Failed { cause } => {
                warn!(session_id = %session_id, cause = %cause, "device reported failure");
                return Err(DomainError::actor(cause));
            }
        };
        let session = require_session(self.store.as_ref(), session_id).await?;
        let board = Board::from_fen(&head.board)?;
        let turn = resolve_turn(&session, &head.board)?;
        let played = board.play_san(&san)?;

        let mut ctx = RunContext::new(session_id.clone());
        ctx.run_id = Some(run_id.clone());
        ctx.candidate = Some(MoveCandidate {
            san: played.san,
            board: played.board.to_fen(),
        });
        ctx.session = Some(session);
        ctx.head = Some(head);
        ctx.board = Some(board);
        ctx.turn = Some(turn);
        Ok(ctx)
    }
}
