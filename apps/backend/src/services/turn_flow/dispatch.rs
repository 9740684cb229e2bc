//! Resolve and Dispatch steps.

use tracing::{debug, info};

use super::machine::{RunContext, Transition};
use super::{FlowState, SkipReason, TurnFlowService, TurnOutcome};
use crate::actors::{ActorMove, ActorReply, ActorRequest};
use crate::domain::board::Played;
use crate::domain::{
    detect_outcome, resolve_turn, Board, GameStatus, MoveCandidate, RunId, SessionId, TurnActor,
};
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};
use crate::events::{emit, GameEvent};
use crate::repos::{load_head, require_head, require_session};

/// A human move must come from the seat to move and be legal on its board.
fn check_against_turn(turn: &TurnActor, board: &Board, san: &str) -> Result<Played, DomainError> {
    if !turn.is_human() {
        return Err(DomainError::validation(
            ValidationKind::OutOfTurn,
            format!("{} is not played by a human", turn.side),
        ));
    }
    board.play_san(san)
}

impl TurnFlowService {
    /// Read-only admission check for a human move, run by ingress before the
    /// move is queued. The run repeats the check against the head it locks.
    pub async fn check_human_move(
        &self,
        session_id: &SessionId,
        san: &str,
    ) -> Result<(), DomainError> {
        let session = require_session(self.store.as_ref(), session_id).await?;
        if session.status != GameStatus::Playing {
            return Err(DomainError::validation(
                ValidationKind::NotPlaying,
                format!("session {session_id} is {}", session.status),
            ));
        }
        let head = require_head(self.store.as_ref(), session_id).await?;
        let board = Board::from_fen(&head.board)?;
        if detect_outcome(&board).is_some() {
            return Err(DomainError::validation(
                ValidationKind::NotPlaying,
                format!("session {session_id} has already ended"),
            ));
        }
        let turn = resolve_turn(&session, &head.board)?;
        check_against_turn(&turn, &board, san).map(|_| ())
    }

    /// Load the session and head and work out who is to move.
    pub(super) async fn resolve(&self, mut ctx: RunContext) -> Result<Transition, DomainError> {
        let session = require_session(self.store.as_ref(), &ctx.session_id).await?;
        let head = load_head(self.store.as_ref(), &ctx.session_id).await?;

        if session.status != GameStatus::Playing {
            debug!(status = %session.status, "session not playing, skipping");
            return Ok(Transition::Finish(TurnOutcome::Skipped(SkipReason::NotPlaying)));
        }

        let board = Board::from_fen(&head.board)?;
        let terminal = detect_outcome(&board).is_some();
        let turn = resolve_turn(&session, &head.board)?;

        ctx.session = Some(session);
        ctx.head = Some(head);
        ctx.board = Some(board);
        ctx.turn = Some(turn.clone());

        if terminal {
            // A previous run committed the final move but never finalized.
            info!("head already terminal, finalizing");
            return Ok(Transition::Next(FlowState::Detect, ctx));
        }

        match ctx.human_move.take() {
            Some(san) => {
                let played = match check_against_turn(&turn, ctx.board()?, &san) {
                    Ok(played) => played,
                    Err(e) => {
                        emit(
                            self.events.as_ref(),
                            GameEvent::MoveRejected {
                                session_id: ctx.session_id.clone(),
                                san,
                                kind: e.code().as_str().to_string(),
                                cause: e.cause().to_string(),
                            },
                        )
                        .await;
                        return Ok(Transition::Reject(e));
                    }
                };
                ctx.candidate = Some(MoveCandidate {
                    san: played.san,
                    board: played.board.to_fen(),
                });
                Ok(Transition::Next(FlowState::Dispatch, ctx))
            }
            None if turn.is_human() => {
                debug!(side = %turn.side, "human to move");
                Ok(Transition::Finish(TurnOutcome::AwaitingHuman))
            }
            None => Ok(Transition::Next(FlowState::Dispatch, ctx)),
        }
    }

    /// Take the lock and ask the seat for its move. Human submissions carry
    /// their candidate already and go straight on to Commit.
    pub(super) async fn dispatch(&self, mut ctx: RunContext) -> Result<Transition, DomainError> {
        let run_id = RunId::generate();
        match self
            .acquire_lock(&ctx.session_id, &run_id, ctx.head()?)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_conflict(&ConflictKind::AlreadyLocked) => {
                return Ok(Transition::Finish(TurnOutcome::Skipped(
                    SkipReason::AlreadyLocked,
                )));
            }
            Err(e) => return Err(e),
        }
        ctx.run_id = Some(run_id);

        if ctx.candidate.is_some() {
            return Ok(Transition::Next(FlowState::Commit, ctx));
        }

        let head = ctx.head()?;
        let turn = ctx.turn()?;
        let request = ActorRequest {
            session_id: ctx.session_id.clone(),
            side: turn.side,
            board: head.board.clone(),
            move_count: head.move_count,
            san_list: head.san_list.clone(),
        };
        let reply = self
            .dispatcher
            .dispatch(turn, &request, ctx.board()?)
            .await?;

        match reply {
            ActorReply::Move(ActorMove { candidate, comment }) => {
                debug!(san = %candidate.san, "actor moved");
                ctx.candidate = Some(candidate);
                ctx.comment = comment;
                Ok(Transition::Next(FlowState::Commit, ctx))
            }
            ActorReply::Suspend(request) => {
                ctx.suspend = Some(request);
                Ok(Transition::Next(FlowState::Suspend, ctx))
            }
            ActorReply::AwaitHuman => {
                self.release_lock(&ctx.session_id, ctx.run_id()?).await?;
                Ok(Transition::Finish(TurnOutcome::AwaitingHuman))
            }
        }
    }
}
