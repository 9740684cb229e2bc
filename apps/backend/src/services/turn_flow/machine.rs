//! The run state machine and the context value threaded through it.

use std::fmt;

use tracing::{debug, Instrument};

use super::{TurnFlowService, TurnOutcome};
use crate::actors::{ActorComment, SuspendRequest};
use crate::domain::{
    Board, LatestMoveHead, MoveCandidate, RunId, Session, SessionId, TurnActor,
};
use crate::errors::domain::{DomainError, InfraErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Resolve,
    Dispatch,
    Suspend,
    Commit,
    Detect,
    Error,
}

impl FlowState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FlowState::Resolve => "resolve",
            FlowState::Dispatch => "dispatch",
            FlowState::Suspend => "suspend",
            FlowState::Commit => "commit",
            FlowState::Detect => "detect",
            FlowState::Error => "error",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A move that made it into the log during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedMove {
    pub move_count: u32,
    pub san: String,
    pub board: String,
}

/// Everything a run has learned so far. Moved from step to step; each step
/// fills in what the next one needs.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub session_id: SessionId,
    pub run_id: Option<RunId>,
    pub human_move: Option<String>,
    pub session: Option<Session>,
    /// The head as it stood when the turn was resolved (or the run resumed).
    pub head: Option<LatestMoveHead>,
    pub board: Option<Board>,
    pub turn: Option<TurnActor>,
    pub candidate: Option<MoveCandidate>,
    pub comment: Option<ActorComment>,
    pub suspend: Option<SuspendRequest>,
    pub committed: Option<CommittedMove>,
}

impl RunContext {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            run_id: None,
            human_move: None,
            session: None,
            head: None,
            board: None,
            turn: None,
            candidate: None,
            comment: None,
            suspend: None,
            committed: None,
        }
    }

    pub fn with_human_move(mut self, san: String) -> Self {
        self.human_move = Some(san);
        self
    }

    pub(super) fn run_id(&self) -> Result<&RunId, DomainError> {
        self.run_id.as_ref().ok_or_else(|| missing("run id"))
    }

    pub(super) fn head(&self) -> Result<&LatestMoveHead, DomainError> {
        self.head.as_ref().ok_or_else(|| missing("head"))
    }

    pub(super) fn board(&self) -> Result<&Board, DomainError> {
        self.board.as_ref().ok_or_else(|| missing("board"))
    }

    pub(super) fn turn(&self) -> Result<&TurnActor, DomainError> {
        self.turn.as_ref().ok_or_else(|| missing("turn actor"))
    }
}

fn missing(what: &str) -> DomainError {
    DomainError::infra(
        InfraErrorKind::Other("TurnFlow".into()),
        format!("run context has no {what}"),
    )
}

/// Result of one step.
pub(super) enum Transition {
    Next(FlowState, RunContext),
    Finish(TurnOutcome),
    /// Caller error detected before the run owned anything; returned as is.
    Reject(DomainError),
}

impl TurnFlowService {
    /// Drive a run from `state` until it finishes. Any step failure enters
    /// the `Error` state, which hands the failure to the catch-all.
    pub(super) async fn run(
        &self,
        state: FlowState,
        ctx: RunContext,
    ) -> Result<TurnOutcome, DomainError> {
        let span = tracing::info_span!("turn_run", session_id = %ctx.session_id);
        self.drive(state, ctx).instrument(span).await
    }

    async fn drive(
        &self,
        mut state: FlowState,
        mut ctx: RunContext,
    ) -> Result<TurnOutcome, DomainError> {
        loop {
            debug!(
                state = state.as_str(),
                run_id = ctx.run_id.as_ref().map(RunId::as_str),
                "turn step"
            );
            let session_id = ctx.session_id.clone();
            let run_id = ctx.run_id.clone();
            let step = match state {
                FlowState::Resolve => self.resolve(ctx).await,
                FlowState::Dispatch => self.dispatch(ctx).await,
                FlowState::Suspend => self.suspend(ctx).await,
                FlowState::Commit => self.commit(ctx).await,
                FlowState::Detect => self.detect(ctx).await,
                FlowState::Error => Err(missing("failure to report")),
            };
            match step {
                Ok(Transition::Next(next, next_ctx)) => {
                    state = next;
                    ctx = next_ctx;
                }
                Ok(Transition::Finish(outcome)) => return Ok(outcome),
                Ok(Transition::Reject(err)) => return Err(err),
                Err(err) => {
                    let failed_in = state;
                    state = FlowState::Error;
                    debug!(state = state.as_str(), failed_in = failed_in.as_str(), "turn step");
                    return Err(self
                        .catch_all(&session_id, run_id.as_ref(), failed_in, err)
                        .await);
                }
            }
        }
    }
}
