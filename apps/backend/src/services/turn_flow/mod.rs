//! Turn orchestration: resolve the seat to move, take the session lock,
//! invoke the actor, then either park on an external device or commit the
//! move, detect the end of the game and schedule the next turn.
//!
//! Every run is a short-lived pass through the state machine in
//! [`machine`]. Nothing is held in memory between runs; suspension is the
//! callback token on the head.

mod catch_all;
mod commit;
mod detect;
mod dispatch;
mod lock;
mod machine;
mod suspend;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

pub use machine::{FlowState, RunContext};

use crate::actors::{ActorDispatcher, ActuatorLink};
use crate::domain::{ActorResult, GameWinner, SessionId, TurnTrigger};
use crate::errors::domain::{DomainError, ValidationKind};
use crate::events::EventSink;
use crate::queue::{TriggerHandler, TriggerSink};
use crate::repos::GameStore;

/// Why a run ended without doing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another run (or a parked device) owns the session.
    AlreadyLocked,
    NotPlaying,
    /// Resume whose token no longer matches the head.
    StaleCallback,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    Committed {
        move_count: u32,
        san: String,
        winner: Option<GameWinner>,
    },
    AwaitingHuman,
    Suspended {
        callback_token: String,
    },
    /// The head was already terminal; only the finalization ran.
    Finalized {
        winner: GameWinner,
    },
    Skipped(SkipReason),
}

pub struct TurnFlowService {
    store: Arc<dyn GameStore>,
    dispatcher: ActorDispatcher,
    events: Arc<dyn EventSink>,
    triggers: Arc<dyn TriggerSink>,
    actuators: Arc<dyn ActuatorLink>,
}

impl TurnFlowService {
    pub fn new(
        store: Arc<dyn GameStore>,
        dispatcher: ActorDispatcher,
        events: Arc<dyn EventSink>,
        triggers: Arc<dyn TriggerSink>,
        actuators: Arc<dyn ActuatorLink>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            events,
            triggers,
            actuators,
        }
    }

    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    /// Take the next turn for a session.
    pub async fn advance(&self, session_id: SessionId) -> Result<TurnOutcome, DomainError> {
        self.run(FlowState::Resolve, RunContext::new(session_id))
            .await
    }

    /// A human's move for the side they play. Rejected with `OutOfTurn` or
    /// `IllegalMove` before any state is touched.
    pub async fn submit_human_move(
        &self,
        session_id: SessionId,
        san: impl Into<String>,
    ) -> Result<TurnOutcome, DomainError> {
        let ctx = RunContext::new(session_id).with_human_move(san.into());
        self.run(FlowState::Resolve, ctx).await
    }

    /// Single entry for queued triggers.
    pub async fn handle(&self, trigger: TurnTrigger) -> Result<TurnOutcome, DomainError> {
        debug!(trigger = trigger.kind(), "handling trigger");
        match trigger {
            TurnTrigger::Advance { session_id } => self.advance(session_id).await,
            TurnTrigger::HumanMove { session_id, san } => {
                self.submit_human_move(session_id, san).await
            }
            TurnTrigger::Resume {
                callback_token,
                result,
            } => self.resume(callback_token.as_str(), result).await,
        }
    }

    /// Resume ingress for parked devices; see `suspend.rs`.
    pub async fn resume(
        &self,
        callback_token: &str,
        result: ActorResult,
    ) -> Result<TurnOutcome, DomainError> {
        self.resume_parked(callback_token, result).await
    }
}

#[async_trait]
impl TriggerHandler for TurnFlowService {
    async fn handle_trigger(&self, trigger: TurnTrigger) -> Result<(), DomainError> {
        let human = matches!(trigger, TurnTrigger::HumanMove { .. });
        match self.handle(trigger).await {
            Ok(outcome) => {
                info!(outcome = ?outcome, "trigger handled");
                Ok(())
            }
            // The submitter was told through `MoveRejected`; nothing failed.
            Err(DomainError::Validation(
                kind @ (ValidationKind::IllegalMove | ValidationKind::OutOfTurn),
                detail,
            )) if human => {
                info!(kind = ?kind, detail = %detail, "human move rejected");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
