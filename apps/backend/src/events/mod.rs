//! Fire-and-forget notifications about session progress.

pub mod broker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::{GameWinner, OutcomeReason, SessionId, Side};
use crate::errors::domain::DomainError;

pub use broker::{RedisEventSink, RedisPublisher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    MoveCommitted {
        session_id: SessionId,
        move_count: u32,
        san: String,
        board: String,
        side: Side,
    },
    GameCompleted {
        session_id: SessionId,
        winner: GameWinner,
        reason: OutcomeReason,
    },
    SessionErrored {
        session_id: SessionId,
        kind: String,
        cause: String,
    },
    TurnSuspended {
        session_id: SessionId,
        device: String,
        callback_token: String,
        suggested_move: Option<String>,
    },
    Comment {
        session_id: SessionId,
        author: String,
        text: String,
    },
    /// A human submission that reached a run but did not fit the position.
    MoveRejected {
        session_id: SessionId,
        san: String,
        kind: String,
        cause: String,
    },
}

impl GameEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            GameEvent::MoveCommitted { session_id, .. }
            | GameEvent::GameCompleted { session_id, .. }
            | GameEvent::SessionErrored { session_id, .. }
            | GameEvent::TurnSuspended { session_id, .. }
            | GameEvent::Comment { session_id, .. }
            | GameEvent::MoveRejected { session_id, .. } => session_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::MoveCommitted { .. } => "move_committed",
            GameEvent::GameCompleted { .. } => "game_completed",
            GameEvent::SessionErrored { .. } => "session_errored",
            GameEvent::TurnSuspended { .. } => "turn_suspended",
            GameEvent::Comment { .. } => "comment",
            GameEvent::MoveRejected { .. } => "move_rejected",
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: &GameEvent) -> Result<(), DomainError>;
}

/// Publish and swallow failures; observers never decide the outcome of a run.
pub async fn emit(sink: &dyn EventSink, event: GameEvent) {
    if let Err(e) = sink.publish(&event).await {
        warn!(
            session_id = %event.session_id(),
            event = event.kind(),
            error = %e,
            "event publication failed"
        );
    }
}

/// In-process fan-out over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<GameEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventSink for BroadcastSink {
    async fn publish(&self, event: &GameEvent) -> Result<(), DomainError> {
        // No subscribers is not an error.
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn publish(&self, _event: &GameEvent) -> Result<(), DomainError> {
        Ok(())
    }
}
