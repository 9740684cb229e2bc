//! Polymorphic invocation of the seat whose turn it is.

use std::sync::Arc;

use tracing::debug;

use super::engine::EngineActor;
use super::model::{ModelActor, ModelClient};
use super::random::RandomActor;
use super::trait_def::{ActorError, ActorMove, ActorReply, ActorRequest, SuspendRequest};
use crate::config::engine::EngineConfig;
use crate::domain::{ActorKind, Board, TurnActor};

pub struct ActorDispatcher {
    model_client: Option<Arc<dyn ModelClient>>,
    model_max_attempts: u32,
    fallback_engine_level: u8,
}

impl ActorDispatcher {
    pub fn new(model_client: Option<Arc<dyn ModelClient>>, config: &EngineConfig) -> Self {
        Self {
            model_client,
            model_max_attempts: config.model_max_attempts,
            fallback_engine_level: config.fallback_engine_level,
        }
    }

    /// Dispatcher without a model endpoint; model seats play the fallback engine.
    pub fn offline() -> Self {
        Self::new(None, &EngineConfig::default())
    }

    pub async fn dispatch(
        &self,
        turn: &TurnActor,
        request: &ActorRequest,
        board: &Board,
    ) -> Result<ActorReply, ActorError> {
        debug!(
            session_id = %request.session_id,
            side = %turn.side,
            actor = turn.actor.label(),
            move_count = request.move_count,
            "dispatching turn"
        );
        match &turn.actor {
            ActorKind::Player { .. } => Ok(ActorReply::AwaitHuman),
            ActorKind::Random { seed } => RandomActor::new(*seed)
                .choose(board, request.move_count, turn.side)
                .map(ActorReply::Move),
            ActorKind::Engine { level } => run_engine(*level, board).await.map(ActorReply::Move),
            ActorKind::Model { model_ref } => ModelActor::new(
                self.model_client.clone(),
                model_ref.clone(),
                self.model_max_attempts,
                self.fallback_engine_level,
            )
            .choose(request, board)
            .await
            .map(ActorReply::Move),
            ActorKind::External { device, assist } => {
                let suggested_move = match assist {
                    Some(level) => Some(run_engine(*level, board).await?.candidate.san),
                    None => None,
                };
                Ok(ActorReply::Suspend(SuspendRequest {
                    device: device.clone(),
                    suggested_move,
                }))
            }
        }
    }
}

/// Search off the async workers; deeper levels take a while.
async fn run_engine(level: u8, board: &Board) -> Result<ActorMove, ActorError> {
    let board = board.clone();
    tokio::task::spawn_blocking(move || EngineActor::new(level).choose(&board))
        .await
        .map_err(|e| ActorError::new(format!("engine task failed: {e}")))?
}
