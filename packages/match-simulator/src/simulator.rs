//! Runs whole games through the real turn engine, in memory.
//!
//! Each game gets its own `MemoryStore` and `ManualQueue`; the simulator
//! plays the role of the queue worker and drains self-scheduled triggers
//! until the session stops asking for more.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use gambit_backend::actors::{
    ActorDispatcher, ActorError, ChannelActuatorLink, ModelClient, ModelPrompt, ModelProposal,
};
use gambit_backend::adapters::MemoryStore;
use gambit_backend::config::engine::EngineConfig;
use gambit_backend::domain::{ActorKind, Board, GameStatus, GameWinner, LastError, SessionId};
use gambit_backend::errors::DomainError;
use gambit_backend::events::{BroadcastSink, GameEvent};
use gambit_backend::queue::ManualQueue;
use gambit_backend::services::{SessionsService, TurnFlowService};
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

/// Room for every event a game can publish: a commit, a comment and a
/// suspension per ply, plus the ending. Capped, since the ring is allocated
/// up front.
fn event_capacity(max_plies: u32) -> usize {
    (max_plies as usize)
        .saturating_mul(3)
        .saturating_add(16)
        .min(1 << 16)
}

/// Count comment events buffered for one game. A lagged receiver skips the
/// overwritten events and keeps reading.
fn count_comments(observer: &mut broadcast::Receiver<GameEvent>, game_num: u32) -> usize {
    let mut comments = 0;
    loop {
        match observer.try_recv() {
            Ok(GameEvent::Comment { .. }) => comments += 1,
            Ok(_) => {}
            Err(TryRecvError::Lagged(missed)) => {
                warn!(game_num, missed, "event observer lagged, comment count is a lower bound");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    comments
}

/// Outcome of one simulated game.
#[derive(Debug, Clone, Serialize)]
pub struct GameResult {
    pub game_num: u32,
    pub session_id: String,
    pub seed: u64,
    pub white: String,
    pub black: String,
    pub status: GameStatus,
    pub winner: Option<GameWinner>,
    pub plies: u32,
    pub final_fen: String,
    pub san_list: String,
    pub comments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<LastError>,
    /// The ply guard stopped the game before it ended.
    pub truncated: bool,
    pub duration_ms: f64,
}

/// Proposes a seeded random legal move, with a canned justification.
/// Stands in for a model endpoint so model seats exercise the full path.
pub struct StubModelClient {
    seed: u64,
}

impl StubModelClient {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

#[async_trait]
impl ModelClient for StubModelClient {
    async fn propose(&self, prompt: &ModelPrompt) -> Result<ModelProposal, ActorError> {
        let board = Board::from_fen(&prompt.fen).map_err(|e| ActorError::new(e.to_string()))?;
        let legal = board.legal_sans();
        let mut rng = ChaCha8Rng::seed_from_u64(
            self.seed ^ (prompt.san_history.len() as u64) ^ u64::from(prompt.attempt),
        );
        let san = legal
            .choose(&mut rng)
            .cloned()
            .ok_or_else(|| ActorError::new("stub model sees no legal moves"))?;
        Ok(ModelProposal {
            san,
            justification: Some(format!("stub pick among {} moves", legal.len())),
        })
    }
}

pub struct Simulator {
    max_plies: u32,
    engine_config: EngineConfig,
}

impl Simulator {
    pub fn new(max_plies: u32, engine_config: EngineConfig) -> Self {
        Self {
            max_plies,
            engine_config,
        }
    }

    pub async fn play(
        &self,
        game_num: u32,
        session_id: SessionId,
        seed: u64,
        white: ActorKind,
        black: ActorKind,
    ) -> Result<GameResult, DomainError> {
        let start = Instant::now();
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(ManualQueue::new());
        let events = Arc::new(BroadcastSink::new(event_capacity(self.max_plies)));
        let mut observer = events.subscribe();
        let (actuators, _device) = ChannelActuatorLink::channel();

        let model: Arc<dyn ModelClient> = Arc::new(StubModelClient::new(seed));
        let flow = TurnFlowService::new(
            store.clone(),
            ActorDispatcher::new(Some(model), &self.engine_config),
            events.clone(),
            queue.clone(),
            Arc::new(actuators),
        );
        let sessions = SessionsService::new(store.clone(), queue.clone());

        let white_label = white.label().to_string();
        let black_label = black.label().to_string();
        sessions
            .create_session(session_id.clone(), white, black)
            .await?;

        let report = queue.drain_with(&flow, self.max_plies as usize).await;
        for (trigger, err) in &report.failures {
            warn!(game_num, trigger = trigger.kind(), error = %err, "trigger failed");
        }
        let truncated = !queue.is_empty();
        if truncated {
            debug!(game_num, plies = self.max_plies, "ply guard reached");
        }

        let comments = count_comments(&mut observer, game_num);

        let view = sessions.get_session_view(&session_id).await?;
        Ok(GameResult {
            game_num,
            session_id: session_id.to_string(),
            seed,
            white: white_label,
            black: black_label,
            status: view.session.status,
            winner: view.head.game_winner,
            plies: view.head.move_count,
            final_fen: view.head.board,
            san_list: view.head.san_list.trim_end().to_string(),
            comments,
            error: view.session.last_error,
            truncated,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}
