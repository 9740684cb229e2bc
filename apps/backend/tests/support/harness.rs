//! In-memory turn engine wired for tests.
//!
//! Triggers land on a `ManualQueue`; tests drain it explicitly so every run
//! is observable. Device requests go to a channel the test can read.

use std::sync::Arc;

use backend_test_support::unique_helpers::unique_session_id;
use gambit_backend::actors::{ActorDispatcher, ActuationRequest, ActuatorLink, ChannelActuatorLink, ModelClient};
use gambit_backend::adapters::MemoryStore;
use gambit_backend::config::engine::EngineConfig;
use gambit_backend::domain::{
    ActorKind, LatestMoveHead, MoveRecord, Session, SessionId, TurnTrigger,
};
use gambit_backend::events::{BroadcastSink, GameEvent};
use gambit_backend::queue::{DrainReport, ManualQueue};
use gambit_backend::repos::GameStore;
use gambit_backend::services::{SessionsService, TurnFlowService};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

pub struct Harness {
    pub store: Arc<dyn GameStore>,
    pub queue: Arc<ManualQueue>,
    pub events: Arc<BroadcastSink>,
    pub flow: Arc<TurnFlowService>,
    pub sessions: SessionsService,
    observer: Mutex<broadcast::Receiver<GameEvent>>,
    devices: Mutex<Option<mpsc::UnboundedReceiver<ActuationRequest>>>,
}

#[derive(Default)]
pub struct HarnessBuilder {
    store: Option<Arc<dyn GameStore>>,
    model: Option<Arc<dyn ModelClient>>,
    actuators: Option<Arc<dyn ActuatorLink>>,
    config: Option<EngineConfig>,
}

impl HarnessBuilder {
    pub fn store(mut self, store: Arc<dyn GameStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn model(mut self, model: Arc<dyn ModelClient>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn actuators(mut self, actuators: Arc<dyn ActuatorLink>) -> Self {
        self.actuators = Some(actuators);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Harness {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn GameStore>);
        let queue = Arc::new(ManualQueue::new());
        let events = Arc::new(BroadcastSink::new(4096));
        let observer = events.subscribe();
        let (actuators, devices) = match self.actuators {
            Some(link) => (link, None),
            None => {
                let (link, rx) = ChannelActuatorLink::channel();
                (Arc::new(link) as Arc<dyn ActuatorLink>, Some(rx))
            }
        };
        let config = self.config.unwrap_or_else(|| EngineConfig {
            fallback_engine_level: 0,
            ..EngineConfig::default()
        });
        let flow = Arc::new(TurnFlowService::new(
            store.clone(),
            ActorDispatcher::new(self.model, &config),
            events.clone(),
            queue.clone(),
            actuators,
        ));
        let sessions = SessionsService::new(store.clone(), queue.clone());
        Harness {
            store,
            queue,
            events,
            flow,
            sessions,
            observer: Mutex::new(observer),
            devices: Mutex::new(devices),
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a session and discard the trigger creation scheduled, so the
    /// test decides when the first run happens.
    pub async fn create(&self, white: ActorKind, black: ActorKind) -> SessionId {
        let id = SessionId::new(unique_session_id()).unwrap();
        self.sessions
            .create_session(id.clone(), white, black)
            .await
            .unwrap();
        let scheduled = self.queue.take_all();
        assert_eq!(scheduled, vec![TurnTrigger::advance(id.clone())]);
        id
    }

    pub async fn head(&self, id: &SessionId) -> LatestMoveHead {
        self.store.get_latest_head(id).await.unwrap().unwrap()
    }

    pub async fn session(&self, id: &SessionId) -> Session {
        self.store.get_session(id).await.unwrap().unwrap()
    }

    pub async fn records(&self, id: &SessionId) -> Vec<MoveRecord> {
        self.store.list_move_records(id).await.unwrap()
    }

    /// Run queued triggers (including ones they schedule) up to `max_steps`.
    pub async fn drain(&self, max_steps: usize) -> DrainReport {
        self.queue.drain_with(self.flow.as_ref(), max_steps).await
    }

    /// Events published since the last call.
    pub fn take_events(&self) -> Vec<GameEvent> {
        let mut observer = self.observer.lock();
        let mut out = Vec::new();
        while let Ok(event) = observer.try_recv() {
            out.push(event);
        }
        out
    }

    /// Actuation requests sent to the in-process device link.
    pub fn take_device_requests(&self) -> Vec<ActuationRequest> {
        let mut guard = self.devices.lock();
        let mut out = Vec::new();
        if let Some(rx) = guard.as_mut() {
            while let Ok(request) = rx.try_recv() {
                out.push(request);
            }
        }
        out
    }
}

/// Play a line of human moves, one submission per ply, dropping the
/// follow-up triggers each commit schedules.
pub async fn play_line(
    h: &Harness,
    id: &SessionId,
    sans: &[&str],
) -> Vec<gambit_backend::services::TurnOutcome> {
    let mut outcomes = Vec::with_capacity(sans.len());
    for san in sans {
        let outcome = h
            .flow
            .submit_human_move(id.clone(), *san)
            .await
            .unwrap_or_else(|e| panic!("{san} rejected: {e}"));
        h.queue.take_all();
        outcomes.push(outcome);
    }
    outcomes
}

pub fn player(id: &str) -> ActorKind {
    ActorKind::Player { id: id.to_string() }
}

pub const FOOLS_MATE: [&str; 4] = ["f3", "e5", "g4", "Qh4#"];

/// Shortest known stalemate from the initial position (19 plies).
pub const LOYD_STALEMATE: [&str; 19] = [
    "e3", "a5", "Qh5", "Ra6", "Qxa5", "h5", "h4", "Rah6", "Qxc7", "f6", "Qxd7+", "Kf7", "Qxb7",
    "Qd3", "Qxb8", "Qh7", "Qxc8", "Kg6", "Qe6",
];
