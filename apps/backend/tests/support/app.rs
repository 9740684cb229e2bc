//! Full application state with the real session queue.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gambit_backend::actors::{ActuationRequest, ActuatorLink, ChannelActuatorLink};
use gambit_backend::config::engine::EngineConfig;
use gambit_backend::domain::{Session, SessionId};
use gambit_backend::events::BroadcastSink;
use gambit_backend::infra::state::build_state;
use gambit_backend::repos::require_session;
use gambit_backend::state::AppState;
use tokio::sync::mpsc;

pub struct TestApp {
    pub state: AppState,
    pub events: Arc<BroadcastSink>,
    pub devices: mpsc::UnboundedReceiver<ActuationRequest>,
}

/// Memory-backed state; events and device requests stay in process.
pub async fn test_app() -> TestApp {
    let events = Arc::new(BroadcastSink::new(1024));
    let (link, devices) = ChannelActuatorLink::channel();
    let config = EngineConfig {
        fallback_engine_level: 0,
        queue_idle_timeout: Duration::from_millis(200),
        ..EngineConfig::default()
    };
    let state = build_state()
        .with_config(config)
        .with_events(events.clone())
        .with_actuators(Arc::new(link) as Arc<dyn ActuatorLink>)
        .build()
        .await
        .expect("build test state");
    TestApp {
        state,
        events,
        devices,
    }
}

/// Poll until `check` passes or `within` elapses.
pub async fn eventually<F, Fut>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn session_of(state: &AppState, id: &SessionId) -> Session {
    require_session(state.store.as_ref(), id)
        .await
        .expect("session exists")
}
