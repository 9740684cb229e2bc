use std::sync::Arc;

use tracing::{info, warn};

use crate::actors::{
    ActorDispatcher, ActuatorLink, ChannelActuatorLink, HttpModelClient, ModelClient,
    RedisActuatorLink,
};
use crate::adapters::{MemoryStore, SeaStore};
use crate::config::db::DbKind;
use crate::config::engine::EngineConfig;
use crate::error::AppError;
use crate::events::{BroadcastSink, EventSink, RedisEventSink, RedisPublisher};
use crate::infra::db::bootstrap_db;
use crate::queue::{SessionQueue, TriggerHandler};
use crate::repos::GameStore;
use crate::services::{SessionsService, TurnFlowService};
use crate::state::app_state::AppState;

/// Builder for AppState (used in both tests and main).
///
/// Without a database the store is in memory; without Redis events go to an
/// in-process broadcast and actuation requests are only logged.
pub struct StateBuilder {
    config: EngineConfig,
    db_kind: Option<DbKind>,
    store: Option<Arc<dyn GameStore>>,
    events: Option<Arc<dyn EventSink>>,
    actuators: Option<Arc<dyn ActuatorLink>>,
    model_client: Option<Arc<dyn ModelClient>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            db_kind: None,
            store: None,
            events: None,
            actuators: None,
            model_client: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_db(mut self, kind: DbKind) -> Self {
        self.db_kind = Some(kind);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn GameStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_actuators(mut self, actuators: Arc<dyn ActuatorLink>) -> Self {
        self.actuators = Some(actuators);
        self
    }

    pub fn with_model_client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.model_client = Some(client);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let config = self.config;

        let (store, db, store_kind): (Arc<dyn GameStore>, _, &'static str) =
            match (self.store, self.db_kind) {
                (Some(store), _) => (store, None, "custom"),
                (None, Some(kind)) => {
                    // single entrypoint: connect + migrate
                    let conn = bootstrap_db(kind).await?;
                    let label = match kind {
                        DbKind::Postgres => "postgres",
                        DbKind::SqliteFile => "sqlite-file",
                        DbKind::SqliteMemory => "sqlite-memory",
                    };
                    (Arc::new(SeaStore::new(conn.clone())), Some(conn), label)
                }
                (None, None) => (Arc::new(MemoryStore::new()), None, "memory"),
            };

        let publisher = match (&config.redis_url, &self.events, &self.actuators) {
            (Some(url), None, _) | (Some(url), _, None) => Some(RedisPublisher::connect(url).await?),
            _ => None,
        };

        let events: Arc<dyn EventSink> = match (self.events, &publisher) {
            (Some(events), _) => events,
            (None, Some(publisher)) => Arc::new(RedisEventSink::new(publisher.clone())),
            (None, None) => Arc::new(BroadcastSink::new(1024)),
        };

        let actuators: Arc<dyn ActuatorLink> = match (self.actuators, &publisher) {
            (Some(actuators), _) => actuators,
            (None, Some(publisher)) => Arc::new(RedisActuatorLink::new(
                publisher.clone(),
                config.actuator_channel.clone(),
            )),
            (None, None) => logging_actuator_link(),
        };

        let model_client = match (self.model_client, &config.model_endpoint) {
            (Some(client), _) => Some(client),
            (None, Some(endpoint)) => {
                let client = HttpModelClient::new(endpoint.clone(), config.model_timeout)
                    .map_err(|e| AppError::config(e.cause))?;
                Some(Arc::new(client) as Arc<dyn ModelClient>)
            }
            (None, None) => None,
        };

        let queue = SessionQueue::new(config.queue_idle_timeout, config.dead_letter_capacity);
        let flow = Arc::new(TurnFlowService::new(
            store.clone(),
            ActorDispatcher::new(model_client, &config),
            events.clone(),
            queue.clone(),
            actuators,
        ));
        let handler: Arc<dyn TriggerHandler> = flow.clone();
        queue.bind(&handler)?;
        let sessions = Arc::new(SessionsService::new(store.clone(), queue.clone()));

        info!(store = store_kind, "application state ready");
        Ok(AppState {
            store,
            flow,
            sessions,
            queue,
            events,
            db,
            store_kind,
        })
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

/// Without a device transport, requests are logged so an operator can act
/// on them and answer through the callback endpoint.
fn logging_actuator_link() -> Arc<dyn ActuatorLink> {
    let (link, mut requests) = ChannelActuatorLink::channel();
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            warn!(
                session_id = %request.session_id,
                device = %request.device,
                callback_token = %request.callback_token,
                suggested_move = request.suggested_move.as_deref(),
                "no actuator transport configured, request logged only"
            );
        }
    });
    Arc::new(link)
}
