use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::events::EventSink;
use crate::queue::SessionQueue;
use crate::repos::GameStore;
use crate::services::{SessionsService, TurnFlowService};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GameStore>,
    pub flow: Arc<TurnFlowService>,
    pub sessions: Arc<SessionsService>,
    pub queue: Arc<SessionQueue>,
    pub events: Arc<dyn EventSink>,
    /// Present when the store is database-backed; used by health checks.
    pub db: Option<DatabaseConnection>,
    /// Label of the storage backend, for health output.
    pub store_kind: &'static str,
}

impl AppState {
    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }
}
