//! Link to physical actuators. The run publishes an actuation request and
//! suspends; the device answers later through the callback ingress.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::trait_def::ActorError;
use crate::domain::SessionId;
use crate::events::broker::RedisPublisher;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuationRequest {
    pub session_id: SessionId,
    pub device: String,
    pub callback_token: String,
    pub board: String,
    pub suggested_move: Option<String>,
}

#[async_trait]
pub trait ActuatorLink: Send + Sync {
    async fn request(&self, request: &ActuationRequest) -> Result<(), ActorError>;
}

/// Publishes requests on `<channel>:<device>`.
pub struct RedisActuatorLink {
    publisher: Arc<RedisPublisher>,
    channel: String,
}

impl RedisActuatorLink {
    pub fn new(publisher: Arc<RedisPublisher>, channel: impl Into<String>) -> Self {
        Self {
            publisher,
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl ActuatorLink for RedisActuatorLink {
    async fn request(&self, request: &ActuationRequest) -> Result<(), ActorError> {
        let payload = serde_json::to_string(request)
            .map_err(|e| ActorError::new(format!("actuation request not encodable: {e}")))?;
        self.publisher
            .publish(format!("{}:{}", self.channel, request.device), payload)
            .await
            .map_err(|e| ActorError::new(format!("actuator {} unreachable: {e}", request.device)))
    }
}

/// In-process link; the receiving half plays the device.
pub struct ChannelActuatorLink {
    tx: mpsc::UnboundedSender<ActuationRequest>,
}

impl ChannelActuatorLink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ActuationRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ActuatorLink for ChannelActuatorLink {
    async fn request(&self, request: &ActuationRequest) -> Result<(), ActorError> {
        self.tx
            .send(request.clone())
            .map_err(|_| ActorError::new(format!("actuator {} disconnected", request.device)))
    }
}
