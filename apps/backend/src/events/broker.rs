//! Redis pub/sub publishing with bounded retry on transient failures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::warn;

use super::{EventSink, GameEvent};
use crate::error::AppError;
use crate::errors::domain::{DomainError, InfraErrorKind};

const PUBLISHER_MAX_ATTEMPTS: u32 = 3;
const PUBLISHER_INITIAL_RETRY_DELAY_MS: u64 = 50;
const PUBLISHER_MAX_RETRY_DELAY_MS: u64 = 200;

pub struct RedisPublisher {
    publisher: Mutex<ConnectionManager>,
}

impl RedisPublisher {
    pub async fn connect(redis_url: &str) -> Result<Arc<Self>, AppError> {
        let client = Client::open(redis_url)
            .map_err(|err| AppError::config(format!("Invalid REDIS_URL: {err}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|err| {
                AppError::config(format!("Unable to initialize Redis connection manager: {err}"))
            })?;
        Ok(Arc::new(Self {
            publisher: Mutex::new(manager),
        }))
    }

    pub async fn publish(&self, channel: String, payload: String) -> Result<(), DomainError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let publish_res = {
                let mut publisher = self.publisher.lock().await;
                publisher
                    .publish::<_, _, ()>(channel.clone(), payload.clone())
                    .await
            };

            match publish_res {
                Ok(()) => return Ok(()),
                Err(err) => {
                    let message = err.to_string();
                    if attempt >= PUBLISHER_MAX_ATTEMPTS || !is_transient_error(&message) {
                        return Err(DomainError::infra(
                            InfraErrorKind::Other("Redis".into()),
                            format!("publish to {channel} failed: {message}"),
                        ));
                    }

                    let delay_ms = PUBLISHER_INITIAL_RETRY_DELAY_MS
                        .saturating_mul(2_u64.pow(attempt - 1))
                        .min(PUBLISHER_MAX_RETRY_DELAY_MS);
                    warn!(
                        error = %message,
                        attempt,
                        retry_delay_ms = delay_ms,
                        "Redis publish failed, retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

fn is_transient_error(message: &str) -> bool {
    let msg = message.to_lowercase();

    if msg.contains("authentication failed")
        || msg.contains("invalid redis_url")
        || msg.contains("unsupported")
    {
        return false;
    }

    msg.contains("connection refused")
        || msg.contains("connection reset")
        || msg.contains("connection aborted")
        || msg.contains("timed out")
        || msg.contains("timeout")
        || msg.contains("broken pipe")
        || msg.contains("io error")
}

/// Publishes every event as JSON on `session:<id>`.
pub struct RedisEventSink {
    publisher: Arc<RedisPublisher>,
}

impl RedisEventSink {
    pub fn new(publisher: Arc<RedisPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl EventSink for RedisEventSink {
    async fn publish(&self, event: &GameEvent) -> Result<(), DomainError> {
        let encoded = serde_json::to_string(event).map_err(|e| {
            DomainError::infra(
                InfraErrorKind::Other("Serialize".into()),
                format!("event not encodable: {e}"),
            )
        })?;
        self.publisher
            .publish(format!("session:{}", event.session_id()), encoded)
            .await
    }
}
