//! Model seat: asks a generative model for a move, validates it against the
//! board, retries with the rejected moves listed, then falls back to the engine.
//! A model that never answers fails the turn instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::engine::EngineActor;
use super::trait_def::{ActorComment, ActorError, ActorMove, ActorRequest};
use crate::domain::Board;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelPrompt {
    pub model: String,
    pub fen: String,
    pub san_history: String,
    pub attempt: u32,
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelProposal {
    #[serde(rename = "move")]
    pub san: String,
    #[serde(default)]
    pub justification: Option<String>,
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn propose(&self, prompt: &ModelPrompt) -> Result<ModelProposal, ActorError>;
}

/// Posts the prompt as JSON and reads `{"move": ..., "justification": ...}`.
pub struct HttpModelClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpModelClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ActorError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ActorError::new(format!("model client setup failed: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn propose(&self, prompt: &ModelPrompt) -> Result<ModelProposal, ActorError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(prompt)
            .send()
            .await
            .map_err(|e| ActorError::new(format!("model request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ActorError::new(format!("model endpoint error: {e}")))?;
        response
            .json::<ModelProposal>()
            .await
            .map_err(|e| ActorError::new(format!("model response unreadable: {e}")))
    }
}

pub struct ModelActor {
    client: Option<Arc<dyn ModelClient>>,
    model_ref: String,
    max_attempts: u32,
    fallback: EngineActor,
}

impl ModelActor {
    pub const NAME: &'static str = "model";

    pub fn new(
        client: Option<Arc<dyn ModelClient>>,
        model_ref: impl Into<String>,
        max_attempts: u32,
        fallback_level: u8,
    ) -> Self {
        Self {
            client,
            model_ref: model_ref.into(),
            max_attempts: max_attempts.max(1),
            fallback: EngineActor::new(fallback_level),
        }
    }

    pub async fn choose(
        &self,
        request: &ActorRequest,
        board: &Board,
    ) -> Result<ActorMove, ActorError> {
        if let Some(client) = &self.client {
            let mut rejected = Vec::new();
            let mut last_failure = None;
            for attempt in 1..=self.max_attempts {
                let prompt = ModelPrompt {
                    model: self.model_ref.clone(),
                    fen: request.board.clone(),
                    san_history: request.san_list.clone(),
                    attempt,
                    rejected: rejected.clone(),
                };
                let proposal = match client.propose(&prompt).await {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(
                            session_id = %request.session_id,
                            model = %self.model_ref,
                            attempt,
                            error = %e,
                            "model call failed"
                        );
                        last_failure = Some(e);
                        continue;
                    }
                };
                match board.play_san(&proposal.san) {
                    Ok(played) => {
                        debug!(
                            session_id = %request.session_id,
                            model = %self.model_ref,
                            attempt,
                            san = %played.san,
                            "model move accepted"
                        );
                        let mv = ActorMove::from_played(played);
                        return Ok(match proposal.justification {
                            Some(text) if !text.trim().is_empty() => {
                                mv.with_comment(ActorComment {
                                    author: format!(
                                        "{}#{}",
                                        self.model_ref,
                                        request.side.as_char()
                                    ),
                                    text,
                                })
                            }
                            _ => mv,
                        });
                    }
                    Err(_) => {
                        warn!(
                            session_id = %request.session_id,
                            model = %self.model_ref,
                            attempt,
                            proposed = %proposal.san,
                            "model proposed an illegal move"
                        );
                        rejected.push(proposal.san);
                    }
                }
            }
            // Never heard back at all: the model is down, not merely wrong.
            if rejected.is_empty() {
                if let Some(err) = last_failure {
                    return Err(err);
                }
            }
        }

        warn!(
            session_id = %request.session_id,
            model = %self.model_ref,
            fallback_depth = self.fallback.depth(),
            "model gave no usable move, falling back to engine"
        );
        self.fallback.choose(board)
    }
}
