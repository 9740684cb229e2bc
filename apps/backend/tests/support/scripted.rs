//! Scripted stand-ins for the model endpoint and the actuator link.

use std::collections::VecDeque;

use async_trait::async_trait;
use gambit_backend::actors::{
    ActorError, ActuationRequest, ActuatorLink, ModelClient, ModelPrompt, ModelProposal,
};
use parking_lot::Mutex;

/// Replays canned replies, then keeps failing with `exhausted_cause`.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelProposal, ActorError>>>,
    prompts: Mutex<Vec<ModelPrompt>>,
    exhausted_cause: String,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<ModelProposal, ActorError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            exhausted_cause: "script exhausted".to_string(),
        }
    }

    /// A model endpoint that never answers.
    pub fn unreachable(cause: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            exhausted_cause: cause.to_string(),
        }
    }

    pub fn proposal(san: &str, justification: Option<&str>) -> Result<ModelProposal, ActorError> {
        Ok(ModelProposal {
            san: san.to_string(),
            justification: justification.map(str::to_string),
        })
    }

    pub fn prompts(&self) -> Vec<ModelPrompt> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn propose(&self, prompt: &ModelPrompt) -> Result<ModelProposal, ActorError> {
        self.prompts.lock().push(prompt.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ActorError::new(self.exhausted_cause.clone())))
    }
}

/// Device link that refuses every request.
pub struct FailingLink {
    pub cause: String,
}

#[async_trait]
impl ActuatorLink for FailingLink {
    async fn request(&self, _request: &ActuationRequest) -> Result<(), ActorError> {
        Err(ActorError::new(self.cause.clone()))
    }
}
