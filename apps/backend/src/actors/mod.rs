//! Seat implementations and the dispatcher that picks between them.
//!
//! - `RandomActor`: uniform legal moves, replayable when seeded
//! - `EngineActor`: fixed-depth material search
//! - `ModelActor`: HTTP model with validation, retries and engine fallback
//! - `ActuatorLink`: publishes requests to slow external devices

pub mod dispatcher;
pub mod engine;
pub mod external;
pub mod model;
pub mod random;
mod trait_def;

pub use dispatcher::ActorDispatcher;
pub use engine::EngineActor;
pub use external::{ActuationRequest, ActuatorLink, ChannelActuatorLink, RedisActuatorLink};
pub use model::{HttpModelClient, ModelActor, ModelClient, ModelPrompt, ModelProposal};
pub use random::RandomActor;
pub use trait_def::{
    ActorComment, ActorError, ActorMove, ActorReply, ActorRequest, SuspendRequest,
};
