pub mod sessions;
pub mod turn_flow;

pub use sessions::{SessionView, SessionsService};
pub use turn_flow::{SkipReason, TurnFlowService, TurnOutcome};
