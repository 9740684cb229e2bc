//! Shared types for the simulator.

use clap::ValueEnum;
use gambit_backend::domain::ActorKind;

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Jsonl,
    Json,
}

/// Seat kinds the simulator can field. External devices and humans need
/// someone on the other end, so they are not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeatKind {
    Random,
    Engine,
    ModelStub,
}

impl SeatKind {
    pub fn name(&self) -> &'static str {
        match self {
            SeatKind::Random => "random",
            SeatKind::Engine => "engine",
            SeatKind::ModelStub => "model-stub",
        }
    }

    /// The actor assignment for one game. `seed` feeds random seats.
    pub fn actor(&self, engine_level: u8, seed: u64) -> ActorKind {
        match self {
            SeatKind::Random => ActorKind::Random { seed: Some(seed) },
            SeatKind::Engine => ActorKind::Engine {
                level: engine_level,
            },
            SeatKind::ModelStub => ActorKind::Model {
                model_ref: "stub".to_string(),
            },
        }
    }
}
