//! Random seat: uniform choice over legal moves.
//!
//! Seeded seats derive a fresh seed per ply from `(seed, move_count, side)`,
//! so replaying a session (or retrying a run) picks the same moves.

use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::trait_def::{ActorError, ActorMove};
use crate::domain::{derive_move_seed, Board, Side};

pub struct RandomActor {
    seed: Option<u64>,
}

impl RandomActor {
    pub const NAME: &'static str = "random";

    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    pub fn choose(
        &self,
        board: &Board,
        move_count: u32,
        side: Side,
    ) -> Result<ActorMove, ActorError> {
        let legal = board.legal_moves();
        if legal.is_empty() {
            return Err(ActorError::new("no legal moves available"));
        }

        let chosen = match self.seed {
            Some(base) => {
                let mut rng = ChaCha8Rng::seed_from_u64(derive_move_seed(base, move_count, side));
                legal.choose(&mut rng)
            }
            None => legal.choose(&mut rand::rng()),
        }
        .ok_or_else(|| ActorError::new("failed to choose a random move"))?;

        Ok(ActorMove::from_played(board.play(chosen)))
    }
}
