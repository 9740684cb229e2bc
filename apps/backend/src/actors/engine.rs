//! Built-in engine seat: fixed-depth negamax with alpha-beta over material.

use shakmaty::{Chess, Position};

use super::trait_def::{ActorError, ActorMove};
use crate::domain::board::material_score;
use crate::domain::Board;

const MAX_DEPTH: u8 = 4;
const MATE_SCORE: i32 = 1_000_000;

pub struct EngineActor {
    level: u8,
}

impl EngineActor {
    pub const NAME: &'static str = "engine";

    pub fn new(level: u8) -> Self {
        Self { level }
    }

    /// Search depth in plies: level + 1, capped.
    pub fn depth(&self) -> u8 {
        self.level.saturating_add(1).min(MAX_DEPTH)
    }

    /// Best move by search. Ties keep the first move in generation order, so
    /// the choice is deterministic for a given position.
    pub fn choose(&self, board: &Board) -> Result<ActorMove, ActorError> {
        let pos = board.position();
        let legal = pos.legal_moves();
        if legal.is_empty() {
            return Err(ActorError::new("no legal moves available"));
        }

        let depth = self.depth();
        let mut best: Option<(i32, usize)> = None;
        let mut alpha = -MATE_SCORE - 1;
        let beta = MATE_SCORE + 1;
        for (idx, m) in legal.iter().enumerate() {
            let mut child = pos.clone();
            child.play_unchecked(m);
            let score = -negamax(&child, depth - 1, 1, -beta, -alpha);
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, idx));
            }
            alpha = alpha.max(score);
        }

        let (_, idx) = best.ok_or_else(|| ActorError::new("search produced no move"))?;
        Ok(ActorMove::from_played(board.play(&legal[idx])))
    }
}

fn evaluate(pos: &Chess) -> i32 {
    let us = pos.turn();
    material_score(pos, us) - material_score(pos, us.other())
}

fn negamax(pos: &Chess, depth: u8, ply: i32, mut alpha: i32, beta: i32) -> i32 {
    let legal = pos.legal_moves();
    if legal.is_empty() {
        return if pos.is_check() { -(MATE_SCORE - ply) } else { 0 };
    }
    if pos.is_insufficient_material() {
        return 0;
    }
    if depth == 0 {
        return evaluate(pos);
    }

    let mut best = -MATE_SCORE - 1;
    for m in &legal {
        let mut child = pos.clone();
        child.play_unchecked(m);
        let score = -negamax(&child, depth - 1, ply + 1, -beta, -alpha);
        best = best.max(score);
        alpha = alpha.max(score);
        if alpha >= beta {
            break;
        }
    }
    best
}
