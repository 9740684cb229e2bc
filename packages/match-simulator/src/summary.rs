//! Aggregate statistics over a batch of games.

use gambit_backend::domain::{GameStatus, GameWinner};
use serde::Serialize;

use crate::simulator::GameResult;

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub games: usize,
    pub completed: usize,
    pub errored: usize,
    pub truncated: usize,
    pub white_wins: usize,
    pub black_wins: usize,
    pub draws: usize,
    pub average_plies: f64,
    pub average_duration_ms: f64,
}

impl BatchSummary {
    pub fn from_results(results: &[GameResult]) -> Self {
        let mut summary = BatchSummary {
            games: results.len(),
            ..Default::default()
        };
        if results.is_empty() {
            return summary;
        }
        let mut plies = 0u64;
        let mut duration = 0.0;
        for r in results {
            plies += u64::from(r.plies);
            duration += r.duration_ms;
            match r.status {
                GameStatus::Completed => summary.completed += 1,
                GameStatus::Error => summary.errored += 1,
                GameStatus::Playing | GameStatus::Paused => {}
            }
            if r.truncated {
                summary.truncated += 1;
            }
            match r.winner {
                Some(GameWinner::White) => summary.white_wins += 1,
                Some(GameWinner::Black) => summary.black_wins += 1,
                Some(GameWinner::Draw) => summary.draws += 1,
                None => {}
            }
        }
        summary.average_plies = plies as f64 / results.len() as f64;
        summary.average_duration_ms = duration / results.len() as f64;
        summary
    }

    pub fn print(&self) {
        println!("\n=== Simulation Summary ===");
        println!(
            "Games: {} (completed {}, errored {}, truncated {})",
            self.games, self.completed, self.errored, self.truncated
        );
        println!(
            "White wins: {}  Black wins: {}  Draws: {}",
            self.white_wins, self.black_wins, self.draws
        );
        println!(
            "Average plies: {:.1}  Average time: {:.1} ms",
            self.average_plies, self.average_duration_ms
        );
    }
}
