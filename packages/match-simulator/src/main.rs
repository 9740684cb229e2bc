//! Match simulator CLI - plays whole games between built-in seats through
//! the real turn engine, entirely in memory.

mod output;
mod simulator;
mod summary;
mod types;

use std::time::{Duration, Instant};

use clap::Parser;
use gambit_backend::config::engine::EngineConfig;
use gambit_backend::domain::{session_seed, SessionId};
use output::OutputWriter;
use simulator::Simulator;
use summary::BatchSummary;
use tracing::{info, warn};
use types::{OutputFormat, SeatKind};

#[derive(Parser)]
#[command(name = "match-simulator")]
#[command(about = "Plays in-memory chess sessions through the turn engine")]
struct Args {
    /// Number of games to simulate
    #[arg(short, long, default_value = "1")]
    games: u32,

    /// Seat kind for white
    #[arg(long, default_value = "random")]
    white: SeatKind,

    /// Seat kind for black
    #[arg(long, default_value = "engine")]
    black: SeatKind,

    /// Engine level for engine seats (and the model fallback)
    #[arg(long, default_value = "0")]
    engine_level: u8,

    /// Batch seed; each game mixes in its session id
    #[arg(long)]
    seed: Option<u64>,

    /// Stop a game after this many plies
    #[arg(long, default_value = "600")]
    max_plies: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Show output summary and file paths
    #[arg(long)]
    show_output: bool,

    /// Output directory for results
    #[arg(long, default_value = "./simulation-results")]
    output_dir: String,

    /// Output format
    #[arg(long, default_value = "jsonl")]
    output_format: OutputFormat,

    /// Compress result files
    #[arg(long)]
    compress: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        "debug"
    } else if args.show_output {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        games = args.games,
        white = args.white.name(),
        black = args.black.name(),
        "starting match simulator"
    );

    let engine_config = EngineConfig {
        fallback_engine_level: args.engine_level,
        ..EngineConfig::default()
    };
    let simulator = Simulator::new(args.max_plies, engine_config);
    let mut output_writer =
        OutputWriter::new(&args.output_dir, &args.output_format, args.compress)?;

    let start = Instant::now();
    let mut results = Vec::new();
    let mut errors = 0u32;

    for game_num in 1..=args.games {
        let session_id = SessionId::new(format!("sim-{game_num}"))?;
        let seed = match args.seed {
            Some(batch) => batch ^ session_seed(&session_id),
            None => rand::random(),
        };
        let white = args.white.actor(args.engine_level, seed);
        let black = args.black.actor(args.engine_level, seed.rotate_left(17));

        match simulator
            .play(game_num, session_id, seed, white, black)
            .await
        {
            Ok(result) => {
                if let Err(e) = output_writer.write_game(&result) {
                    warn!("Failed to write result for game {}: {}", game_num, e);
                }
                if args.verbose {
                    info!(
                        game_num,
                        status = result.status.as_str(),
                        winner = ?result.winner,
                        plies = result.plies,
                        "game finished"
                    );
                }
                results.push(result);
            }
            Err(e) => {
                errors += 1;
                warn!("Game {} failed: {}", game_num, e);
            }
        }
    }

    let summary = BatchSummary::from_results(&results);
    let (results_path, csv_path) = output_writer.output_paths();
    let (results_path, csv_path) = (results_path.clone(), csv_path.clone());
    let summary_path = output_writer.finish(&summary)?;

    if args.show_output {
        info!("Results written to: {}", results_path.display());
        info!("Summary CSV written to: {}", csv_path.display());
        info!("Batch stats written to: {}", summary_path.display());
        summary.print();
        print_timing(errors, start.elapsed(), results.len());
    }

    Ok(())
}

fn print_timing(errors: u32, elapsed: Duration, games: usize) {
    if errors > 0 {
        println!("Games that could not be set up: {}", errors);
    }
    println!("Total time: {:?}", elapsed);
    if games > 0 {
        println!("Average time per game: {:?}", elapsed / games as u32);
    }
}
