//! Kung-Fu Chess - headless runner
//!
//! Builds a game from configuration, lets two seeded random bots play it on
//! the tokio runtime and prints the result.

use clap::Parser;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use kungfu_chess::board::{Board, STANDARD_LAYOUT};
use kungfu_chess::core::config::GameConfig;
use kungfu_chess::core::error::Result;
use kungfu_chess::core::types::{Player, Side, TimeMs};
use kungfu_chess::game::{
    Game, GameRunner, MonotonicClock, MoveLog, RunMode, ScoreBoard, DEFAULT_MOVE_LOG_LEN,
};
use kungfu_chess::input::RandomBot;
use kungfu_chess::piece::{PieceFactory, PieceSet};

/// Headless Kung-Fu Chess - bot vs bot games
#[derive(Parser, Debug)]
#[command(name = "kungfu-chess")]
#[command(about = "Run a real-time chess game between two random bots")]
struct Args {
    /// Game configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Piece definitions (TOML); built-in chess set if omitted
    #[arg(long)]
    pieces: Option<PathBuf>,

    /// Starting layout, one comma-separated row per line
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Stop after this many ticks instead of running until a king falls
    #[arg(long)]
    iterations: Option<u64>,

    /// Random seed for the bots
    #[arg(long)]
    seed: Option<u64>,

    /// Milliseconds between bot commands
    #[arg(long, default_value_t = 50)]
    bot_interval_ms: u64,

    /// Start no bots; the game only advances the clock
    #[arg(long)]
    no_bots: bool,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct GameResult {
    winner: Option<Side>,
    ticks: u64,
    game_time_ms: TimeMs,
    score_white: u32,
    score_black: u32,
    moves_white: usize,
    moves_black: usize,
    pieces_left: usize,
    commands_sent: u64,
    rejected_commands: u64,
    seed: u64,
}

fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kungfu_chess=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let board = Board::from_config(&config.board);

    let piece_set = match &args.pieces {
        Some(path) => PieceSet::load(path)?,
        None => PieceSet::standard_with_range(board.rows.max(board.cols) - 1),
    };
    let layout = match &args.layout {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            if board.rows != 8 || board.cols != 8 {
                tracing::warn!(
                    rows = board.rows,
                    cols = board.cols,
                    "No layout given for a non-standard board, using the 8x8 opening"
                );
            }
            STANDARD_LAYOUT.to_string()
        }
    };

    let factory = PieceFactory::new(board, &piece_set)?;
    let mut game = Game::from_layout(factory.clone(), &layout)?;

    let scores = Arc::new(Mutex::new(ScoreBoard::new()));
    let moves = Arc::new(Mutex::new(MoveLog::new(board.rows, DEFAULT_MOVE_LOG_LEN)));
    game.subscribe(Box::new(scores.clone()));
    game.subscribe(Box::new(moves.clone()));

    let commands = game.commands();
    let mut runner = GameRunner::new(
        game,
        MonotonicClock::from_timing(&config.timing),
        &config.timing,
    );
    let flag = runner.run_flag();
    let mode = match args.iterations {
        Some(n) => RunMode::Iterations(n),
        None => RunMode::UntilOver,
    };

    tracing::info!(seed, ?mode, "Kung-Fu Chess starting...");

    let rt = Runtime::new()?;
    let (summary, commands_sent) = rt.block_on(async {
        let interval = Duration::from_millis(args.bot_interval_ms.max(1));
        let bots = if args.no_bots {
            Vec::new()
        } else {
            [Player::One, Player::Two]
                .into_iter()
                .map(|player| {
                    let bot_seed = seed.wrapping_add(player.number() as u64);
                    RandomBot::new(player, factory.clone(), bot_seed, interval).spawn(
                        commands.clone(),
                        runner.snapshots(),
                        flag.clone(),
                    )
                })
                .collect()
        };

        let stop = flag.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, stopping after this tick");
                stop.stop();
            }
        });

        let summary = runner.run(mode).await;

        let mut sent = 0;
        for bot in bots {
            match bot.await {
                Ok(n) => sent += n,
                Err(e) => tracing::warn!("Bot task failed: {}", e),
            }
        }
        (summary, sent)
    });

    let scores = *scores.lock();
    let moves = moves.lock();
    let result = GameResult {
        winner: summary.winner,
        ticks: summary.ticks,
        game_time_ms: summary.end_ms,
        score_white: scores.white,
        score_black: scores.black,
        moves_white: moves.count(Player::One),
        moves_black: moves.count(Player::Two),
        pieces_left: summary.pieces_left,
        commands_sent,
        rejected_commands: summary.rejected_commands,
        seed,
    };

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "text" => {
            println!("Kung-Fu Chess Result");
            println!("====================");
            match result.winner {
                Some(Side::White) => println!("Winner: White"),
                Some(Side::Black) => println!("Winner: Black"),
                None => println!("Winner: none"),
            }
            println!("Ticks: {} ({} ms game time)", result.ticks, result.game_time_ms);
            println!("Score: White {} - Black {}", result.score_white, result.score_black);
            println!("Moves: White {} - Black {}", result.moves_white, result.moves_black);
            println!("Pieces left: {}", result.pieces_left);
            println!(
                "Commands: {} sent, {} rejected",
                result.commands_sent, result.rejected_commands
            );
            println!("Seed: {}", result.seed);
        }
        _ => {
            eprintln!("Unknown format '{}', defaulting to json", args.format);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
