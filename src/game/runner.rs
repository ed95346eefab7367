//! Game loop driver
//!
//! Reads the clock once per tick, runs `Game::tick`, publishes a snapshot on
//! a watch channel, then sleeps for the tick interval. A shared `RunFlag`
//! stops the loop after the current tick; producers watch the same flag.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::info;

use crate::core::config::TimingConfig;
use crate::core::types::{Side, TimeMs};
use crate::game::game::{Game, GamePhase, TickReport};
use crate::game::snapshot::BoardSnapshot;

/// Shared stop switch; clones observe the same flag
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    /// A flag in the running state
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of game time
pub trait Clock: Send {
    fn now_ms(&self) -> TimeMs;
}

/// Wall-clock time since creation, multiplied by a speed-up factor
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
    time_factor: u64,
}

impl MonotonicClock {
    pub fn new(time_factor: u64) -> Self {
        Self {
            start: Instant::now(),
            time_factor: time_factor.max(1),
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.time_factor)
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> TimeMs {
        self.start.elapsed().as_millis() as TimeMs * self.time_factor
    }
}

/// Hand-driven clock. With a non-zero step every read advances it.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    step_ms: TimeMs,
}

impl ManualClock {
    pub fn new(start_ms: TimeMs) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
            step_ms: 0,
        }
    }

    /// Clock that moves `step_ms` forward after every read
    pub fn stepping(start_ms: TimeMs, step_ms: TimeMs) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
            step_ms,
        }
    }

    pub fn set(&self, now_ms: TimeMs) {
        self.now.store(now_ms, Ordering::Release);
    }

    pub fn advance(&self, delta_ms: TimeMs) {
        self.now.fetch_add(delta_ms, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimeMs {
        self.now.fetch_add(self.step_ms, Ordering::AcqRel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Until the game is won or the run flag is cleared
    UntilOver,
    /// At most this many ticks
    Iterations(u64),
}

/// How a run ended
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub end_ms: TimeMs,
    pub phase: GamePhase,
    pub winner: Option<Side>,
    pub pieces_left: usize,
    pub rejected_commands: u64,
}

pub struct GameRunner<C: Clock> {
    game: Game,
    clock: C,
    flag: RunFlag,
    tick_interval: Duration,
    snapshots: watch::Sender<BoardSnapshot>,
}

impl<C: Clock> GameRunner<C> {
    pub fn new(game: Game, clock: C, timing: &TimingConfig) -> Self {
        let (snapshots, _) = watch::channel(game.snapshot());
        Self {
            game,
            clock,
            flag: RunFlag::new(),
            tick_interval: Duration::from_millis(timing.tick_interval_ms),
            snapshots,
        }
    }

    pub fn run_flag(&self) -> RunFlag {
        self.flag.clone()
    }

    /// Receiver of the snapshot published after every tick
    pub fn snapshots(&self) -> watch::Receiver<BoardSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn into_game(self) -> Game {
        self.game
    }

    /// One tick at the current clock reading
    pub fn step(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let report = self.game.tick(now);
        self.publish();
        report
    }

    /// Drive the game on the tokio runtime
    pub async fn run(&mut self, mode: RunMode) -> RunSummary {
        self.begin();
        let mut done = 0;
        while self.should_continue(mode, done) {
            self.step();
            done += 1;
            if self.tick_interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.tick_interval).await;
            }
        }
        self.end()
    }

    /// Drive the game on the current thread
    pub fn run_blocking(&mut self, mode: RunMode) -> RunSummary {
        self.begin();
        let mut done = 0;
        while self.should_continue(mode, done) {
            self.step();
            done += 1;
            if !self.tick_interval.is_zero() {
                std::thread::sleep(self.tick_interval);
            }
        }
        self.end()
    }

    fn should_continue(&self, mode: RunMode, done: u64) -> bool {
        if !self.flag.is_running() || self.game.is_over() {
            return false;
        }
        match mode {
            RunMode::UntilOver => true,
            RunMode::Iterations(limit) => done < limit,
        }
    }

    fn begin(&mut self) {
        if self.game.phase() == GamePhase::Setup {
            let now = self.clock.now_ms();
            self.game.start(now);
        }
        self.publish();
    }

    fn end(&mut self) -> RunSummary {
        let now = self.clock.now_ms();
        self.game.finish(now);
        self.flag.stop();
        self.publish();

        let summary = RunSummary {
            ticks: self.game.tick_count(),
            end_ms: self.game.now_ms(),
            phase: self.game.phase(),
            winner: self.game.winner(),
            pieces_left: self.game.pieces().len(),
            rejected_commands: self.game.rejected_count(),
        };
        info!(ticks = summary.ticks, winner = ?summary.winner, "Run finished");
        summary
    }

    fn publish(&self) {
        // No receivers is fine
        self.snapshots.send_replace(self.game.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, STANDARD_LAYOUT};
    use crate::piece::{PieceFactory, PieceSet};

    fn game() -> Game {
        let factory = PieceFactory::new(Board::default(), &PieceSet::standard()).unwrap();
        Game::from_layout(factory, STANDARD_LAYOUT).unwrap()
    }

    fn no_sleep() -> TimingConfig {
        TimingConfig {
            tick_interval_ms: 0,
            ..TimingConfig::default()
        }
    }

    #[test]
    fn test_manual_clock_steps() {
        let clock = ManualClock::stepping(100, 10);
        assert_eq!(clock.now_ms(), 100);
        assert_eq!(clock.now_ms(), 110);
        clock.set(5);
        assert_eq!(clock.now_ms(), 5);
    }

    #[test]
    fn test_run_flag_shared() {
        let flag = RunFlag::new();
        let other = flag.clone();
        assert!(other.is_running());
        flag.stop();
        assert!(!other.is_running());
    }

    #[test]
    fn test_iterations_mode() {
        let mut runner = GameRunner::new(game(), ManualClock::stepping(0, 5), &no_sleep());
        let summary = runner.run_blocking(RunMode::Iterations(20));
        assert_eq!(summary.ticks, 20);
        assert_eq!(summary.phase, GamePhase::Running);
        assert_eq!(summary.winner, None);
        assert_eq!(summary.pieces_left, 32);
        assert!(!runner.run_flag().is_running());
        assert!(!runner.game().is_over());
    }

    #[test]
    fn test_stopped_flag_halts_before_first_tick() {
        let mut runner = GameRunner::new(game(), ManualClock::new(0), &no_sleep());
        runner.run_flag().stop();
        let summary = runner.run_blocking(RunMode::UntilOver);
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.phase, GamePhase::Running);
    }

    #[tokio::test]
    async fn test_snapshot_published() {
        let mut runner = GameRunner::new(game(), ManualClock::stepping(0, 7), &no_sleep());
        let rx = runner.snapshots();
        runner.run(RunMode::Iterations(3)).await;
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.pieces.len(), 32);
        assert!(snapshot.timestamp > 0);
    }
}
