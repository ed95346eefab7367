//! Random command producer
//!
//! Picks one of its own idle pieces from the latest snapshot and sends it
//! to a random offset from that piece's move table, or makes it jump on the
//! spot. Seeded, so a given snapshot sequence always yields the same commands.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::command::{Command, CommandSender};
use crate::core::types::{Cell, PieceType, Player};
use crate::game::runner::RunFlag;
use crate::game::snapshot::BoardSnapshot;
use crate::piece::PieceFactory;

/// Chance of an on-the-spot jump instead of a move
const JUMP_CHANCE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct RandomBot {
    player: Player,
    factory: PieceFactory,
    rng: ChaCha8Rng,
    interval: Duration,
}

impl RandomBot {
    pub fn new(player: Player, factory: PieceFactory, seed: u64, interval: Duration) -> Self {
        Self {
            player,
            factory,
            rng: ChaCha8Rng::seed_from_u64(seed),
            interval,
        }
    }

    pub fn player(&self) -> Player {
        self.player
    }

    /// Next command for this snapshot, if any own piece is idle
    pub fn pick(&mut self, snapshot: &BoardSnapshot) -> Option<Command> {
        let side = self.player.side();
        let idle: Vec<_> = snapshot
            .side_pieces(side)
            .filter(|p| p.is_idle())
            .collect();
        let piece = *idle.choose(&mut self.rng)?;

        if self.rng.gen_bool(JUMP_CHANCE) {
            return Some(Command::jump(
                snapshot.timestamp,
                piece.piece_id.clone(),
                piece.cell,
                piece.cell,
                Some(self.player),
            ));
        }

        let graph = self.factory.graph(PieceType::new(piece.kind, side))?;
        let board = self.factory.board();
        let targets: Vec<Cell> = graph
            .get(graph.idle())
            .moves
            .as_ref()?
            .rules()
            .iter()
            .map(|rule| Cell::new(piece.cell.row + rule.d_row, piece.cell.col + rule.d_col))
            .filter(|cell| board.contains(*cell))
            .collect();
        let target = *targets.choose(&mut self.rng)?;

        Some(Command::move_to(
            snapshot.timestamp,
            piece.piece_id.clone(),
            piece.cell,
            target,
            Some(self.player),
        ))
    }

    /// Run as a tokio task until the flag stops or the game loop goes away.
    /// Resolves to the number of commands sent.
    pub fn spawn(
        mut self,
        sender: CommandSender,
        mut snapshots: watch::Receiver<BoardSnapshot>,
        flag: RunFlag,
    ) -> JoinHandle<u64> {
        tokio::spawn(async move {
            let mut sent = 0;
            while flag.is_running() {
                tokio::time::sleep(self.interval).await;
                let snapshot = snapshots.borrow_and_update().clone();
                if let Some(command) = self.pick(&snapshot) {
                    debug!(player = self.player.number(), %command, "Bot command");
                    if !sender.send(command) {
                        break;
                    }
                    sent += 1;
                }
            }
            sent
        })
    }
}
