//! Observers shipped with the crate: score keeping, move history and a
//! channel forwarder for out-of-loop consumers.

use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::info;

use crate::core::types::{Cell, Player, Side};
use crate::game::events::{GameEvent, Observer};

/// Entries kept per player by default
pub const DEFAULT_MOVE_LOG_LEN: usize = 30;

/// Material captured by each side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBoard {
    pub white: u32,
    pub black: u32,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }

    /// Side ahead on material, `None` when level
    pub fn leader(&self) -> Option<Side> {
        match self.white.cmp(&self.black) {
            std::cmp::Ordering::Greater => Some(Side::White),
            std::cmp::Ordering::Less => Some(Side::Black),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl Observer for ScoreBoard {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::GameStart { .. } => *self = Self::default(),
            GameEvent::PieceCaptured {
                captured_type,
                captured_by_side,
                ..
            } => {
                let value = captured_type.value();
                match captured_by_side {
                    Side::White => self.white += value,
                    Side::Black => self.black += value,
                }
            }
            GameEvent::GameEnd { .. } => {
                info!(white = self.white, black = self.black, "Final score");
            }
            _ => {}
        }
    }
}

/// Recent moves per player in `"P e2->e4"` notation
#[derive(Debug, Clone, Serialize)]
pub struct MoveLog {
    rows: i32,
    capacity: usize,
    player_one: VecDeque<String>,
    player_two: VecDeque<String>,
    /// Moves seen since game start, including ones no longer retained
    total: usize,
}

impl MoveLog {
    pub fn new(rows: i32, capacity: usize) -> Self {
        Self {
            rows,
            capacity,
            player_one: VecDeque::with_capacity(capacity),
            player_two: VecDeque::with_capacity(capacity),
            total: 0,
        }
    }

    /// Algebraic square for a cell; rank 1 is the bottom row
    pub fn square(&self, cell: Cell) -> String {
        let file = (b'a' + cell.col.clamp(0, 25) as u8) as char;
        format!("{}{}", file, self.rows - cell.row)
    }

    pub fn moves(&self, player: Player) -> impl Iterator<Item = &str> {
        let list = match player {
            Player::One => &self.player_one,
            Player::Two => &self.player_two,
        };
        list.iter().map(String::as_str)
    }

    pub fn count(&self, player: Player) -> usize {
        match player {
            Player::One => self.player_one.len(),
            Player::Two => self.player_two.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    fn push(&mut self, player: Player, entry: String) {
        let capacity = self.capacity;
        let list = match player {
            Player::One => &mut self.player_one,
            Player::Two => &mut self.player_two,
        };
        list.push_back(entry);
        while list.len() > capacity {
            list.pop_front();
        }
        self.total += 1;
    }
}

impl Default for MoveLog {
    fn default() -> Self {
        Self::new(8, DEFAULT_MOVE_LOG_LEN)
    }
}

impl Observer for MoveLog {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::GameStart { .. } => {
                self.player_one.clear();
                self.player_two.clear();
                self.total = 0;
            }
            GameEvent::Move {
                piece_id,
                from_cell,
                to_cell,
                player,
                ..
            } => {
                // Unowned moves are bounces, not player moves
                let Some(player) = player else { return };
                let code = piece_id.as_str().chars().next().unwrap_or('?');
                let entry = format!(
                    "{} {}->{}",
                    code,
                    self.square(*from_cell),
                    self.square(*to_cell)
                );
                self.push(*player, entry);
            }
            _ => {}
        }
    }
}

/// Pushes a copy of every event into a tokio channel
#[derive(Debug)]
pub struct EventForwarder {
    tx: mpsc::UnboundedSender<GameEvent>,
    dropped: u64,
}

impl EventForwarder {
    pub fn new(tx: mpsc::UnboundedSender<GameEvent>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Forwarder plus the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Events lost because the receiver was gone
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Observer for EventForwarder {
    fn on_event(&mut self, event: &GameEvent) {
        if self.tx.send(event.clone()).is_err() {
            self.dropped += 1;
        }
    }
}
