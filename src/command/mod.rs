//! Commands - timestamped intents for a single piece
//!
//! Input producers build Commands and push them through the command channel;
//! the game loop consumes each one exactly once.

pub mod queue;

pub use queue::{command_channel, CommandInbox, CommandSender};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::{Cell, PieceId, Player, TimeMs};

/// What the command asks the piece to do. Doubles as the state machine event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Idle,
    Move,
    Jump,
}

impl CommandKind {
    pub fn event_name(&self) -> &'static str {
        match self {
            CommandKind::Idle => "idle",
            CommandKind::Move => "move",
            CommandKind::Jump => "jump",
        }
    }
}

/// A timestamped intent for one piece
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub timestamp_ms: TimeMs,
    pub piece_id: PieceId,
    pub kind: CommandKind,
    /// One or two cells; the last one is the destination
    pub params: Vec<Cell>,
    #[serde(default)]
    pub player: Option<Player>,
}

impl Command {
    pub fn new(
        timestamp_ms: TimeMs,
        piece_id: PieceId,
        kind: CommandKind,
        params: Vec<Cell>,
        player: Option<Player>,
    ) -> Self {
        Self {
            timestamp_ms,
            piece_id,
            kind,
            params,
            player,
        }
    }

    pub fn move_to(
        timestamp_ms: TimeMs,
        piece_id: PieceId,
        from: Cell,
        to: Cell,
        player: Option<Player>,
    ) -> Self {
        Self::new(timestamp_ms, piece_id, CommandKind::Move, vec![from, to], player)
    }

    pub fn jump(
        timestamp_ms: TimeMs,
        piece_id: PieceId,
        from: Cell,
        to: Cell,
        player: Option<Player>,
    ) -> Self {
        Self::new(timestamp_ms, piece_id, CommandKind::Jump, vec![from, to], player)
    }

    pub fn idle(timestamp_ms: TimeMs, piece_id: PieceId, at: Cell, player: Option<Player>) -> Self {
        Self::new(timestamp_ms, piece_id, CommandKind::Idle, vec![at], player)
    }

    /// Declared destination (last param)
    pub fn destination(&self) -> Option<Cell> {
        self.params.last().copied()
    }

    /// Params hold one or two cells
    pub fn is_well_formed(&self) -> bool {
        (1..=2).contains(&self.params.len())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}ms {}",
            self.kind.event_name(),
            self.timestamp_ms,
            self.piece_id
        )?;
        for cell in &self.params {
            write!(f, " {}", cell)?;
        }
        if let Some(player) = self.player {
            write!(f, " p{}", player.number())?;
        }
        Ok(())
    }
}
