//! Cursor-driven player controller
//!
//! Turns abstract player actions into commands. Key capture and key maps
//! live with the caller; this only tracks the cursor and the selection.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::Command;
use crate::core::types::{Cell, PieceId, Player, TimeMs};
use crate::game::snapshot::BoardSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    Up,
    Down,
    Left,
    Right,
    Select,
    Jump,
}

#[derive(Debug, Clone)]
pub struct PlayerController {
    player: Player,
    rows: i32,
    cols: i32,
    cursor: Cell,
    selected: Option<(PieceId, Cell)>,
}

impl PlayerController {
    /// Controller with its cursor on `start`
    pub fn new(player: Player, rows: i32, cols: i32, start: Cell) -> Self {
        Self {
            player,
            rows,
            cols,
            cursor: Cell::new(
                start.row.clamp(0, rows - 1),
                start.col.clamp(0, cols - 1),
            ),
            selected: None,
        }
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn cursor(&self) -> Cell {
        self.cursor
    }

    pub fn selected(&self) -> Option<&PieceId> {
        self.selected.as_ref().map(|(id, _)| id)
    }

    /// Apply one action. Returns a command when the action completes one.
    pub fn handle(
        &mut self,
        action: PlayerAction,
        snapshot: &BoardSnapshot,
        now_ms: TimeMs,
    ) -> Option<Command> {
        match action {
            PlayerAction::Up => self.shift(-1, 0),
            PlayerAction::Down => self.shift(1, 0),
            PlayerAction::Left => self.shift(0, -1),
            PlayerAction::Right => self.shift(0, 1),
            PlayerAction::Select => return self.select(snapshot, now_ms),
            PlayerAction::Jump => return self.jump(snapshot, now_ms),
        }
        None
    }

    fn shift(&mut self, d_row: i32, d_col: i32) {
        self.cursor = Cell::new(
            (self.cursor.row + d_row).clamp(0, self.rows - 1),
            (self.cursor.col + d_col).clamp(0, self.cols - 1),
        );
    }

    /// Own piece under the cursor
    fn own_piece_at_cursor(&self, snapshot: &BoardSnapshot) -> Option<PieceId> {
        let side = self.player.side();
        let found = snapshot
            .pieces
            .iter()
            .find(|p| p.cell == self.cursor && p.side == side)
            .map(|p| p.piece_id.clone());
        if found.is_none() {
            debug!(player = self.player.number(), cell = %self.cursor, "No own piece under cursor");
        }
        found
    }

    fn select(&mut self, snapshot: &BoardSnapshot, now_ms: TimeMs) -> Option<Command> {
        match self.selected.take() {
            None => {
                let id = self.own_piece_at_cursor(snapshot)?;
                self.selected = Some((id, self.cursor));
                None
            }
            // Same cell again cancels
            Some((_, from)) if from == self.cursor => None,
            Some((id, from)) => Some(Command::move_to(
                now_ms,
                id,
                from,
                self.cursor,
                Some(self.player),
            )),
        }
    }

    fn jump(&mut self, snapshot: &BoardSnapshot, now_ms: TimeMs) -> Option<Command> {
        let (id, from) = match self.selected.take() {
            Some(selection) => selection,
            None => (self.own_piece_at_cursor(snapshot)?, self.cursor),
        };
        Some(Command::jump(now_ms, id, from, self.cursor, Some(self.player)))
    }
}
