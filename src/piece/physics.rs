//! Per-state motion model
//!
//! Position is a pure function of `now - start_ms`, clipped to the state's
//! duration. Once the duration has elapsed the piece sits on `end_cell`.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::core::types::{Cell, PixelPos, TimeMs};

/// How a state moves a piece over time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhysicsModel {
    /// Stationary, never expires
    Idle,
    /// Slides from start to end; duration scales with distance
    Move { ms_per_cell: u64 },
    /// Airborne for a fixed time
    Jump { duration_ms: u64 },
    /// Stationary for a fixed time
    Rest { duration_ms: u64 },
}

impl PhysicsModel {
    /// Stationary models pin the piece to a single cell
    pub fn is_stationary(&self) -> bool {
        matches!(self, PhysicsModel::Idle | PhysicsModel::Rest { .. })
    }

    /// Duration of an action from `start` to `end`, `None` if it never expires
    pub fn duration_ms(&self, start: Cell, end: Cell) -> Option<TimeMs> {
        match *self {
            PhysicsModel::Idle => None,
            PhysicsModel::Move { ms_per_cell } => {
                Some((start.distance(&end) * ms_per_cell as f64).round() as TimeMs)
            }
            PhysicsModel::Jump { duration_ms } | PhysicsModel::Rest { duration_ms } => {
                Some(duration_ms)
            }
        }
    }
}

/// Collision-facing properties of a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicsFlags {
    /// Intermediate cells matter (false for knight-type moves)
    pub needs_clear_path: bool,
    /// Occupies its cell for path checks of other movers
    pub is_blocker: bool,
    /// Can be removed by an opposing winner
    pub is_capturable: bool,
}

impl PhysicsFlags {
    /// Defaults for a model before per-state overrides
    pub fn for_model(model: &PhysicsModel) -> Self {
        match model {
            PhysicsModel::Idle | PhysicsModel::Rest { .. } => Self {
                needs_clear_path: true,
                is_blocker: true,
                is_capturable: true,
            },
            PhysicsModel::Move { .. } => Self {
                needs_clear_path: true,
                is_blocker: false,
                is_capturable: true,
            },
            PhysicsModel::Jump { .. } => Self {
                needs_clear_path: false,
                is_blocker: false,
                is_capturable: false,
            },
        }
    }
}

/// Live physics of the active state of one piece
#[derive(Debug, Clone, PartialEq)]
pub struct Physics {
    model: PhysicsModel,
    flags: PhysicsFlags,
    start_cell: Cell,
    end_cell: Cell,
    start_ms: TimeMs,
    duration_ms: Option<TimeMs>,
    now_ms: TimeMs,
}

impl Physics {
    pub fn new(
        model: PhysicsModel,
        flags: PhysicsFlags,
        start_cell: Cell,
        end_cell: Cell,
        start_ms: TimeMs,
    ) -> Self {
        let end_cell = if model.is_stationary() {
            start_cell
        } else {
            end_cell
        };

        Self {
            model,
            flags,
            start_cell,
            end_cell,
            start_ms,
            duration_ms: model.duration_ms(start_cell, end_cell),
            now_ms: start_ms,
        }
    }

    /// Recompute for the given clock reading
    pub fn update(&mut self, now_ms: TimeMs) {
        self.now_ms = now_ms.max(self.start_ms);
    }

    /// Fraction of the action completed, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        match self.duration_ms {
            None => 0.0,
            Some(0) => 1.0,
            Some(duration) => {
                let elapsed = self.now_ms.saturating_sub(self.start_ms).min(duration);
                elapsed as f64 / duration as f64
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        match self.duration_ms {
            None => false,
            Some(duration) => self.now_ms >= self.start_ms + duration,
        }
    }

    /// Clock time at which the action completes
    pub fn finish_ms(&self) -> Option<TimeMs> {
        self.duration_ms.map(|d| self.start_ms + d)
    }

    /// Cell the piece physically occupies right now (nearest cell to its position)
    pub fn current_cell(&self) -> Cell {
        if self.model.is_stationary() || self.is_finished() {
            return self.end_cell;
        }

        let t = self.progress();
        let row = self.start_cell.row as f64 + (self.end_cell.row - self.start_cell.row) as f64 * t;
        let col = self.start_cell.col as f64 + (self.end_cell.col - self.start_cell.col) as f64 * t;
        Cell::new(row.round() as i32, col.round() as i32)
    }

    /// Pixel position for rendering, interpolated between cells
    pub fn pos_px(&self, board: &Board) -> PixelPos {
        let from = board.cell_to_px(self.start_cell);
        let to = board.cell_to_px(self.end_cell);
        from.lerp(&to, self.progress() as f32)
    }

    pub fn model(&self) -> &PhysicsModel {
        &self.model
    }

    pub fn flags(&self) -> &PhysicsFlags {
        &self.flags
    }

    pub fn start_cell(&self) -> Cell {
        self.start_cell
    }

    pub fn end_cell(&self) -> Cell {
        self.end_cell
    }

    pub fn start_ms(&self) -> TimeMs {
        self.start_ms
    }

    pub fn duration_ms(&self) -> Option<TimeMs> {
        self.duration_ms
    }

    pub fn needs_clear_path(&self) -> bool {
        self.flags.needs_clear_path
    }

    pub fn is_blocker(&self) -> bool {
        self.flags.is_blocker
    }

    pub fn is_capturable(&self) -> bool {
        self.flags.is_capturable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mover(start: Cell, end: Cell, start_ms: TimeMs) -> Physics {
        let model = PhysicsModel::Move { ms_per_cell: 1000 };
        Physics::new(model, PhysicsFlags::for_model(&model), start, end, start_ms)
    }

    #[test]
    fn test_move_duration_scales_with_distance() {
        let p = mover(Cell::new(7, 0), Cell::new(4, 0), 0);
        assert_eq!(p.duration_ms(), Some(3000));

        let knight = mover(Cell::new(7, 1), Cell::new(5, 2), 0);
        assert_eq!(knight.duration_ms(), Some(2236));
    }

    #[test]
    fn test_move_position_clipped_to_duration() {
        let mut p = mover(Cell::new(7, 0), Cell::new(4, 0), 100);
        p.update(50);
        assert_eq!(p.current_cell(), Cell::new(7, 0));

        p.update(1100);
        assert_eq!(p.current_cell(), Cell::new(6, 0));
        assert!(!p.is_finished());

        p.update(99_999);
        assert!(p.is_finished());
        assert_eq!(p.current_cell(), Cell::new(4, 0));
        assert_eq!(p.progress(), 1.0);
        assert_eq!(p.finish_ms(), Some(3100));
    }

    #[test]
    fn test_idle_never_finishes_and_ignores_end() {
        let model = PhysicsModel::Idle;
        let mut p = Physics::new(
            model,
            PhysicsFlags::for_model(&model),
            Cell::new(1, 1),
            Cell::new(5, 5),
            0,
        );
        p.update(u32::MAX as u64);
        assert!(!p.is_finished());
        assert_eq!(p.current_cell(), Cell::new(1, 1));
    }

    #[test]
    fn test_zero_distance_move_finishes_at_once() {
        let p = mover(Cell::new(3, 3), Cell::new(3, 3), 500);
        assert!(p.is_finished());
        assert_eq!(p.current_cell(), Cell::new(3, 3));
    }

    #[test]
    fn test_jump_is_invulnerable_by_default() {
        let flags = PhysicsFlags::for_model(&PhysicsModel::Jump { duration_ms: 1000 });
        assert!(!flags.is_capturable);
        assert!(!flags.needs_clear_path);
    }

    #[test]
    fn test_pixel_interpolation() {
        let board = Board::default();
        let mut p = mover(Cell::new(0, 0), Cell::new(0, 2), 0);
        p.update(1000);
        let px = p.pos_px(&board);
        assert_eq!(px, PixelPos::new(77.0, 0.0));
    }

    #[test]
    fn test_model_toml_shape() {
        #[derive(Deserialize)]
        struct Wrapper {
            physics: PhysicsModel,
        }
        let w: Wrapper = toml::from_str("physics = { kind = \"rest\", duration_ms = 250 }").unwrap();
        assert_eq!(w.physics, PhysicsModel::Rest { duration_ms: 250 });
    }
}
