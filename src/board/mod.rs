//! Board geometry and starting layouts
//!
//! The board knows its size in cells and pixels. It owns no pieces; the game
//! loop does.

use serde::{Deserialize, Serialize};

use crate::core::config::BoardConfig;
use crate::core::error::{KfcError, Result};
use crate::core::types::{Cell, PieceType, PixelPos, Side};

/// Classic opening position, one row per line, comma-separated piece codes
pub const STANDARD_LAYOUT: &str = "\
RB,NB,BB,QB,KB,BB,NB,RB
PB,PB,PB,PB,PB,PB,PB,PB
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
PW,PW,PW,PW,PW,PW,PW,PW
RW,NW,BW,QW,KW,BW,NW,RW
";

/// Board dimensions in cells and pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub rows: i32,
    pub cols: i32,
    pub cell_width_px: u32,
    pub cell_height_px: u32,
}

impl Board {
    pub fn new(rows: i32, cols: i32, cell_width_px: u32, cell_height_px: u32) -> Self {
        Self {
            rows,
            cols,
            cell_width_px,
            cell_height_px,
        }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(
            config.rows,
            config.cols,
            config.cell_width_px,
            config.cell_height_px,
        )
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.row < self.rows && cell.col >= 0 && cell.col < self.cols
    }

    /// Top-left pixel of a cell
    pub fn cell_to_px(&self, cell: Cell) -> PixelPos {
        PixelPos::new(
            cell.col as f32 * self.cell_width_px as f32,
            cell.row as f32 * self.cell_height_px as f32,
        )
    }

    /// Nearest cell to a pixel position, clamped to the board
    pub fn px_to_cell(&self, pos: PixelPos) -> Cell {
        let col = (pos.x / self.cell_width_px as f32).round() as i32;
        let row = (pos.y / self.cell_height_px as f32).round() as i32;
        Cell::new(
            row.max(0).min(self.rows - 1),
            col.max(0).min(self.cols - 1),
        )
    }

    /// Row on which pawns of `side` promote
    pub fn promotion_row(&self, side: Side) -> i32 {
        side.promotion_row(self.rows)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::from_config(&BoardConfig::default())
    }
}

/// Parse a layout: one board row per line, comma-separated two-character
/// piece codes, empty fields for empty cells.
pub fn parse_layout(text: &str) -> Result<Vec<(PieceType, Cell)>> {
    let mut placements = Vec::new();

    for (row, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        for (col, code) in line.split(',').enumerate() {
            let code = code.trim();
            if code.is_empty() {
                continue;
            }
            let piece_type = PieceType::parse(code).ok_or_else(|| {
                KfcError::Layout(format!("bad piece code '{}' at row {} col {}", code, row, col))
            })?;
            placements.push((piece_type, Cell::new(row as i32, col as i32)));
        }
    }

    Ok(placements)
}
