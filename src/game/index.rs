//! Position index - which pieces sit on which cell this tick
//!
//! Rebuilt from scratch every tick; never patched incrementally.

use ahash::AHashMap;

use crate::core::types::{Cell, PieceId, Side};
use crate::piece::Piece;

/// One piece as seen from a cell
#[derive(Debug, Clone, PartialEq)]
pub struct Occupant {
    /// Position of the piece in the game's arena
    pub slot: usize,
    pub id: PieceId,
    pub side: Side,
    pub is_blocker: bool,
}

/// Cell -> pieces, in arena order
#[derive(Debug, Clone, Default)]
pub struct PositionIndex {
    cells: AHashMap<Cell, Vec<Occupant>>,
}

impl PositionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index for the given arena
    pub fn from_pieces(pieces: &[Piece]) -> Self {
        let mut index = Self::new();
        index.rebuild(pieces);
        index
    }

    /// Drop every entry and re-insert each piece at its current cell
    pub fn rebuild(&mut self, pieces: &[Piece]) {
        self.cells.clear();
        for (slot, piece) in pieces.iter().enumerate() {
            self.insert(
                piece.current_cell(),
                Occupant {
                    slot,
                    id: piece.id().clone(),
                    side: piece.side(),
                    is_blocker: piece.is_blocker(),
                },
            );
        }
    }

    pub fn insert(&mut self, cell: Cell, occupant: Occupant) {
        self.cells.entry(cell).or_default().push(occupant);
    }

    pub fn occupants(&self, cell: Cell) -> &[Occupant] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cells holding two or more pieces, in row-major order
    pub fn crowded_cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .cells
            .iter()
            .filter(|(_, occupants)| occupants.len() >= 2)
            .map(|(cell, _)| *cell)
            .collect();
        cells.sort();
        cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of occupied cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}
