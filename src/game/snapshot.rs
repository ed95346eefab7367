//! Read-only board view for renderers and input producers

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::core::types::{Cell, PieceId, PieceKind, PixelPos, Side, TimeMs};
use crate::piece::Piece;

/// One piece as a renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceView {
    pub piece_id: PieceId,
    pub kind: PieceKind,
    pub side: Side,
    pub cell: Cell,
    pub pixel: PixelPos,
    pub state: String,
    /// `<type>/<asset>` key of the active state
    pub asset: String,
}

impl PieceView {
    pub fn from_piece(piece: &Piece, board: &Board) -> Self {
        Self {
            piece_id: piece.id().clone(),
            kind: piece.kind(),
            side: piece.side(),
            cell: piece.current_cell(),
            pixel: piece.pos_px(board),
            state: piece.state_name().to_string(),
            asset: piece.asset_key(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == crate::piece::IDLE_STATE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub timestamp: TimeMs,
    pub pieces: Vec<PieceView>,
}

impl BoardSnapshot {
    pub fn capture(timestamp: TimeMs, pieces: &[Piece], board: &Board) -> Self {
        Self {
            timestamp,
            pieces: pieces.iter().map(|p| PieceView::from_piece(p, board)).collect(),
        }
    }

    /// First piece standing on `cell`
    pub fn piece_at(&self, cell: Cell) -> Option<&PieceView> {
        self.pieces.iter().find(|p| p.cell == cell)
    }

    pub fn piece(&self, id: &PieceId) -> Option<&PieceView> {
        self.pieces.iter().find(|p| &p.piece_id == id)
    }

    pub fn side_pieces(&self, side: Side) -> impl Iterator<Item = &PieceView> {
        self.pieces.iter().filter(move |p| p.side == side)
    }
}
