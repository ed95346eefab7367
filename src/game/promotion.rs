//! Pawn promotion

use tracing::{info, warn};

use crate::core::types::{Cell, PieceId, PieceKind, PieceType, Side, TimeMs};
use crate::piece::{Piece, PieceFactory};

/// A pawn replaced by a queen in the same arena slot
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub slot: usize,
    pub pawn_id: PieceId,
    pub promoted_id: PieceId,
    pub side: Side,
    pub cell: Cell,
}

/// Id for a new piece at `cell`, suffixed `#n` if the plain id is taken
pub fn unique_id(piece_type: PieceType, cell: Cell, taken: impl Fn(&PieceId) -> bool) -> PieceId {
    let base = PieceId::new(piece_type, cell);
    if !taken(&base) {
        return base;
    }
    (2u32..)
        .map(|n| PieceId::from_raw(format!("{}#{}", base, n)))
        .find(|id| !taken(id))
        .unwrap_or(base)
}

/// Replace every pawn standing on its promotion row with a fresh idle queen
pub fn promote_pawns(
    pieces: &mut [Piece],
    factory: &PieceFactory,
    now_ms: TimeMs,
) -> Vec<Promotion> {
    let board = factory.board();
    let due: Vec<usize> = pieces
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            p.kind() == PieceKind::Pawn && p.current_cell().row == board.promotion_row(p.side())
        })
        .map(|(slot, _)| slot)
        .collect();

    let mut promotions = Vec::with_capacity(due.len());
    for slot in due {
        let side = pieces[slot].side();
        let cell = pieces[slot].current_cell();
        let queen_type = PieceType::new(PieceKind::Queen, side);
        let id = unique_id(queen_type, cell, |id| pieces.iter().any(|p| p.id() == id));

        match factory.create_named(id, queen_type, cell, now_ms) {
            Ok(queen) => {
                let pawn = std::mem::replace(&mut pieces[slot], queen);
                info!(pawn = %pawn.id(), queen = %pieces[slot].id(), %cell, "Pawn promoted");
                promotions.push(Promotion {
                    slot,
                    pawn_id: pawn.id().clone(),
                    promoted_id: pieces[slot].id().clone(),
                    side,
                    cell,
                });
            }
            Err(err) => warn!(pawn = %pieces[slot].id(), %err, "Promotion skipped"),
        }
    }

    promotions
}
