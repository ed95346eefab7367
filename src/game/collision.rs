//! Collision resolution for cells shared by two or more pieces
//!
//! Winner policy: pieces mid-move beat stationary ones; among the candidates
//! the latest `start_ms` wins, and on an exact tie the later arena slot wins.
//! A winner sharing its cell with a friend is sent back to its origin. A
//! winner alone with opponents captures every capturable one of them.

use ahash::AHashSet;
use tracing::{debug, info};

use crate::core::types::{Cell, PieceId, PieceKind, Side, TimeMs};
use crate::game::index::{Occupant, PositionIndex};
use crate::piece::Piece;

/// A piece removed by an opposing winner
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub slot: usize,
    pub piece_id: PieceId,
    pub kind: PieceKind,
    pub side: Side,
    pub by_side: Side,
    pub cell: Cell,
}

/// A winner sent back because a friend holds the cell
#[derive(Debug, Clone, PartialEq)]
pub struct Bounce {
    pub slot: usize,
    pub piece_id: PieceId,
    pub at: Cell,
    pub back_to: Cell,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionOutcome {
    pub captures: Vec<Capture>,
    pub bounces: Vec<Bounce>,
}

impl CollisionOutcome {
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty() && self.bounces.is_empty()
    }

    /// Arena slots to remove
    pub fn captured_slots(&self) -> AHashSet<usize> {
        self.captures.iter().map(|c| c.slot).collect()
    }
}

/// Slot of the piece that owns a contested cell
pub fn select_winner(pieces: &[Piece], occupants: &[Occupant]) -> Option<usize> {
    let movers: Vec<usize> = occupants
        .iter()
        .map(|o| o.slot)
        .filter(|&slot| pieces[slot].is_moving())
        .collect();

    let candidates = if movers.is_empty() {
        occupants.iter().map(|o| o.slot).collect()
    } else {
        movers
    };

    // max_by_key keeps the last maximum, so later slots win exact ties
    candidates
        .into_iter()
        .max_by_key(|&slot| (pieces[slot].start_ms(), slot))
}

/// Resolve every crowded cell of `index` against the arena.
///
/// Bounces are applied to the pieces immediately; captures are only reported,
/// removal is up to the caller.
pub fn resolve_collisions(
    pieces: &mut [Piece],
    index: &PositionIndex,
    now_ms: TimeMs,
) -> CollisionOutcome {
    let mut outcome = CollisionOutcome::default();
    let mut captured: AHashSet<usize> = AHashSet::new();

    for cell in index.crowded_cells() {
        let occupants: Vec<Occupant> = index
            .occupants(cell)
            .iter()
            .filter(|o| !captured.contains(&o.slot))
            .cloned()
            .collect();
        if occupants.len() < 2 {
            continue;
        }

        let Some(winner) = select_winner(pieces, &occupants) else {
            continue;
        };
        let winner_side = pieces[winner].side();

        // Pieces that ignore the path only collide where they land
        if !pieces[winner].needs_clear_path() && cell != pieces[winner].end_cell() {
            continue;
        }

        let friendly_block = occupants
            .iter()
            .any(|o| o.slot != winner && o.side == winner_side);

        if friendly_block {
            let piece = &mut pieces[winner];
            if piece.has_left_origin() {
                let back_to = piece.origin();
                piece.return_to_start(now_ms);
                debug!(piece = %piece.id(), %cell, %back_to, "Bounced off friendly piece");
                outcome.bounces.push(Bounce {
                    slot: winner,
                    piece_id: piece.id().clone(),
                    at: cell,
                    back_to,
                });
            }
            continue;
        }

        for occupant in occupants.iter().filter(|o| o.slot != winner) {
            let victim = &pieces[occupant.slot];
            if victim.side() == winner_side || !victim.is_capturable() {
                continue;
            }

            info!(
                captured = %victim.id(),
                by = %pieces[winner].id(),
                %cell,
                "Piece captured"
            );
            captured.insert(occupant.slot);
            outcome.captures.push(Capture {
                slot: occupant.slot,
                piece_id: victim.id().clone(),
                kind: victim.kind(),
                side: victim.side(),
                by_side: winner_side,
                cell,
            });
        }
    }

    outcome
}
