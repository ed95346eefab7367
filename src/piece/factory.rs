//! Piece sets and the factory that turns them into pieces
//!
//! A `PieceSet` holds one `PieceDefinition` per piece kind (keyed by the kind
//! code, `"K"`, `"N"`, ...). The factory builds a validated graph per piece
//! type once and hands out pieces sharing it.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::board::Board;
use crate::core::error::{KfcError, Result};
use crate::core::types::{Cell, PieceId, PieceKind, PieceType, Side, TimeMs};
use crate::piece::constants::{
    DEFAULT_SLIDE_RANGE, JUMP_DURATION_MS, LONG_REST_MS, MOVE_MS_PER_CELL, SHORT_REST_MS,
};
use crate::piece::definition::{PieceDefinition, StateConfig};
use crate::piece::graph::{
    StateGraph, IDLE_STATE, JUMP_STATE, LONG_REST_STATE, MOVE_STATE, SHORT_REST_STATE,
};
use crate::piece::physics::PhysicsModel;
use crate::piece::Piece;

/// Definitions for every piece kind in a game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PieceSet {
    pub pieces: BTreeMap<String, PieceDefinition>,
}

impl PieceSet {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Built-in chess set for an 8x8 board
    pub fn standard() -> Self {
        Self::standard_with_range(DEFAULT_SLIDE_RANGE)
    }

    /// Built-in chess set with sliding pieces reaching `range` cells
    pub fn standard_with_range(range: i32) -> Self {
        let pieces = PieceKind::all()
            .into_iter()
            .map(|kind| (kind.code().to_string(), standard_definition(kind, range)))
            .collect();
        Self { pieces }
    }

    pub fn definition(&self, kind: PieceKind) -> Option<&PieceDefinition> {
        self.pieces.get(&kind.code().to_string())
    }

    /// Replace or add the definition for one kind
    pub fn insert(&mut self, kind: PieceKind, definition: PieceDefinition) {
        self.pieces.insert(kind.code().to_string(), definition);
    }
}

fn standard_definition(kind: PieceKind, range: i32) -> PieceDefinition {
    PieceDefinition::new()
        .with_state(
            IDLE_STATE,
            StateConfig::new(PhysicsModel::Idle).with_moves(standard_moves(kind, range)),
        )
        .with_state(
            MOVE_STATE,
            StateConfig::new(PhysicsModel::Move {
                ms_per_cell: MOVE_MS_PER_CELL,
            }),
        )
        .with_state(
            JUMP_STATE,
            StateConfig::new(PhysicsModel::Jump {
                duration_ms: JUMP_DURATION_MS,
            }),
        )
        .with_state(
            SHORT_REST_STATE,
            StateConfig::new(PhysicsModel::Rest {
                duration_ms: SHORT_REST_MS,
            }),
        )
        .with_state(
            LONG_REST_STATE,
            StateConfig::new(PhysicsModel::Rest {
                duration_ms: LONG_REST_MS,
            }),
        )
        .with_transition(IDLE_STATE, "move", MOVE_STATE)
        .with_transition(MOVE_STATE, "done", LONG_REST_STATE)
        .with_transition(LONG_REST_STATE, "done", IDLE_STATE)
}

/// Move lines in White's orientation
fn standard_moves(kind: PieceKind, range: i32) -> Vec<String> {
    const ORTHOGONAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    const DIAGONAL: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
    const KNIGHT: [(i32, i32); 8] = [
        (-2, -1),
        (-2, 1),
        (-1, -2),
        (-1, 2),
        (1, -2),
        (1, 2),
        (2, -1),
        (2, 1),
    ];

    let slide = |dirs: &[(i32, i32)]| -> Vec<String> {
        dirs.iter()
            .flat_map(|&(dr, dc)| (1..=range).map(move |i| format!("{},{}", dr * i, dc * i)))
            .collect()
    };
    let step = |dirs: &[(i32, i32)]| -> Vec<String> {
        dirs.iter().map(|(dr, dc)| format!("{},{}", dr, dc)).collect()
    };

    match kind {
        PieceKind::King => {
            let mut moves = step(&ORTHOGONAL);
            moves.extend(step(&DIAGONAL));
            moves
        }
        PieceKind::Queen => {
            let mut moves = slide(&ORTHOGONAL);
            moves.extend(slide(&DIAGONAL));
            moves
        }
        PieceKind::Rook => slide(&ORTHOGONAL),
        PieceKind::Bishop => slide(&DIAGONAL),
        PieceKind::Knight => step(&KNIGHT),
        PieceKind::Pawn => vec![
            "-1,0:non_capture".to_string(),
            "-1,-1:capture".to_string(),
            "-1,1:capture".to_string(),
        ],
    }
}

/// Builds pieces from validated, shared state graphs
#[derive(Debug, Clone)]
pub struct PieceFactory {
    board: Board,
    graphs: AHashMap<PieceType, Arc<StateGraph>>,
}

impl PieceFactory {
    /// Build and validate a graph for both sides of every kind in the set
    pub fn new(board: Board, set: &PieceSet) -> Result<Self> {
        let mut graphs = AHashMap::new();

        for (code, definition) in &set.pieces {
            let kind = single_char(code)
                .and_then(PieceKind::from_code)
                .ok_or_else(|| KfcError::UnknownPieceType(code.clone()))?;

            for side in [Side::White, Side::Black] {
                let piece_type = PieceType::new(kind, side);
                let graph = StateGraph::build(piece_type, definition)?;
                graphs.insert(piece_type, Arc::new(graph));
            }
        }

        Ok(Self { board, graphs })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn graph(&self, piece_type: PieceType) -> Option<&Arc<StateGraph>> {
        self.graphs.get(&piece_type)
    }

    /// New piece of `piece_type`, idle at `cell`
    pub fn create_piece(&self, piece_type: PieceType, cell: Cell, now_ms: TimeMs) -> Result<Piece> {
        self.create_named(PieceId::new(piece_type, cell), piece_type, cell, now_ms)
    }

    /// Like `create_piece` with a caller-chosen id
    pub fn create_named(
        &self,
        id: PieceId,
        piece_type: PieceType,
        cell: Cell,
        now_ms: TimeMs,
    ) -> Result<Piece> {
        let graph = self
            .graphs
            .get(&piece_type)
            .ok_or_else(|| KfcError::UnknownPieceType(piece_type.to_string()))?;

        if !self.board.contains(cell) {
            return Err(KfcError::InvalidBoard(format!(
                "{} placed outside the board at {}",
                piece_type, cell
            )));
        }

        Ok(Piece::new(id, Arc::clone(graph), cell, now_ms))
    }

    /// Create every piece of a parsed layout
    pub fn create_layout(
        &self,
        placements: &[(PieceType, Cell)],
        now_ms: TimeMs,
    ) -> Result<Vec<Piece>> {
        placements
            .iter()
            .map(|(piece_type, cell)| self.create_piece(*piece_type, *cell, now_ms))
            .collect()
    }
}

fn single_char(code: &str) -> Option<char> {
    let mut chars = code.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}
