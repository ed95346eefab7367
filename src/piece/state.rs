//! State nodes of a piece's finite-state machine
//!
//! A `StateDef` is immutable once its graph is built. Transitions refer to
//! sibling states by `StateId` inside the owning `StateGraph` arena.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::Board;
use crate::command::{Command, CommandKind};
use crate::core::types::{Cell, PieceId, Side};
use crate::game::index::PositionIndex;
use crate::piece::moves::{MovesTable, TargetOccupancy};
use crate::piece::physics::{PhysicsFlags, PhysicsModel};

/// Event fired when a timed state runs out
pub const DONE_EVENT: &str = "done";

/// Index of a state inside its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Why a command did not change a piece's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// No active piece has the command's id
    UnknownPiece,
    /// The issuing player does not own the piece
    WrongOwner,
    /// Params missing or too many
    Malformed,
    /// Current state has no transition for the command's event
    NoTransition,
    /// Offset not in the state's move table
    IllegalMove,
    /// Destination outside the board
    OffBoard,
    /// Destination already holds a piece of the same side
    FriendlyOccupied,
    /// A blocker stands between start and destination
    PathBlocked,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::UnknownPiece => "unknown piece",
            Rejection::WrongOwner => "piece belongs to the other player",
            Rejection::Malformed => "malformed command",
            Rejection::NoTransition => "no transition for event",
            Rejection::IllegalMove => "illegal move",
            Rejection::OffBoard => "destination off board",
            Rejection::FriendlyOccupied => "destination occupied by own piece",
            Rejection::PathBlocked => "path blocked",
        };
        f.write_str(text)
    }
}

/// Everything a state needs to judge a command
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub piece_id: &'a PieceId,
    pub side: Side,
    /// Cell the piece occupies when the command arrives
    pub from: Cell,
    pub index: &'a PositionIndex,
    pub board: &'a Board,
}

/// One node of the state graph
#[derive(Debug, Clone)]
pub struct StateDef {
    pub name: String,
    pub model: PhysicsModel,
    pub flags: PhysicsFlags,
    /// Legal offsets for commands issued from this state
    pub moves: Option<MovesTable>,
    /// Visual asset key handed to renderers
    pub asset: String,
    pub(crate) transitions: AHashMap<String, StateId>,
}

impl StateDef {
    pub fn new(name: impl Into<String>, model: PhysicsModel) -> Self {
        let name = name.into();
        Self {
            asset: name.clone(),
            name,
            flags: PhysicsFlags::for_model(&model),
            model,
            moves: None,
            transitions: AHashMap::new(),
        }
    }

    pub fn transition(&self, event: &str) -> Option<StateId> {
        self.transitions.get(event).copied()
    }

    pub fn set_transition(&mut self, event: impl Into<String>, target: StateId) {
        self.transitions.insert(event.into(), target);
    }

    /// Registered `(event, target)` pairs, sorted by event name
    pub fn transitions(&self) -> Vec<(&str, StateId)> {
        let mut out: Vec<(&str, StateId)> = self
            .transitions
            .iter()
            .map(|(event, id)| (event.as_str(), *id))
            .collect();
        out.sort();
        out
    }

    /// Check a command against this state's move table and the board.
    ///
    /// `target` is the state the command would enter. Returns the destination
    /// cell on success.
    pub fn check_command(
        &self,
        target: &StateDef,
        cmd: &Command,
        ctx: &CommandContext<'_>,
    ) -> Result<Cell, Rejection> {
        if !cmd.is_well_formed() {
            return Err(Rejection::Malformed);
        }
        let dest = cmd.destination().ok_or(Rejection::Malformed)?;

        if !ctx.board.contains(dest) {
            return Err(Rejection::OffBoard);
        }

        if cmd.kind == CommandKind::Idle {
            return Ok(dest);
        }

        let offset = ctx.from.offset_to(&dest);
        let in_place = offset == (0, 0);

        if in_place && cmd.kind == CommandKind::Move {
            return Err(Rejection::IllegalMove);
        }

        let others = ctx
            .index
            .occupants(dest)
            .iter()
            .filter(|o| &o.id != ctx.piece_id);

        let mut occupancy = TargetOccupancy::Empty;
        for occupant in others {
            if occupant.side == ctx.side {
                return Err(Rejection::FriendlyOccupied);
            }
            occupancy = TargetOccupancy::Opponent;
        }

        // Jumping on the spot is always allowed
        if !in_place {
            if let Some(moves) = &self.moves {
                if !moves.allows(offset, occupancy) {
                    return Err(Rejection::IllegalMove);
                }
            }
        }

        if cmd.kind == CommandKind::Move && target.flags.needs_clear_path {
            let blocked = ctx.from.line_to(&dest).into_iter().any(|cell| {
                ctx.index
                    .occupants(cell)
                    .iter()
                    .any(|o| o.is_blocker && &o.id != ctx.piece_id)
            });
            if blocked {
                return Err(Rejection::PathBlocked);
            }
        }

        Ok(dest)
    }
}
