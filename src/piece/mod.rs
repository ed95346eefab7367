//! Pieces - per-piece finite-state machines with timed physics
//!
//! Each piece type owns a validated `StateGraph` built from a `PieceDefinition`.
//! A `Piece` is an id plus the active state of that graph; commands and clock
//! ticks are the only way to move it between states.

pub mod constants;
pub mod definition;
pub mod factory;
pub mod graph;
pub mod moves;
#[allow(clippy::module_inception)]
pub mod piece;
pub mod physics;
pub mod state;

// Re-exports for convenient access
pub use constants::*;
pub use definition::{PieceDefinition, StateConfig, TransitionConfig};
pub use factory::{PieceFactory, PieceSet};
pub use graph::{StateGraph, IDLE_STATE, JUMP_STATE, LONG_REST_STATE, MOVE_STATE, SHORT_REST_STATE};
pub use moves::{MoveRule, MoveTag, MovesTable, TargetOccupancy};
pub use piece::{Piece, Transition};
pub use physics::{Physics, PhysicsFlags, PhysicsModel};
pub use state::{CommandContext, Rejection, StateDef, StateId, DONE_EVENT};
