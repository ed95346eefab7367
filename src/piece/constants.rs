//! Timing constants for the built-in piece set

use crate::core::types::TimeMs;

/// Time to slide one cell
pub const MOVE_MS_PER_CELL: TimeMs = 1000;

/// Time airborne during a jump (invulnerable)
pub const JUMP_DURATION_MS: TimeMs = 1000;

/// Recovery after a jump
pub const SHORT_REST_MS: TimeMs = 500;

/// Recovery after a move
pub const LONG_REST_MS: TimeMs = 2000;

/// Longest slide generated for rooks, bishops and queens on an 8x8 board
pub const DEFAULT_SLIDE_RANGE: i32 = 7;
