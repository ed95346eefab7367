//! Game loop - owns the pieces and runs the tick pipeline
//!
//! Input producers talk to the game only through the command channel;
//! renderers and other consumers only see events and snapshots.

pub mod collision;
#[allow(clippy::module_inception)]
pub mod game;
pub mod events;
pub mod index;
pub mod observers;
pub mod promotion;
pub mod runner;
pub mod snapshot;

// Re-exports for convenient access
pub use collision::{resolve_collisions, select_winner, Bounce, Capture, CollisionOutcome};
pub use events::{EventBus, GameEvent, Observer, SubscriptionId};
pub use game::{Game, GamePhase, TickReport};
pub use index::{Occupant, PositionIndex};
pub use observers::{EventForwarder, MoveLog, ScoreBoard, DEFAULT_MOVE_LOG_LEN};
pub use promotion::{promote_pawns, unique_id, Promotion};
pub use runner::{Clock, GameRunner, ManualClock, MonotonicClock, RunFlag, RunMode, RunSummary};
pub use snapshot::{BoardSnapshot, PieceView};
