pub mod config;
pub mod error;
pub mod types;

pub use config::{BoardConfig, GameConfig, TimingConfig};
pub use error::{KfcError, Result};
pub use types::{Cell, PieceId, PieceKind, PieceType, PixelPos, Player, Side, TimeMs};
