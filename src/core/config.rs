//! Game configuration with documented defaults
//!
//! Loaded from TOML; every field has a default so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{KfcError, Result};

/// Top-level configuration for a game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub timing: TimingConfig,
}

/// Board geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Number of rows (H)
    pub rows: i32,
    /// Number of columns (W)
    pub cols: i32,
    /// Width of one cell in pixels
    pub cell_width_px: u32,
    /// Height of one cell in pixels
    pub cell_height_px: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            cell_width_px: 77,
            cell_height_px: 77,
        }
    }
}

/// Loop pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wall-clock sleep between ticks
    ///
    /// Ticks are cheap; this only keeps the loop from spinning a core.
    pub tick_interval_ms: u64,

    /// Game-clock speed multiplier over the monotonic clock
    ///
    /// At 2 every piece moves and rests twice as fast in wall time.
    pub time_factor: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 5,
            time_factor: 1,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.board.rows < 2 || self.board.cols < 1 {
            return Err(KfcError::Config(format!(
                "board must be at least 2x1, got {}x{}",
                self.board.rows, self.board.cols
            )));
        }

        if self.board.cell_width_px == 0 || self.board.cell_height_px == 0 {
            return Err(KfcError::Config("cell pixel size must be positive".into()));
        }

        if self.timing.time_factor == 0 {
            return Err(KfcError::Config("time_factor must be at least 1".into()));
        }

        Ok(())
    }
}
