//! Legal relative offsets for a state
//!
//! Each line is `d_row,d_col` with an optional `:capture` or `:non_capture`
//! tag. Offsets are written from White's point of view; Black uses the
//! mirrored table.

use serde::{Deserialize, Serialize};

use crate::core::error::{KfcError, Result};

/// Restriction attached to an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveTag {
    /// Allowed onto empty cells and onto opponents
    Any,
    /// Only onto a cell holding an opponent
    CaptureOnly,
    /// Only onto an empty cell
    NonCapture,
}

/// What currently sits on a destination cell, from the mover's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOccupancy {
    Empty,
    Opponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRule {
    pub d_row: i32,
    pub d_col: i32,
    pub tag: MoveTag,
}

impl MoveRule {
    pub fn permits(&self, target: TargetOccupancy) -> bool {
        match (self.tag, target) {
            (MoveTag::Any, _) => true,
            (MoveTag::CaptureOnly, TargetOccupancy::Opponent) => true,
            (MoveTag::NonCapture, TargetOccupancy::Empty) => true,
            _ => false,
        }
    }
}

/// Precomputed table of legal offsets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovesTable {
    rules: Vec<MoveRule>,
}

impl MovesTable {
    pub fn new(rules: Vec<MoveRule>) -> Self {
        Self { rules }
    }

    /// Parse `d_row,d_col[:tag]` lines. Blank lines and `#` comments are skipped.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let mut rules = Vec::with_capacity(lines.len());

        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (offset, tag) = match line.split_once(':') {
                Some((offset, tag)) => (offset, parse_tag(tag.trim())?),
                None => (line, MoveTag::Any),
            };

            let (d_row, d_col) = offset
                .split_once(',')
                .ok_or_else(|| KfcError::Config(format!("bad move line '{}'", line)))?;
            let d_row = d_row
                .trim()
                .parse::<i32>()
                .map_err(|e| KfcError::Config(format!("bad move line '{}': {}", line, e)))?;
            let d_col = d_col
                .trim()
                .parse::<i32>()
                .map_err(|e| KfcError::Config(format!("bad move line '{}': {}", line, e)))?;

            rules.push(MoveRule { d_row, d_col, tag });
        }

        Ok(Self { rules })
    }

    /// Table seen from the other side of the board (rows flipped)
    pub fn mirrored(&self) -> Self {
        Self {
            rules: self
                .rules
                .iter()
                .map(|r| MoveRule {
                    d_row: -r.d_row,
                    ..*r
                })
                .collect(),
        }
    }

    pub fn rule_for(&self, offset: (i32, i32)) -> Option<&MoveRule> {
        self.rules
            .iter()
            .find(|r| (r.d_row, r.d_col) == offset)
    }

    /// Is `offset` legal given what sits on the destination?
    pub fn allows(&self, offset: (i32, i32), target: TargetOccupancy) -> bool {
        self.rules
            .iter()
            .any(|r| (r.d_row, r.d_col) == offset && r.permits(target))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[MoveRule] {
        &self.rules
    }
}

fn parse_tag(tag: &str) -> Result<MoveTag> {
    match tag {
        "" => Ok(MoveTag::Any),
        "capture" => Ok(MoveTag::CaptureOnly),
        "non_capture" => Ok(MoveTag::NonCapture),
        other => Err(KfcError::Config(format!("unknown move tag '{}'", other))),
    }
}
