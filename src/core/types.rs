//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Game clock time in milliseconds since the game started
pub type TimeMs = u64;

/// Board cell, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Relative offset `(d_row, d_col)` from self to other
    pub fn offset_to(&self, other: &Self) -> (i32, i32) {
        (other.row - self.row, other.col - self.col)
    }

    /// Euclidean distance in cells
    pub fn distance(&self, other: &Self) -> f64 {
        let dr = (other.row - self.row) as f64;
        let dc = (other.col - self.col) as f64;
        (dr * dr + dc * dc).sqrt()
    }

    /// Cells strictly between self and other along a rank, file or diagonal.
    ///
    /// Returns an empty list for adjacent cells and for offsets that are not
    /// straight lines (knight jumps).
    pub fn line_to(&self, other: &Self) -> Vec<Cell> {
        let (dr, dc) = self.offset_to(other);
        let straight = dr == 0 || dc == 0 || dr.abs() == dc.abs();
        if !straight {
            return Vec::new();
        }

        let steps = dr.abs().max(dc.abs());
        let (sr, sc) = (dr.signum(), dc.signum());
        (1..steps)
            .map(|i| Cell::new(self.row + sr * i, self.col + sc * i))
            .collect()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

/// Side of the board. White is driven by player 1, Black by player 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "W")]
    White,
    #[serde(rename = "B")]
    Black,
}

impl Side {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'W' => Some(Side::White),
            'B' => Some(Side::Black),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            Side::White => 'W',
            Side::Black => 'B',
        }
    }

    pub fn opponent(&self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// The player that owns this side
    pub fn player(&self) -> Player {
        match self {
            Side::White => Player::One,
            Side::Black => Player::Two,
        }
    }

    /// Row that promotes this side's pawns on a board with `rows` rows
    pub fn promotion_row(&self, rows: i32) -> i32 {
        match self {
            Side::White => 0,
            Side::Black => rows - 1,
        }
    }
}

/// Player number attached to commands, serialised as 1 or 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn side(&self) -> Side {
        match self {
            Player::One => Side::White,
            Player::Two => Side::Black,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            other => Err(format!("invalid player number {}", other)),
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> u8 {
        player.number()
    }
}

/// Chess piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "K")]
    King,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "R")]
    Rook,
    #[serde(rename = "B")]
    Bishop,
    #[serde(rename = "N")]
    Knight,
    #[serde(rename = "P")]
    Pawn,
}

impl PieceKind {
    pub fn all() -> [PieceKind; 6] {
        [
            PieceKind::King,
            PieceKind::Queen,
            PieceKind::Rook,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Pawn,
        ]
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'K' => Some(PieceKind::King),
            'Q' => Some(PieceKind::Queen),
            'R' => Some(PieceKind::Rook),
            'B' => Some(PieceKind::Bishop),
            'N' => Some(PieceKind::Knight),
            'P' => Some(PieceKind::Pawn),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Queen => 'Q',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Pawn => 'P',
        }
    }

    /// Material value credited to the capturing side
    pub fn value(&self) -> u32 {
        match self {
            PieceKind::King => 0,
            PieceKind::Queen => 9,
            PieceKind::Rook => 5,
            PieceKind::Bishop | PieceKind::Knight => 3,
            PieceKind::Pawn => 1,
        }
    }
}

/// Kind plus side, written as a two-character code such as `PW`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceType {
    pub kind: PieceKind,
    pub side: Side,
}

impl PieceType {
    pub fn new(kind: PieceKind, side: Side) -> Self {
        Self { kind, side }
    }

    /// Parse a two-character code (`"KW"`, `"PB"`, ...)
    pub fn parse(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let kind = PieceKind::from_code(chars.next()?)?;
        let side = Side::from_code(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Self { kind, side })
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.code(), self.side.code())
    }
}

/// Piece identity in the fixed `Type+Side_cell` shape, e.g. `PW_(6,4)`.
///
/// The cell in the id is where the piece was created, not where it is now.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(String);

impl PieceId {
    pub fn new(piece_type: PieceType, cell: Cell) -> Self {
        Self(format!("{}_{}", piece_type, cell))
    }

    /// Wrap a raw id string as received from an input source
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> Option<PieceKind> {
        self.0.chars().next().and_then(PieceKind::from_code)
    }

    /// Side derived from the second character of the id
    pub fn side(&self) -> Option<Side> {
        self.0.chars().nth(1).and_then(Side::from_code)
    }

    pub fn piece_type(&self) -> Option<PieceType> {
        Some(PieceType::new(self.kind()?, self.side()?))
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pixel-space position for rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: f32,
    pub y: f32,
}

impl PixelPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `other`, `t` in `[0, 1]`
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}
