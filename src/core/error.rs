use thiserror::Error;

#[derive(Error, Debug)]
pub enum KfcError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Piece type {piece_type} is missing required state '{state}'")]
    MissingState { piece_type: String, state: String },

    #[error("Piece type {piece_type} references unknown state '{state}'")]
    UnknownState { piece_type: String, state: String },

    #[error("Unknown piece type: {0}")]
    UnknownPieceType(String),

    #[error("Invalid board: {0}")]
    InvalidBoard(String),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KfcError>;
