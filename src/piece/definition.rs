//! Piece definitions as read from configuration
//!
//! A definition lists the named states of one piece kind and the transitions
//! between them. It is plain data; `StateGraph::build` turns it into a
//! validated graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::piece::physics::PhysicsModel;

/// Configuration for a single state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    pub physics: PhysicsModel,
    /// Overrides the model default
    #[serde(default)]
    pub need_clear_path: Option<bool>,
    #[serde(default)]
    pub blocker: Option<bool>,
    #[serde(default)]
    pub capturable: Option<bool>,
    /// `d_row,d_col[:tag]` lines in White's orientation
    #[serde(default)]
    pub moves: Option<Vec<String>>,
    /// Asset key, defaults to the state name
    #[serde(default)]
    pub asset: Option<String>,
}

impl StateConfig {
    pub fn new(physics: PhysicsModel) -> Self {
        Self {
            physics,
            need_clear_path: None,
            blocker: None,
            capturable: None,
            moves: None,
            asset: None,
        }
    }

    pub fn with_moves(mut self, moves: Vec<String>) -> Self {
        self.moves = Some(moves);
        self
    }
}

/// `from --event--> to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionConfig {
    pub from: String,
    pub event: String,
    pub to: String,
}

impl TransitionConfig {
    pub fn new(from: &str, event: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            event: event.to_string(),
            to: to.to_string(),
        }
    }
}

/// All states and transitions of one piece kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PieceDefinition {
    pub states: BTreeMap<String, StateConfig>,
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,
}

impl PieceDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, name: &str, config: StateConfig) -> Self {
        self.states.insert(name.to_string(), config);
        self
    }

    pub fn with_transition(mut self, from: &str, event: &str, to: &str) -> Self {
        self.transitions.push(TransitionConfig::new(from, event, to));
        self
    }
}
