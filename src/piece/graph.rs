//! State graph - arena of states for one piece type
//!
//! States are addressed by `StateId`; names map to ids. The graph is built
//! once per piece type, validated, then shared read-only by every piece of
//! that type.

use ahash::AHashMap;
use std::collections::VecDeque;

use crate::core::error::{KfcError, Result};
use crate::core::types::{PieceKind, PieceType, Side};
use crate::piece::definition::PieceDefinition;
use crate::piece::moves::MovesTable;
use crate::piece::state::{StateDef, StateId, DONE_EVENT};

pub const IDLE_STATE: &str = "idle";
pub const MOVE_STATE: &str = "move";
pub const JUMP_STATE: &str = "jump";
pub const SHORT_REST_STATE: &str = "short_rest";
pub const LONG_REST_STATE: &str = "long_rest";

#[derive(Debug, Clone)]
pub struct StateGraph {
    piece_type: PieceType,
    states: Vec<StateDef>,
    by_name: AHashMap<String, StateId>,
    idle: StateId,
}

impl StateGraph {
    /// Build and validate the graph for `piece_type` from its definition
    pub fn build(piece_type: PieceType, definition: &PieceDefinition) -> Result<Self> {
        let type_name = piece_type.to_string();
        let mut states = Vec::with_capacity(definition.states.len());
        let mut by_name = AHashMap::new();

        for (name, config) in &definition.states {
            let mut state = StateDef::new(name.clone(), config.physics);

            if let Some(v) = config.need_clear_path {
                state.flags.needs_clear_path = v;
            }
            if let Some(v) = config.blocker {
                state.flags.is_blocker = v;
            }
            if let Some(v) = config.capturable {
                state.flags.is_capturable = v;
            }
            if let Some(asset) = &config.asset {
                state.asset = asset.clone();
            }
            if let Some(lines) = &config.moves {
                let table = MovesTable::parse(lines)?;
                state.moves = Some(match piece_type.side {
                    Side::White => table,
                    Side::Black => table.mirrored(),
                });
            }

            by_name.insert(name.clone(), StateId(states.len()));
            states.push(state);
        }

        let idle = *by_name.get(IDLE_STATE).ok_or_else(|| KfcError::MissingState {
            piece_type: type_name.clone(),
            state: IDLE_STATE.to_string(),
        })?;

        let lookup = |name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| KfcError::UnknownState {
                    piece_type: type_name.clone(),
                    state: name.to_string(),
                })
        };

        for t in &definition.transitions {
            let from = lookup(&t.from)?;
            let to = lookup(&t.to)?;
            states[from.0].set_transition(t.event.clone(), to);
        }

        let mut graph = Self {
            piece_type,
            states,
            by_name,
            idle,
        };
        graph.apply_fixed_wiring();
        graph.validate()?;
        Ok(graph)
    }

    /// Wiring every piece gets regardless of configuration: the
    /// jump -> short_rest -> idle cycle, invulnerable jumps, and knights that
    /// ignore intermediate cells.
    fn apply_fixed_wiring(&mut self) {
        let idle = self.idle;
        let jump = self.id(JUMP_STATE);
        let short_rest = self.id(SHORT_REST_STATE);

        if let Some(jump) = jump {
            self.states[idle.0].set_transition(JUMP_STATE, jump);
            self.states[jump.0].flags.is_capturable = false;
            if let Some(rest) = short_rest {
                self.states[jump.0].set_transition(DONE_EVENT, rest);
            }
        }
        if let Some(rest) = short_rest {
            self.states[rest.0].set_transition(DONE_EVENT, idle);
        }

        if self.piece_type.kind == PieceKind::Knight {
            if let Some(mv) = self.id(MOVE_STATE) {
                self.states[mv.0].flags.needs_clear_path = false;
            }
        }
    }

    /// Every state must be able to get back to idle
    fn validate(&self) -> Result<()> {
        // Reverse edges, then walk back from idle
        let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); self.states.len()];
        for (from, state) in self.states.iter().enumerate() {
            for (_, to) in state.transitions() {
                incoming[to.0].push(from);
            }
        }

        let mut reaches_idle = vec![false; self.states.len()];
        let mut queue = VecDeque::from([self.idle.0]);
        reaches_idle[self.idle.0] = true;
        while let Some(node) = queue.pop_front() {
            for &prev in &incoming[node] {
                if !reaches_idle[prev] {
                    reaches_idle[prev] = true;
                    queue.push_back(prev);
                }
            }
        }

        let stranded: Vec<&str> = self
            .states
            .iter()
            .zip(&reaches_idle)
            .filter(|(_, ok)| !**ok)
            .map(|(s, _)| s.name.as_str())
            .collect();

        if !stranded.is_empty() {
            return Err(KfcError::Config(format!(
                "{}: states cannot return to idle: {}",
                self.piece_type,
                stranded.join(", ")
            )));
        }

        Ok(())
    }

    pub fn piece_type(&self) -> PieceType {
        self.piece_type
    }

    pub fn idle(&self) -> StateId {
        self.idle
    }

    pub fn id(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: StateId) -> &StateDef {
        &self.states[id.0]
    }

    pub fn by_name(&self, name: &str) -> Option<&StateDef> {
        self.id(name).map(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = &StateDef> {
        self.states.iter()
    }
}
