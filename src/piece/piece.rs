//! A piece: identity plus the active state of its machine

use std::sync::Arc;

use crate::board::Board;
use crate::command::{Command, CommandKind};
use crate::core::types::{Cell, PieceId, PieceKind, PieceType, PixelPos, Side, TimeMs};
use crate::game::index::PositionIndex;
use crate::piece::graph::StateGraph;
use crate::piece::physics::Physics;
use crate::piece::state::{CommandContext, Rejection, StateDef, StateId, DONE_EVENT};

/// Upper bound on timed transitions followed in one update
const MAX_CHAINED_TRANSITIONS: usize = 8;

/// A state change caused by a command
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from_state: StateId,
    pub to_state: StateId,
    pub from_cell: Cell,
    pub to_cell: Cell,
}

#[derive(Debug, Clone)]
pub struct Piece {
    id: PieceId,
    graph: Arc<StateGraph>,
    state: StateId,
    physics: Physics,
    /// Cell the current action chain started from; reset on return to idle
    origin: Cell,
}

impl Piece {
    /// New piece resting in `idle` at `cell`
    pub fn new(id: PieceId, graph: Arc<StateGraph>, cell: Cell, now_ms: TimeMs) -> Self {
        let idle = graph.idle();
        let physics = Self::physics_for(graph.get(idle), cell, cell, now_ms);
        Self {
            id,
            graph,
            state: idle,
            physics,
            origin: cell,
        }
    }

    fn physics_for(state: &StateDef, start: Cell, end: Cell, start_ms: TimeMs) -> Physics {
        Physics::new(state.model, state.flags, start, end, start_ms)
    }

    fn enter(&mut self, target: StateId, start: Cell, end: Cell, start_ms: TimeMs) {
        self.state = target;
        self.physics = Self::physics_for(self.graph.get(target), start, end, start_ms);
    }

    /// Feed a command into the state machine.
    ///
    /// On success the piece has switched to a new state whose physics start at
    /// the command's timestamp. On rejection nothing changes.
    pub fn on_command(
        &mut self,
        cmd: &Command,
        index: &PositionIndex,
        board: &Board,
    ) -> Result<Transition, Rejection> {
        let current = self.graph.get(self.state);
        let target_id = current
            .transition(cmd.kind.event_name())
            .ok_or(Rejection::NoTransition)?;
        let target = self.graph.get(target_id);

        let from = self.current_cell();
        let ctx = CommandContext {
            piece_id: &self.id,
            side: self.side(),
            from,
            index,
            board,
        };
        let dest = current.check_command(target, cmd, &ctx)?;

        let from_state = self.state;
        if from_state == self.graph.idle() {
            self.origin = from;
        }
        self.enter(target_id, from, dest, cmd.timestamp_ms);
        self.physics.update(cmd.timestamp_ms);

        Ok(Transition {
            from_state,
            to_state: target_id,
            from_cell: from,
            to_cell: dest,
        })
    }

    /// Advance physics to `now_ms`, following `done` transitions of expired
    /// states. Returns true if the state changed.
    pub fn update(&mut self, now_ms: TimeMs) -> bool {
        self.physics.update(now_ms);

        let mut changed = false;
        for _ in 0..MAX_CHAINED_TRANSITIONS {
            if !self.physics.is_finished() {
                break;
            }
            let Some(next) = self.state_def().transition(DONE_EVENT) else {
                break;
            };

            let cell = self.physics.end_cell();
            let started = self.physics.finish_ms().unwrap_or(now_ms);
            self.enter(next, cell, cell, started);
            if next == self.graph.idle() {
                self.origin = cell;
            }
            self.physics.update(now_ms);
            changed = true;
        }
        changed
    }

    /// Put the piece back in `idle` where it stands
    pub fn reset(&mut self, now_ms: TimeMs) {
        let cell = self.current_cell();
        let idle = self.graph.idle();
        self.enter(idle, cell, cell, now_ms);
        self.origin = cell;
    }

    /// Send the piece back to the cell its current action started from.
    ///
    /// The piece keeps its state and restarts that state's physics pinned to
    /// the origin cell, so it finishes the state there.
    pub fn return_to_start(&mut self, now_ms: TimeMs) {
        let start = self.origin;
        self.physics = Self::physics_for(self.state_def(), start, start, now_ms);
        self.physics.update(now_ms);
    }

    pub fn id(&self) -> &PieceId {
        &self.id
    }

    pub fn piece_type(&self) -> PieceType {
        self.graph.piece_type()
    }

    pub fn kind(&self) -> PieceKind {
        self.graph.piece_type().kind
    }

    pub fn side(&self) -> Side {
        self.graph.piece_type().side
    }

    pub fn state_id(&self) -> StateId {
        self.state
    }

    pub fn state_def(&self) -> &StateDef {
        self.graph.get(self.state)
    }

    pub fn state_name(&self) -> &str {
        &self.state_def().name
    }

    /// Asset key of the active state, `<type>/<asset>`
    pub fn asset_key(&self) -> String {
        format!("{}/{}", self.piece_type(), self.state_def().asset)
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn current_cell(&self) -> Cell {
        self.physics.current_cell()
    }

    pub fn start_cell(&self) -> Cell {
        self.physics.start_cell()
    }

    pub fn end_cell(&self) -> Cell {
        self.physics.end_cell()
    }

    pub fn start_ms(&self) -> TimeMs {
        self.physics.start_ms()
    }

    pub fn origin(&self) -> Cell {
        self.origin
    }

    /// Away from the cell the current action chain started on
    pub fn has_left_origin(&self) -> bool {
        self.current_cell() != self.origin
    }

    /// Mid-action away from the cell it started on
    pub fn is_moving(&self) -> bool {
        self.current_cell() != self.start_cell()
    }

    pub fn needs_clear_path(&self) -> bool {
        self.physics.needs_clear_path()
    }

    pub fn is_blocker(&self) -> bool {
        self.physics.is_blocker()
    }

    pub fn is_capturable(&self) -> bool {
        self.physics.is_capturable()
    }

    pub fn pos_px(&self, board: &Board) -> PixelPos {
        self.physics.pos_px(board)
    }

    /// Is this command kind something the piece could accept right now?
    pub fn accepts(&self, kind: CommandKind) -> bool {
        self.state_def().transition(kind.event_name()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Player;
    use crate::piece::factory::{PieceFactory, PieceSet};
    use crate::piece::constants::{JUMP_DURATION_MS, LONG_REST_MS, MOVE_MS_PER_CELL, SHORT_REST_MS};

    fn factory() -> PieceFactory {
        PieceFactory::new(Board::default(), &PieceSet::standard()).unwrap()
    }

    fn piece(code: &str, cell: Cell) -> Piece {
        let t = PieceType::parse(code).unwrap();
        factory().create_piece(t, cell, 0).unwrap()
    }

    #[test]
    fn test_starts_idle() {
        let p = piece("RW", Cell::new(7, 0));
        assert_eq!(p.state_name(), "idle");
        assert_eq!(p.id().as_str(), "RW_(7,0)");
        assert_eq!(p.current_cell(), Cell::new(7, 0));
        assert_eq!(p.asset_key(), "RW/idle");
        assert!(p.is_capturable());
    }

    #[test]
    fn test_move_then_rest_then_idle() {
        let board = Board::default();
        let mut p = piece("RW", Cell::new(7, 0));
        let index = PositionIndex::new();
        let cmd = Command::move_to(100, p.id().clone(), Cell::new(7, 0), Cell::new(5, 0), Some(Player::One));

        let t = p.on_command(&cmd, &index, &board).unwrap();
        assert_eq!(t.from_cell, Cell::new(7, 0));
        assert_eq!(t.to_cell, Cell::new(5, 0));
        assert_eq!(p.state_name(), "move");

        let arrive = 100 + 2 * MOVE_MS_PER_CELL;
        assert!(p.update(arrive));
        assert_eq!(p.state_name(), "long_rest");
        assert_eq!(p.current_cell(), Cell::new(5, 0));
        assert_eq!(p.start_ms(), arrive);

        assert!(p.update(arrive + LONG_REST_MS));
        assert_eq!(p.state_name(), "idle");
        assert_eq!(p.current_cell(), Cell::new(5, 0));
    }

    #[test]
    fn test_jump_round_trip_without_commands() {
        let board = Board::default();
        let mut p = piece("NB", Cell::new(0, 1));
        let index = PositionIndex::new();
        let cmd = Command::jump(0, p.id().clone(), Cell::new(0, 1), Cell::new(0, 1), Some(Player::Two));
        p.on_command(&cmd, &index, &board).unwrap();
        assert_eq!(p.state_name(), "jump");
        assert!(!p.is_capturable());

        p.update(JUMP_DURATION_MS);
        assert_eq!(p.state_name(), "short_rest");
        assert!(p.is_capturable());

        p.update(JUMP_DURATION_MS + SHORT_REST_MS);
        assert_eq!(p.state_name(), "idle");
    }

    #[test]
    fn test_large_gap_chains_transitions() {
        let board = Board::default();
        let mut p = piece("KW", Cell::new(7, 4));
        let index = PositionIndex::new();
        let cmd = Command::jump(0, p.id().clone(), Cell::new(7, 4), Cell::new(7, 4), None);
        p.on_command(&cmd, &index, &board).unwrap();

        assert!(p.update(1_000_000));
        assert_eq!(p.state_name(), "idle");
    }

    #[test]
    fn test_idle_command_is_noop() {
        let board = Board::default();
        let mut p = piece("QW", Cell::new(7, 3));
        let index = PositionIndex::new();
        let cmd = Command::idle(5, p.id().clone(), Cell::new(7, 3), Some(Player::One));
        assert_eq!(p.on_command(&cmd, &index, &board), Err(Rejection::NoTransition));
        assert_eq!(p.state_name(), "idle");
        assert_eq!(p.start_ms(), 0);
    }

    #[test]
    fn test_commands_ignored_while_resting() {
        let board = Board::default();
        let mut p = piece("RW", Cell::new(7, 0));
        let index = PositionIndex::new();
        let first = Command::move_to(0, p.id().clone(), Cell::new(7, 0), Cell::new(6, 0), None);
        p.on_command(&first, &index, &board).unwrap();
        p.update(MOVE_MS_PER_CELL);
        assert_eq!(p.state_name(), "long_rest");

        let second = Command::move_to(MOVE_MS_PER_CELL + 1, p.id().clone(), Cell::new(6, 0), Cell::new(5, 0), None);
        assert_eq!(p.on_command(&second, &index, &board), Err(Rejection::NoTransition));
    }

    #[test]
    fn test_return_to_start() {
        let board = Board::default();
        let mut p = piece("RW", Cell::new(7, 0));
        let index = PositionIndex::new();
        let cmd = Command::move_to(0, p.id().clone(), Cell::new(7, 0), Cell::new(3, 0), None);
        p.on_command(&cmd, &index, &board).unwrap();
        p.update(2 * MOVE_MS_PER_CELL);
        assert_eq!(p.current_cell(), Cell::new(5, 0));
        assert!(p.is_moving());

        p.return_to_start(2 * MOVE_MS_PER_CELL);
        assert_eq!(p.state_name(), "move");
        assert_eq!(p.current_cell(), Cell::new(7, 0));
        assert_eq!(p.end_cell(), Cell::new(7, 0));
        assert!(!p.is_moving());

        p.update(2 * MOVE_MS_PER_CELL + 1);
        assert_eq!(p.state_name(), "long_rest");
        assert_eq!(p.current_cell(), Cell::new(7, 0));
    }

    #[test]
    fn test_return_to_start_after_arrival() {
        let board = Board::default();
        let mut p = piece("RW", Cell::new(7, 0));
        let index = PositionIndex::new();
        let cmd = Command::move_to(0, p.id().clone(), Cell::new(7, 0), Cell::new(5, 0), None);
        p.on_command(&cmd, &index, &board).unwrap();

        // One coarse step lands the piece and starts its rest
        p.update(2 * MOVE_MS_PER_CELL + 10);
        assert_eq!(p.state_name(), "long_rest");
        assert_eq!(p.origin(), Cell::new(7, 0));
        assert!(p.has_left_origin());
        assert!(!p.is_moving());

        p.return_to_start(2 * MOVE_MS_PER_CELL + 10);
        assert_eq!(p.current_cell(), Cell::new(7, 0));
        assert!(!p.has_left_origin());

        p.update(10 * MOVE_MS_PER_CELL);
        assert_eq!(p.state_name(), "idle");
        assert_eq!(p.origin(), Cell::new(7, 0));
    }
}
