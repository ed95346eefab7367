//! Game state and the per-tick pipeline
//!
//! Each tick, in order:
//! 1. advance every piece to `now`
//! 2. rebuild the position index
//! 3. drain the command inbox and route commands to pieces
//! 4. resolve collisions (bounces and captures)
//! 5. promote pawns on their last row
//! 6. check the win condition
//!
//! All mutation happens here, on the thread that owns the `Game`.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::{parse_layout, Board};
use crate::command::{command_channel, Command, CommandInbox, CommandKind, CommandSender};
use crate::core::error::{KfcError, Result};
use crate::core::types::{Cell, PieceId, PieceKind, PieceType, Side, TimeMs};
use crate::game::collision::resolve_collisions;
use crate::game::events::{EventBus, GameEvent, Observer, SubscriptionId};
use crate::game::index::PositionIndex;
use crate::game::promotion::promote_pawns;
use crate::game::snapshot::BoardSnapshot;
use crate::piece::{Piece, PieceFactory, Rejection, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Setup,
    Running,
    Over,
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub now_ms: TimeMs,
    pub commands: usize,
    pub rejected: usize,
    pub captures: usize,
    pub bounces: usize,
    pub promotions: usize,
}

pub struct Game {
    factory: PieceFactory,
    /// Arena of active pieces; captured pieces are removed
    pieces: Vec<Piece>,
    by_id: AHashMap<PieceId, usize>,
    index: PositionIndex,
    bus: EventBus,
    sender: CommandSender,
    inbox: CommandInbox,
    phase: GamePhase,
    now_ms: TimeMs,
    ticks: u64,
    rejected: u64,
    ended: bool,
}

impl Game {
    /// Validate the starting position and set up a game in `Setup`
    pub fn new(factory: PieceFactory, pieces: Vec<Piece>) -> Result<Self> {
        validate_setup(&factory, &pieces)?;

        let (sender, inbox) = command_channel();
        let mut game = Self {
            factory,
            by_id: AHashMap::with_capacity(pieces.len()),
            index: PositionIndex::from_pieces(&pieces),
            pieces,
            bus: EventBus::new(),
            sender,
            inbox,
            phase: GamePhase::Setup,
            now_ms: 0,
            ticks: 0,
            rejected: 0,
            ended: false,
        };
        game.reindex_ids();
        Ok(game)
    }

    /// Build the pieces of a text layout and validate them
    pub fn from_layout(factory: PieceFactory, layout: &str) -> Result<Self> {
        let placements = parse_layout(layout)?;
        let pieces = factory.create_layout(&placements, 0)?;
        Self::new(factory, pieces)
    }

    /// A new producer handle for the command inbox
    pub fn commands(&self) -> CommandSender {
        self.sender.clone()
    }

    /// Shortcut for `commands().send(cmd)`
    pub fn submit(&self, command: Command) -> bool {
        self.sender.send(command)
    }

    pub fn subscribe(&mut self, observer: Box<dyn Observer>) -> SubscriptionId {
        self.bus.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Reset every piece to idle at `now_ms` and enter `Running`
    pub fn start(&mut self, now_ms: TimeMs) {
        if self.phase != GamePhase::Setup {
            warn!(phase = ?self.phase, "Game already started");
            return;
        }

        self.now_ms = now_ms;
        for piece in &mut self.pieces {
            piece.reset(now_ms);
        }
        self.index.rebuild(&self.pieces);
        self.phase = GamePhase::Running;

        info!(pieces = self.pieces.len(), "Game started");
        self.bus.notify(&GameEvent::GameStart { timestamp: now_ms });
    }

    /// Run one tick of the pipeline at clock reading `now_ms`
    pub fn tick(&mut self, now_ms: TimeMs) -> TickReport {
        let mut report = TickReport {
            now_ms,
            ..TickReport::default()
        };
        if self.phase != GamePhase::Running {
            return report;
        }

        self.now_ms = now_ms;
        self.ticks += 1;

        for piece in &mut self.pieces {
            piece.update(now_ms);
        }
        self.index.rebuild(&self.pieces);

        for command in self.inbox.drain() {
            report.commands += 1;
            if let Err(rejection) = self.apply_command(&command) {
                report.rejected += 1;
                self.rejected += 1;
                debug!(%command, %rejection, "Command rejected");
            }
        }
        self.index.rebuild(&self.pieces);

        let outcome = resolve_collisions(&mut self.pieces, &self.index, now_ms);
        report.bounces = outcome.bounces.len();
        report.captures = outcome.captures.len();
        if !outcome.captures.is_empty() {
            let captured = outcome.captured_slots();
            let mut slot = 0;
            self.pieces.retain(|_| {
                let keep = !captured.contains(&slot);
                slot += 1;
                keep
            });
            self.reindex_ids();

            for capture in &outcome.captures {
                self.bus.notify(&GameEvent::PieceCaptured {
                    captured_piece_id: capture.piece_id.clone(),
                    captured_type: capture.kind,
                    captured_side: capture.side,
                    captured_by_side: capture.by_side,
                    cell: capture.cell,
                    timestamp: now_ms,
                });
            }
        }

        let promotions = promote_pawns(&mut self.pieces, &self.factory, now_ms);
        report.promotions = promotions.len();
        for promotion in promotions {
            self.by_id.remove(&promotion.pawn_id);
            self.by_id
                .insert(promotion.promoted_id.clone(), promotion.slot);
            self.bus.notify(&GameEvent::PawnPromoted {
                pawn_id: promotion.pawn_id,
                promoted_piece_id: promotion.promoted_id,
                side: promotion.side,
                cell: promotion.cell,
                timestamp: now_ms,
            });
        }

        if report.captures > 0 || report.promotions > 0 {
            self.index.rebuild(&self.pieces);
        }

        if self.king_count() < 2 {
            self.phase = GamePhase::Over;
            info!(winner = ?self.winner(), tick = self.ticks, "Game over");
        }

        report
    }

    /// Route one command to its piece and publish the resulting event
    fn apply_command(&mut self, command: &Command) -> std::result::Result<Transition, Rejection> {
        let slot = *self
            .by_id
            .get(&command.piece_id)
            .ok_or(Rejection::UnknownPiece)?;
        let piece = &mut self.pieces[slot];

        if let Some(player) = command.player {
            if player.side() != piece.side() {
                return Err(Rejection::WrongOwner);
            }
        }
        if !command.is_well_formed() {
            return Err(Rejection::Malformed);
        }

        let transition = piece.on_command(command, &self.index, self.factory.board())?;

        let event = match command.kind {
            CommandKind::Move => Some(GameEvent::Move {
                piece_id: command.piece_id.clone(),
                from_cell: transition.from_cell,
                to_cell: transition.to_cell,
                player: command.player,
                timestamp: command.timestamp_ms,
            }),
            CommandKind::Jump => Some(GameEvent::Jump {
                piece_id: command.piece_id.clone(),
                from_cell: transition.from_cell,
                to_cell: transition.to_cell,
                player: command.player,
                timestamp: command.timestamp_ms,
            }),
            CommandKind::Idle => None,
        };
        if let Some(event) = event {
            self.bus.notify(&event);
        }

        Ok(transition)
    }

    /// Publish `game_end` once. Later calls do nothing.
    ///
    /// The phase only becomes `Over` when fewer than two kings remain; a game
    /// stopped early stays `Running`.
    pub fn finish(&mut self, now_ms: TimeMs) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.now_ms = self.now_ms.max(now_ms);
        if self.king_count() < 2 {
            self.phase = GamePhase::Over;
        }

        let winner = self.winner();
        match winner {
            Some(side) => info!(?side, "Game ended with a winner"),
            None => info!("Game ended without a winner"),
        }
        self.bus.notify(&GameEvent::GameEnd {
            timestamp: self.now_ms,
            winner,
        });
    }

    fn reindex_ids(&mut self) {
        self.by_id.clear();
        for (slot, piece) in self.pieces.iter().enumerate() {
            self.by_id.insert(piece.id().clone(), slot);
        }
    }

    fn king_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| p.kind() == PieceKind::King)
            .count()
    }

    /// Side of the only remaining king, if exactly one remains
    pub fn winner(&self) -> Option<Side> {
        let mut kings = self.pieces.iter().filter(|p| p.kind() == PieceKind::King);
        match (kings.next(), kings.next()) {
            (Some(king), None) => Some(king.side()),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::capture(self.now_ms, &self.pieces, self.factory.board())
    }

    pub fn piece(&self, id: &PieceId) -> Option<&Piece> {
        self.by_id.get(id).map(|&slot| &self.pieces[slot])
    }

    /// First piece whose current cell is `cell`
    pub fn piece_at(&self, cell: Cell) -> Option<&Piece> {
        self.index
            .occupants(cell)
            .first()
            .map(|o| &self.pieces[o.slot])
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn board(&self) -> &Board {
        self.factory.board()
    }

    pub fn factory(&self) -> &PieceFactory {
        &self.factory
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::Over
    }

    /// Clock reading of the last tick
    pub fn now_ms(&self) -> TimeMs {
        self.now_ms
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Commands rejected since the game was created
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.phase)
            .field("pieces", &self.pieces.len())
            .field("now_ms", &self.now_ms)
            .field("ticks", &self.ticks)
            .finish()
    }
}

/// Exactly one king per side, no two same-side pieces on one cell, unique
/// ids, every piece on the board, and a queen available for promotions.
fn validate_setup(factory: &PieceFactory, pieces: &[Piece]) -> Result<()> {
    let board = factory.board();
    let mut seen_cells: AHashMap<(Cell, Side), &PieceId> = AHashMap::new();
    let mut seen_ids: AHashSet<&PieceId> = AHashSet::new();

    for piece in pieces {
        let cell = piece.current_cell();
        if !board.contains(cell) {
            return Err(KfcError::InvalidBoard(format!(
                "{} is off the board at {}",
                piece.id(),
                cell
            )));
        }
        if let Some(other) = seen_cells.insert((cell, piece.side()), piece.id()) {
            return Err(KfcError::InvalidBoard(format!(
                "{} and {} share {}",
                other,
                piece.id(),
                cell
            )));
        }
        if !seen_ids.insert(piece.id()) {
            return Err(KfcError::InvalidBoard(format!("duplicate piece id {}", piece.id())));
        }
    }

    for side in [Side::White, Side::Black] {
        let kings = pieces
            .iter()
            .filter(|p| p.kind() == PieceKind::King && p.side() == side)
            .count();
        if kings != 1 {
            return Err(KfcError::InvalidBoard(format!(
                "expected one {:?} king, found {}",
                side, kings
            )));
        }

        let has_pawns = pieces
            .iter()
            .any(|p| p.kind() == PieceKind::Pawn && p.side() == side);
        let queen = PieceType::new(PieceKind::Queen, side);
        if has_pawns && factory.graph(queen).is_none() {
            return Err(KfcError::Config(format!(
                "{} pawns present but no {} definition to promote to",
                side.code(),
                queen
            )));
        }
    }

    Ok(())
}
