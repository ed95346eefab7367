//! Game loop integration tests

use parking_lot::Mutex;
use std::sync::Arc;

use kungfu_chess::board::Board;
use kungfu_chess::command::Command;
use kungfu_chess::core::types::{Cell, PieceId, PieceKind, Player, Side, TimeMs};
use kungfu_chess::game::*;
use kungfu_chess::piece::{PieceFactory, PieceSet, JUMP_DURATION_MS, SHORT_REST_MS};

/// Keeps every published event
#[derive(Default)]
struct Recorder {
    events: Vec<GameEvent>,
}

impl Observer for Recorder {
    fn on_event(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}

impl Recorder {
    fn named(&self, name: &str) -> Vec<GameEvent> {
        self.events
            .iter()
            .filter(|e| e.name() == name)
            .cloned()
            .collect()
    }
}

fn factory() -> PieceFactory {
    PieceFactory::new(Board::default(), &PieceSet::standard()).unwrap()
}

/// Started game plus a handle on its event history
fn start(layout: &str) -> (Game, Arc<Mutex<Recorder>>) {
    let mut game = Game::from_layout(factory(), layout).unwrap();
    let recorder = Arc::new(Mutex::new(Recorder::default()));
    game.subscribe(Box::new(recorder.clone()));
    game.start(0);
    (game, recorder)
}

/// Tick every 10 ms over `(from, to]`
fn run(game: &mut Game, from: TimeMs, to: TimeMs) {
    let mut now = from;
    while now < to {
        now += 10;
        game.tick(now);
    }
}

fn id(raw: &str) -> PieceId {
    PieceId::from_raw(raw)
}

const ROOK_VS_PAWN: &str = "\
,,,,,,,KB
,,,,,,,
,,,,,,,
,,,,,,,
PB,,,,,,,
,,,,,,,
,,,,,,,
RW,,,,,,,KW
";

#[test]
fn test_capture_removes_piece_once() {
    let (mut game, recorder) = start(ROOK_VS_PAWN);
    game.submit(Command::move_to(
        0,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(4, 0),
        Some(Player::One),
    ));
    game.tick(0);
    run(&mut game, 0, 6000);

    let captures = recorder.lock().named("piece_captured");
    assert_eq!(captures.len(), 1);
    match &captures[0] {
        GameEvent::PieceCaptured {
            captured_piece_id,
            captured_type,
            captured_side,
            captured_by_side,
            cell,
            ..
        } => {
            assert_eq!(captured_piece_id.as_str(), "PB_(4,0)");
            assert_eq!(*captured_type, PieceKind::Pawn);
            assert_eq!(*captured_side, Side::Black);
            assert_eq!(*captured_by_side, Side::White);
            assert_eq!(*cell, Cell::new(4, 0));
        }
        other => panic!("unexpected event {:?}", other),
    }

    assert!(game.piece(&id("PB_(4,0)")).is_none());
    assert_eq!(game.pieces().len(), 3);
    let rook = game.piece(&id("RW_(7,0)")).unwrap();
    assert_eq!(rook.current_cell(), Cell::new(4, 0));
    assert_eq!(rook.state_name(), "idle");
    assert_eq!(game.phase(), GamePhase::Running);
}

#[test]
fn test_move_event_carries_command_fields() {
    let (mut game, recorder) = start(ROOK_VS_PAWN);
    game.submit(Command::move_to(
        0,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(5, 0),
        Some(Player::One),
    ));
    game.tick(20);

    let moves = recorder.lock().named("move");
    assert_eq!(
        moves,
        vec![GameEvent::Move {
            piece_id: id("RW_(7,0)"),
            from_cell: Cell::new(7, 0),
            to_cell: Cell::new(5, 0),
            player: Some(Player::One),
            timestamp: 0,
        }]
    );
}

#[test]
fn test_friendly_arrival_bounces_mover() {
    let layout = "\
,,,,,,,KB
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
,KW,,,,,,
,,,,,,,
RW,,,,,,,
";
    let (mut game, recorder) = start(layout);
    game.submit(Command::move_to(
        0,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(3, 0),
        Some(Player::One),
    ));
    game.submit(Command::move_to(
        0,
        id("KW_(5,1)"),
        Cell::new(5, 1),
        Cell::new(5, 0),
        Some(Player::One),
    ));
    let report = game.tick(0);
    assert_eq!(report.commands, 2);
    assert_eq!(report.rejected, 0);

    let mut bounced_at = None;
    let mut now = 0;
    while now < 3000 {
        now += 10;
        if game.tick(now).bounces > 0 {
            bounced_at = Some(now);
            break;
        }
    }
    assert!(bounced_at.is_some());

    let rook = game.piece(&id("RW_(7,0)")).unwrap();
    assert_eq!(rook.current_cell(), Cell::new(7, 0));
    let king = game.piece(&id("KW_(5,1)")).unwrap();
    assert_eq!(king.current_cell(), Cell::new(5, 0));

    run(&mut game, now, 8000);
    let rook = game.piece(&id("RW_(7,0)")).unwrap();
    assert_eq!(rook.current_cell(), Cell::new(7, 0));
    assert_eq!(rook.state_name(), "idle");

    let recorder = recorder.lock();
    assert!(recorder.named("piece_captured").is_empty());
    assert_eq!(recorder.named("move").len(), 2);
    assert_eq!(game.pieces().len(), 3);
}

#[test]
fn test_same_cell_race_bounces_later_mover() {
    let layout = "\
,,,,,,,KB
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
,,RW,,,,,
,,,,,,,
RW,,,,,,,KW
";
    let (mut game, recorder) = start(layout);
    game.submit(Command::move_to(
        0,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(5, 0),
        Some(Player::One),
    ));
    game.tick(0);
    run(&mut game, 0, 100);

    game.submit(Command::move_to(
        100,
        id("RW_(5,2)"),
        Cell::new(5, 2),
        Cell::new(5, 0),
        Some(Player::One),
    ));
    game.tick(100);
    assert_eq!(game.piece(&id("RW_(5,2)")).unwrap().state_name(), "move");

    run(&mut game, 100, 6000);

    assert!(recorder.lock().named("piece_captured").is_empty());
    let first = game.piece(&id("RW_(7,0)")).unwrap();
    assert_eq!(first.current_cell(), Cell::new(5, 0));
    let second = game.piece(&id("RW_(5,2)")).unwrap();
    assert_eq!(second.current_cell(), Cell::new(5, 2));
    assert_eq!(second.state_name(), "idle");
}

#[test]
fn test_head_on_rooks_later_starter_captures() {
    let layout = "\
,,,,,,,KB
,,,,,,,
,,,,,,,
RB,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
RW,,,,,,,KW
";
    let (mut game, recorder) = start(layout);
    game.submit(Command::move_to(
        0,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(3, 0),
        Some(Player::One),
    ));
    game.tick(0);
    run(&mut game, 0, 500);

    game.submit(Command::move_to(
        500,
        id("RB_(3,0)"),
        Cell::new(3, 0),
        Cell::new(7, 0),
        Some(Player::Two),
    ));
    assert_eq!(game.tick(500).rejected, 0);
    run(&mut game, 500, 2500);

    let captures = recorder.lock().named("piece_captured");
    assert_eq!(
        captures,
        vec![GameEvent::PieceCaptured {
            captured_piece_id: id("RW_(7,0)"),
            captured_type: PieceKind::Rook,
            captured_side: Side::White,
            captured_by_side: Side::Black,
            cell: Cell::new(5, 0),
            timestamp: 2000,
        }]
    );

    run(&mut game, 2500, 8000);
    assert!(game.piece(&id("RW_(7,0)")).is_none());
    let rook = game.piece(&id("RB_(3,0)")).unwrap();
    assert_eq!(rook.current_cell(), Cell::new(7, 0));
    assert_eq!(rook.state_name(), "idle");
    assert_eq!(game.phase(), GamePhase::Running);
}

#[test]
fn test_knight_captures_only_where_it_lands() {
    let layout = "\
,,,,,,,KB
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
,,BB,,,,,
,PB,PB,,,,,
,NW,,,,,,KW
";
    let (mut game, recorder) = start(layout);
    game.submit(Command::move_to(
        0,
        id("NW_(7,1)"),
        Cell::new(7, 1),
        Cell::new(5, 2),
        Some(Player::One),
    ));
    game.tick(0);
    run(&mut game, 0, 5000);

    let captures = recorder.lock().named("piece_captured");
    assert_eq!(captures.len(), 1);
    assert!(matches!(
        &captures[0],
        GameEvent::PieceCaptured { captured_type: PieceKind::Bishop, .. }
    ));
    assert!(game.piece(&id("PB_(6,1)")).is_some());
    assert!(game.piece(&id("PB_(6,2)")).is_some());
    assert_eq!(
        game.piece(&id("NW_(7,1)")).map(|p| p.current_cell()),
        Some(Cell::new(5, 2))
    );
}

#[test]
fn test_pawn_promotes_on_last_row() {
    let layout = "\
,,,,,,,KB
PW,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,KW
";
    let (mut game, recorder) = start(layout);
    game.submit(Command::move_to(
        0,
        id("PW_(1,0)"),
        Cell::new(1, 0),
        Cell::new(0, 0),
        Some(Player::One),
    ));
    game.tick(0);

    let mut promoted_at = None;
    let mut now = 0;
    while now < 2000 {
        now += 10;
        if game.tick(now).promotions > 0 {
            promoted_at = Some(now);
            break;
        }
    }
    assert!(promoted_at.is_some());

    assert!(game.piece(&id("PW_(1,0)")).is_none());
    let queen = game.piece(&id("QW_(0,0)")).unwrap();
    assert_eq!(queen.kind(), PieceKind::Queen);
    assert_eq!(queen.side(), Side::White);
    assert_eq!(queen.state_name(), "idle");
    assert_eq!(queen.current_cell(), Cell::new(0, 0));

    let promotions = recorder.lock().named("pawn_promoted");
    assert_eq!(
        promotions,
        vec![GameEvent::PawnPromoted {
            pawn_id: id("PW_(1,0)"),
            promoted_piece_id: id("QW_(0,0)"),
            side: Side::White,
            cell: Cell::new(0, 0),
            timestamp: now,
        }]
    );

    // The new queen takes commands straight away
    game.submit(Command::move_to(
        now,
        id("QW_(0,0)"),
        Cell::new(0, 0),
        Cell::new(3, 3),
        Some(Player::One),
    ));
    assert_eq!(game.tick(now + 10).rejected, 0);
    assert_eq!(game.piece(&id("QW_(0,0)")).unwrap().state_name(), "move");
}

#[test]
fn test_king_capture_ends_game() {
    let layout = "\
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
KB,,,,,,,
,,,,,,,
,,,,,,,
RW,,,,,,,KW
";
    let (mut game, recorder) = start(layout);
    game.submit(Command::move_to(
        0,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(4, 0),
        Some(Player::One),
    ));
    game.tick(0);

    let mut now = 0;
    while !game.is_over() && now < 5000 {
        now += 10;
        game.tick(now);
    }
    assert!(game.is_over());
    assert_eq!(game.winner(), Some(Side::White));
    assert!(game.piece(&id("KB_(4,0)")).is_none());

    // Nothing moves once the game is over
    let ticks = game.tick_count();
    assert_eq!(game.tick(now + 10), TickReport { now_ms: now + 10, ..TickReport::default() });
    assert_eq!(game.tick_count(), ticks);

    game.finish(now + 10);
    let recorder = recorder.lock();
    let captures = recorder.named("piece_captured");
    assert_eq!(captures.len(), 1);
    assert!(matches!(
        &captures[0],
        GameEvent::PieceCaptured { captured_type: PieceKind::King, captured_side: Side::Black, .. }
    ));
    assert_eq!(
        recorder.named("game_end"),
        vec![GameEvent::GameEnd {
            timestamp: now + 10,
            winner: Some(Side::White),
        }]
    );
}

#[test]
fn test_jump_round_trip_and_immunity() {
    let layout = "\
,,,,,,,KB
,,,,,,,
,,,,,,,
,,,,,,,
QB,,,,,,,
,,,,,,,
,,,,,,,
RW,,,,,,,KW
";
    let (mut game, recorder) = start(layout);
    game.submit(Command::move_to(
        0,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(4, 0),
        Some(Player::One),
    ));
    game.tick(0);
    run(&mut game, 0, 2000);

    game.submit(Command::jump(
        2000,
        id("QB_(4,0)"),
        Cell::new(4, 0),
        Cell::new(4, 0),
        Some(Player::Two),
    ));
    game.tick(2000);
    assert_eq!(game.piece(&id("QB_(4,0)")).unwrap().state_name(), "jump");
    assert_eq!(recorder.lock().named("jump").len(), 1);

    // The rook reaches the queen's cell mid-jump without taking it
    run(&mut game, 2000, 2000 + JUMP_DURATION_MS - 10);
    assert_eq!(
        game.piece(&id("RW_(7,0)")).map(|p| p.current_cell()),
        Some(Cell::new(4, 0))
    );
    assert!(recorder.lock().named("piece_captured").is_empty());
    assert!(game.piece(&id("QB_(4,0)")).is_some());
}

#[test]
fn test_jump_in_place_returns_to_idle() {
    let (mut game, _) = start(ROOK_VS_PAWN);
    game.submit(Command::jump(
        0,
        id("KB_(0,7)"),
        Cell::new(0, 7),
        Cell::new(0, 7),
        Some(Player::Two),
    ));
    game.tick(0);
    assert_eq!(game.piece(&id("KB_(0,7)")).unwrap().state_name(), "jump");

    game.tick(JUMP_DURATION_MS);
    assert_eq!(game.piece(&id("KB_(0,7)")).unwrap().state_name(), "short_rest");

    game.tick(JUMP_DURATION_MS + SHORT_REST_MS);
    let king = game.piece(&id("KB_(0,7)")).unwrap();
    assert_eq!(king.state_name(), "idle");
    assert_eq!(king.current_cell(), Cell::new(0, 7));
}

#[test]
fn test_idle_command_changes_nothing() {
    let (mut game, recorder) = start(ROOK_VS_PAWN);
    let before = game.piece(&id("RW_(7,0)")).unwrap().clone();
    game.submit(Command::idle(
        5,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Some(Player::One),
    ));
    let report = game.tick(10);
    assert_eq!(report.commands, 1);

    let after = game.piece(&id("RW_(7,0)")).unwrap();
    assert_eq!(after.state_name(), before.state_name());
    assert_eq!(after.start_ms(), before.start_ms());
    assert_eq!(after.current_cell(), before.current_cell());
    // Only game_start was published
    assert_eq!(recorder.lock().events.len(), 1);
}

#[test]
fn test_foreign_piece_command_rejected() {
    let (mut game, recorder) = start(ROOK_VS_PAWN);
    game.submit(Command::move_to(
        0,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(5, 0),
        Some(Player::Two),
    ));
    let report = game.tick(10);
    assert_eq!(report.rejected, 1);
    assert_eq!(game.piece(&id("RW_(7,0)")).unwrap().state_name(), "idle");
    assert!(recorder.lock().named("move").is_empty());

    // Without a player the ownership check is skipped
    game.submit(Command::move_to(
        10,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(5, 0),
        None,
    ));
    assert_eq!(game.tick(20).rejected, 0);
    assert_eq!(game.piece(&id("RW_(7,0)")).unwrap().state_name(), "move");
}

#[test]
fn test_blocked_path_rejected() {
    let layout = "\
,,,,,,,KB
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
PW,,,,,,,
,,,,,,,
RW,,,,,,,KW
";
    let (mut game, _) = start(layout);
    game.submit(Command::move_to(
        0,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(3, 0),
        Some(Player::One),
    ));
    game.submit(Command::move_to(
        0,
        id("RW_(7,0)"),
        Cell::new(7, 0),
        Cell::new(5, 0),
        Some(Player::One),
    ));
    let report = game.tick(0);
    assert_eq!(report.rejected, 2);
    assert_eq!(game.piece(&id("RW_(7,0)")).unwrap().state_name(), "idle");
}
