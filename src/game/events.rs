//! Game events and the publish/subscribe bus
//!
//! The game loop publishes events; observers react. Observers only ever see
//! `&GameEvent` values, never live pieces.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::types::{Cell, PieceId, PieceKind, Player, Side, TimeMs};

/// Something observable that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    GameStart {
        timestamp: TimeMs,
    },
    GameEnd {
        timestamp: TimeMs,
        winner: Option<Side>,
    },
    Move {
        piece_id: PieceId,
        from_cell: Cell,
        to_cell: Cell,
        player: Option<Player>,
        timestamp: TimeMs,
    },
    Jump {
        piece_id: PieceId,
        from_cell: Cell,
        to_cell: Cell,
        player: Option<Player>,
        timestamp: TimeMs,
    },
    PieceCaptured {
        captured_piece_id: PieceId,
        captured_type: PieceKind,
        captured_side: Side,
        captured_by_side: Side,
        cell: Cell,
        timestamp: TimeMs,
    },
    PawnPromoted {
        pawn_id: PieceId,
        promoted_piece_id: PieceId,
        side: Side,
        cell: Cell,
        timestamp: TimeMs,
    },
}

impl GameEvent {
    /// Wire name, same as the serde tag
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::GameStart { .. } => "game_start",
            GameEvent::GameEnd { .. } => "game_end",
            GameEvent::Move { .. } => "move",
            GameEvent::Jump { .. } => "jump",
            GameEvent::PieceCaptured { .. } => "piece_captured",
            GameEvent::PawnPromoted { .. } => "pawn_promoted",
        }
    }

    pub fn timestamp(&self) -> TimeMs {
        match self {
            GameEvent::GameStart { timestamp }
            | GameEvent::GameEnd { timestamp, .. }
            | GameEvent::Move { timestamp, .. }
            | GameEvent::Jump { timestamp, .. }
            | GameEvent::PieceCaptured { timestamp, .. }
            | GameEvent::PawnPromoted { timestamp, .. } => *timestamp,
        }
    }
}

/// Passive consumer of game events. Must return quickly.
pub trait Observer: Send {
    fn on_event(&mut self, event: &GameEvent);
}

/// Shared observers stay readable by whoever holds the other handle
impl<O: Observer> Observer for Arc<Mutex<O>> {
    fn on_event(&mut self, event: &GameEvent) {
        self.lock().on_event(event);
    }
}

/// Handle returned by `EventBus::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Delivers events to observers in registration order
#[derive(Default)]
pub struct EventBus {
    observers: Vec<(SubscriptionId, Box<dyn Observer>)>,
    next_id: u64,
    published: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn Observer>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    pub fn notify(&mut self, event: &GameEvent) {
        self.published += 1;
        for (_, observer) in &mut self.observers {
            observer.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Events published since creation
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .field("published", &self.published)
            .finish()
    }
}
