//! Command channel between input producers and the game loop
//!
//! Producers on any thread or task hold a cloned `CommandSender`. The loop owns
//! the single `CommandInbox` and drains it without waiting once per tick.

use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::command::Command;

/// Create a connected sender/inbox pair
pub fn command_channel() -> (CommandSender, CommandInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, CommandInbox { rx })
}

/// Producer handle. Sending never blocks.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    /// Enqueue a command. Returns false once the game loop has gone away.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the game loop
#[derive(Debug)]
pub struct CommandInbox {
    rx: mpsc::UnboundedReceiver<Command>,
}

impl CommandInbox {
    /// Take everything currently queued, in FIFO order, without waiting for more
    pub fn drain(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(command) => commands.push(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return commands,
            }
        }
    }
}
