//! Input producers - turn player intent into commands
//!
//! Producers never touch pieces; they read snapshots and push commands.

pub mod bot;
pub mod controller;

pub use bot::RandomBot;
pub use controller::{PlayerAction, PlayerController};
