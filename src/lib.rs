//! Kung-Fu Chess - real-time chess where every piece moves on its own clock

pub mod board;
pub mod command;
pub mod core;
pub mod game;
pub mod input;
pub mod piece;
