//! Real-time classroom quiz coordinator.
//!
//! Seven student tables take turns answering questions; a teacher console
//! starts and resets the game. All clients talk to one shared
//! [`game::GameSession`] over WebSocket.

pub mod api;
pub mod config;
pub mod game;
pub mod server;
pub mod ws;
