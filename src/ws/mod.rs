//! WebSocket module — real-time game events for tables and the teacher
//! console.
//!
//! - [`messages`]: Typed inbound messages and outbound events.
//! - [`manager`]: Connection tracking, broadcast and direct send.
//! - [`handler`]: Axum WebSocket upgrade handler.

pub mod handler;
pub mod manager;
pub mod messages;

pub use handler::ws_handler;
pub use manager::WsManager;
pub use messages::{ClientMessage, ServerEvent};
