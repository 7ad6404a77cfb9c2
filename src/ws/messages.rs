//! WebSocket wire protocol.
//!
//! Every frame is a JSON text message of the form
//! `{"type": "<event>", "payload": <data>}`; events without data omit
//! `payload`.

use serde::{Deserialize, Serialize};

use crate::game::session::TeacherUpdate;
use crate::game::state::GameState;
use crate::game::types::{TableId, TeacherCommand};

// ---------------------------------------------------------------------------
// Server → Client events
// ---------------------------------------------------------------------------

/// Events pushed from the server to connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full scoreboard snapshot.
    GameState(GameState),
    /// Roster of connected tables plus the scoreboard, for the console.
    TeacherUpdate(TeacherUpdate),
    Pong(PongPayload),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PongPayload {
    pub timestamp: u64,
}

impl ServerEvent {
    pub fn pong() -> Self {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        ServerEvent::Pong(PongPayload { timestamp: ts })
    }

    /// Event name as it appears in the `type` field.
    #[cfg(test)]
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::GameState(_) => "gameState",
            ServerEvent::TeacherUpdate(_) => "teacherUpdate",
            ServerEvent::Pong(_) => "pong",
        }
    }

    /// Serialize to JSON text for sending over WebSocket.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Client → Server messages
// ---------------------------------------------------------------------------

/// Messages sent from clients to the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientMessage {
    /// A student device claims a table.
    JoinTable(TableId),
    /// The console logs in with the shared password.
    JoinAsTeacher(String),
    AnswerQuestion(AnswerPayload),
    TeacherCommand(TeacherCommand),
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub table: TableId,
    pub is_correct: bool,
}

impl ClientMessage {
    /// Parse a text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
