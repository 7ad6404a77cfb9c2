use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TableId
// ---------------------------------------------------------------------------

/// Number of tables in a classroom game.
pub const TABLE_COUNT: u8 = 7;

/// Failed attempts after which a table is moved ahead without a point.
pub const MAX_ATTEMPTS: u8 = 2;

/// A student table, always in `1..=TABLE_COUNT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TableId(u8);

impl TableId {
    /// The first table, which opens every game.
    pub const FIRST: TableId = TableId(1);

    /// Build a table id, rejecting anything outside `1..=7`.
    pub fn new(n: u8) -> Result<Self, SessionError> {
        if (1..=TABLE_COUNT).contains(&n) {
            Ok(TableId(n))
        } else {
            Err(SessionError::InvalidTable(n))
        }
    }

    /// Raw table number.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The table after this one, wrapping 7 back to 1.
    pub const fn next(self) -> TableId {
        if self.0 >= TABLE_COUNT {
            TableId(1)
        } else {
            TableId(self.0 + 1)
        }
    }

    /// All tables in seating order.
    pub fn all() -> impl Iterator<Item = TableId> {
        (1..=TABLE_COUNT).map(TableId)
    }
}

impl TryFrom<u8> for TableId {
    type Error = SessionError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        TableId::new(n)
    }
}

impl From<TableId> for u8 {
    fn from(t: TableId) -> u8 {
        t.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Connections and roles
// ---------------------------------------------------------------------------

/// Identifier assigned to each live WebSocket connection.
pub type ConnectionId = u64;

/// What a connection is allowed to do. Fixed for the connection's lifetime
/// except for explicit joins and resets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    /// Connected but not yet bound to anything.
    #[default]
    Anonymous,
    /// Plays for exactly one table.
    Player(TableId),
    /// Holds the teacher password.
    Teacher,
}

impl Role {
    /// Table this connection plays for, if any.
    pub fn table(self) -> Option<TableId> {
        match self {
            Role::Player(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_teacher(self) -> bool {
        matches!(self, Role::Teacher)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Anonymous => "anonymous",
            Role::Player(_) => "player",
            Role::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Player(t) => write!(f, "player(table {t})"),
            other => f.write_str(other.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// TeacherCommand
// ---------------------------------------------------------------------------

/// Commands only the teacher console may issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TeacherCommand {
    StartGame,
    ResetGame,
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Reasons an inbound message is dropped. Never sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("game has not started")]
    GameNotStarted,

    #[error("connection is not bound to table {table}")]
    NotBoundToTable { table: TableId },

    #[error("connection does not hold the teacher role")]
    NotTeacher,

    #[error("invalid teacher password")]
    InvalidPassword,

    #[error("teacher connections cannot join a table")]
    TeacherCannotPlay,

    #[error("invalid table number: {0} (expected 1..=7)")]
    InvalidTable(u8),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
