//! The resettable scoreboard: scores, board positions, failed attempts,
//! whose turn it is and the event log.
//!
//! `GameState` is what clients receive as the `gameState` payload. It knows
//! nothing about connections or roles; `GameSession` enforces those before
//! calling into it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::game::types::{MAX_ATTEMPTS, TableId};

pub const WELCOME_MESSAGE: &str = "Welcome to the prehistoric Odyssey!";
pub const NEW_GAME_MESSAGE: &str = "New game started!";
pub const GAME_STARTED_MESSAGE: &str = "🚀 The game has started!";

/// Result of a single answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Correct answer: point scored, table moved ahead, turn passed on.
    Scored,
    /// Second failure: table moved ahead without a point, turn passed on.
    ForcedAdvance,
    /// First failure: same table tries again.
    Retry { attempts: u8 },
}

impl AnswerOutcome {
    /// Whether this outcome ends the table's turn.
    pub fn resolves_turn(self) -> bool {
        !matches!(self, AnswerOutcome::Retry { .. })
    }
}

/// Full scoreboard snapshot, serialized as the `gameState` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    current_turn: TableId,
    scores: BTreeMap<TableId, u32>,
    positions: BTreeMap<TableId, u32>,
    attempts: BTreeMap<TableId, u8>,
    log: Vec<String>,
    game_started: bool,
}

impl GameState {
    /// Scoreboard as it looks when the process starts.
    pub fn new() -> Self {
        Self::with_log_entry(WELCOME_MESSAGE)
    }

    /// Scoreboard after a teacher reset.
    pub fn fresh_round() -> Self {
        Self::with_log_entry(NEW_GAME_MESSAGE)
    }

    fn with_log_entry(entry: &str) -> Self {
        Self {
            current_turn: TableId::FIRST,
            scores: TableId::all().map(|t| (t, 0)).collect(),
            positions: TableId::all().map(|t| (t, 0)).collect(),
            attempts: TableId::all().map(|t| (t, 0)).collect(),
            log: vec![entry.to_string()],
            game_started: false,
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn current_turn(&self) -> TableId {
        self.current_turn
    }

    pub fn score(&self, table: TableId) -> u32 {
        self.scores.get(&table).copied().unwrap_or(0)
    }

    pub fn position(&self, table: TableId) -> u32 {
        self.positions.get(&table).copied().unwrap_or(0)
    }

    pub fn attempts(&self, table: TableId) -> u8 {
        self.attempts.get(&table).copied().unwrap_or(0)
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn is_started(&self) -> bool {
        self.game_started
    }

    // -----------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------

    /// Open the game for answers. Calling it again appends another log entry,
    /// matching what the console shows when the button is pressed twice.
    pub fn start(&mut self) {
        self.game_started = true;
        self.log.push(GAME_STARTED_MESSAGE.to_string());
    }

    /// Apply one answer for `table`. Callers must check that the game has
    /// started and that the requester owns the table.
    pub fn record_answer(&mut self, table: TableId, is_correct: bool) -> AnswerOutcome {
        let outcome = if is_correct {
            *self.scores.entry(table).or_default() += 1;
            *self.positions.entry(table).or_default() += 1;
            self.attempts.insert(table, 0);
            self.log.push(format!(
                "✅ Table {table} answered correctly and moves ahead with 1 point!"
            ));
            AnswerOutcome::Scored
        } else {
            let attempts = self.attempts.entry(table).or_default();
            *attempts += 1;
            if *attempts >= MAX_ATTEMPTS {
                *attempts = 0;
                *self.positions.entry(table).or_default() += 1;
                self.log.push(format!(
                    "❌ Table {table} failed twice and moves ahead without a point."
                ));
                AnswerOutcome::ForcedAdvance
            } else {
                let attempts = *attempts;
                self.log
                    .push(format!("⚠️ Table {table} failed ({attempts}/{MAX_ATTEMPTS})."));
                AnswerOutcome::Retry { attempts }
            }
        };

        if outcome.resolves_turn() {
            self.advance_turn();
        }
        outcome
    }

    /// Pass the turn to the next table, wrapping 7 back to 1.
    pub fn advance_turn(&mut self) {
        self.current_turn = self.current_turn.next();
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
