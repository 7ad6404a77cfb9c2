//! Game session: the scoreboard plus the connection registry.
//!
//! Every inbound message ends up in one of the operations below. Each
//! operation either rejects the message with a [`SessionError`] (the caller
//! logs it and sends nothing) or mutates the session and returns the
//! [`Notice`]s the transport must deliver. Notices carry no payload; the
//! transport renders them from the session after the mutation.
//! [`GameSession::handle`] wraps them in an [`Applied`] that also reports how
//! an answer was scored.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::game::state::{AnswerOutcome, GameState};
use crate::game::types::{ConnectionId, Role, SessionError, TableId, TeacherCommand};
use crate::ws::messages::ClientMessage;

/// Something the transport must send after a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    /// `gameState` to every connection.
    StateToAll,
    /// `gameState` to one connection.
    StateTo(ConnectionId),
    /// `teacherUpdate` to every connection.
    RosterToAll,
    /// `teacherUpdate` to one connection.
    RosterTo(ConnectionId),
}

pub type Notices = Vec<Notice>;

/// A message the session accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Applied {
    pub notices: Notices,
    /// Set for `answerQuestion` only.
    pub outcome: Option<AnswerOutcome>,
}

impl From<Notices> for Applied {
    fn from(notices: Notices) -> Self {
        Applied {
            notices,
            outcome: None,
        }
    }
}

/// Payload of the `teacherUpdate` event.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherUpdate {
    pub connected_tables: BTreeMap<TableId, ConnectionId>,
    pub game_state: GameState,
}

/// The one game a process runs.
#[derive(Debug)]
pub struct GameSession {
    state: GameState,
    /// table → connection currently playing it
    connected_tables: BTreeMap<TableId, ConnectionId>,
    /// connection → role; absent means the connection never spoke
    connections: HashMap<ConnectionId, Role>,
    teacher_password: String,
}

impl GameSession {
    pub fn new(teacher_password: impl Into<String>) -> Self {
        Self {
            state: GameState::new(),
            connected_tables: BTreeMap::new(),
            connections: HashMap::new(),
            teacher_password: teacher_password.into(),
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn connected_tables(&self) -> &BTreeMap<TableId, ConnectionId> {
        &self.connected_tables
    }

    pub fn role(&self, conn: ConnectionId) -> Role {
        self.connections.get(&conn).copied().unwrap_or_default()
    }

    pub fn teacher_update(&self) -> TeacherUpdate {
        TeacherUpdate {
            connected_tables: self.connected_tables.clone(),
            game_state: self.state.clone(),
        }
    }

    // -----------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------

    /// Route one inbound message from `conn`.
    pub fn handle(
        &mut self,
        conn: ConnectionId,
        msg: ClientMessage,
    ) -> Result<Applied, SessionError> {
        match msg {
            ClientMessage::JoinTable(table) => self.join(conn, table).map(Applied::from),
            ClientMessage::JoinAsTeacher(password) => {
                self.join_as_teacher(conn, &password).map(Applied::from)
            }
            ClientMessage::AnswerQuestion(answer) => {
                let (notices, outcome) = self.answer(conn, answer.table, answer.is_correct)?;
                Ok(Applied {
                    notices,
                    outcome: Some(outcome),
                })
            }
            ClientMessage::TeacherCommand(cmd) => {
                self.teacher_command(conn, cmd).map(Applied::from)
            }
            // Pings are answered by the transport.
            ClientMessage::Ping => Ok(Applied::default()),
        }
    }

    // -----------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------

    /// Bind `conn` to `table`. The newest connection wins the table.
    pub fn join(&mut self, conn: ConnectionId, table: TableId) -> Result<Notices, SessionError> {
        match self.role(conn) {
            Role::Teacher => return Err(SessionError::TeacherCannotPlay),
            Role::Player(previous) if previous != table => {
                self.release_table(previous, conn);
            }
            _ => {}
        }

        if let Some(holder) = self.connected_tables.insert(table, conn)
            && holder != conn
        {
            self.connections.insert(holder, Role::Anonymous);
        }
        self.connections.insert(conn, Role::Player(table));

        Ok(vec![Notice::RosterToAll, Notice::StateTo(conn)])
    }

    /// Grant the teacher role iff `password` matches the shared secret.
    pub fn join_as_teacher(
        &mut self,
        conn: ConnectionId,
        password: &str,
    ) -> Result<Notices, SessionError> {
        if password != self.teacher_password {
            return Err(SessionError::InvalidPassword);
        }
        if let Role::Player(table) = self.role(conn) {
            self.release_table(table, conn);
        }
        self.connections.insert(conn, Role::Teacher);
        Ok(vec![Notice::RosterTo(conn)])
    }

    /// Apply an answer for `table` submitted by `conn`.
    pub fn answer(
        &mut self,
        conn: ConnectionId,
        table: TableId,
        is_correct: bool,
    ) -> Result<(Notices, AnswerOutcome), SessionError> {
        if !self.state.is_started() {
            return Err(SessionError::GameNotStarted);
        }
        if self.role(conn) != Role::Player(table) {
            return Err(SessionError::NotBoundToTable { table });
        }

        // Resolved turns and retries both broadcast; only the turn differs.
        let outcome = self.state.record_answer(table, is_correct);
        Ok((vec![Notice::StateToAll], outcome))
    }

    /// Run a console command. Only teacher connections may do this.
    pub fn teacher_command(
        &mut self,
        conn: ConnectionId,
        cmd: TeacherCommand,
    ) -> Result<Notices, SessionError> {
        if !self.role(conn).is_teacher() {
            return Err(SessionError::NotTeacher);
        }
        match cmd {
            TeacherCommand::StartGame => self.state.start(),
            TeacherCommand::ResetGame => self.reset(),
        }
        Ok(vec![Notice::StateToAll, Notice::RosterToAll])
    }

    /// Forget `conn`. Only a player that still holds its table changes the
    /// roster.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Notices {
        let Some(Role::Player(table)) = self.connections.remove(&conn) else {
            return Vec::new();
        };
        if self.release_table(table, conn) {
            vec![Notice::RosterToAll]
        } else {
            Vec::new()
        }
    }

    /// Fresh scoreboard, empty roster. Teachers keep their role so the
    /// console can start the next game; players must join again.
    fn reset(&mut self) {
        self.state = GameState::fresh_round();
        self.connected_tables.clear();
        for role in self.connections.values_mut() {
            if matches!(role, Role::Player(_)) {
                *role = Role::Anonymous;
            }
        }
    }

    /// Drop `table` from the roster if `conn` still holds it.
    fn release_table(&mut self, table: TableId, conn: ConnectionId) -> bool {
        if self.connected_tables.get(&table) == Some(&conn) {
            self.connected_tables.remove(&table);
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{GAME_STARTED_MESSAGE, NEW_GAME_MESSAGE};
    use crate::ws::messages::AnswerPayload;

    const SECRET: &str = "secret";
    const TEACHER: ConnectionId = 100;

    fn table(n: u8) -> TableId {
        TableId::new(n).unwrap()
    }

    /// Session with a logged-in teacher and one player per table; player
    /// connection ids equal their table numbers.
    fn seated_session() -> GameSession {
        let mut s = GameSession::new(SECRET);
        s.join_as_teacher(TEACHER, SECRET).unwrap();
        for t in TableId::all() {
            s.join(u64::from(t.get()), t).unwrap();
        }
        s
    }

    fn started_session() -> GameSession {
        let mut s = seated_session();
        s.teacher_command(TEACHER, TeacherCommand::StartGame).unwrap();
        s
    }

    fn answer(s: &mut GameSession, n: u8, correct: bool) -> Result<Notices, SessionError> {
        s.answer(u64::from(n), table(n), correct).map(|(notices, _)| notices)
    }

    // --- join ---

    #[test]
    fn join_registers_table_and_notifies() {
        let mut s = GameSession::new(SECRET);
        let notices = s.join(7, table(3)).unwrap();
        assert_eq!(notices, vec![Notice::RosterToAll, Notice::StateTo(7)]);
        assert_eq!(s.connected_tables().get(&table(3)), Some(&7));
        assert_eq!(s.role(7), Role::Player(table(3)));
        assert_eq!(s.state().score(table(3)), 0);
    }

    #[test]
    fn join_other_table_releases_previous() {
        let mut s = GameSession::new(SECRET);
        s.join(7, table(3)).unwrap();
        s.join(7, table(4)).unwrap();
        assert!(!s.connected_tables().contains_key(&table(3)));
        assert_eq!(s.connected_tables().get(&table(4)), Some(&7));
    }

    #[test]
    fn newer_connection_takes_over_table() {
        let mut s = GameSession::new(SECRET);
        s.join(1, table(2)).unwrap();
        s.join(9, table(2)).unwrap();
        assert_eq!(s.connected_tables().get(&table(2)), Some(&9));
        assert_eq!(s.role(1), Role::Anonymous);
    }

    #[test]
    fn teacher_cannot_join_table() {
        let mut s = GameSession::new(SECRET);
        s.join_as_teacher(TEACHER, SECRET).unwrap();
        assert_eq!(s.join(TEACHER, table(1)), Err(SessionError::TeacherCannotPlay));
        assert!(s.connected_tables().is_empty());
    }

    // --- joinAsTeacher ---

    #[test]
    fn correct_password_grants_teacher() {
        let mut s = GameSession::new(SECRET);
        let notices = s.join_as_teacher(5, SECRET).unwrap();
        assert_eq!(notices, vec![Notice::RosterTo(5)]);
        assert!(s.role(5).is_teacher());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let mut s = GameSession::new(SECRET);
        assert_eq!(s.join_as_teacher(5, "guess"), Err(SessionError::InvalidPassword));
        assert_eq!(s.role(5), Role::Anonymous);
    }

    #[test]
    fn player_becoming_teacher_releases_table() {
        let mut s = GameSession::new(SECRET);
        s.join(5, table(6)).unwrap();
        s.join_as_teacher(5, SECRET).unwrap();
        assert!(s.connected_tables().is_empty());
    }

    // --- answer ---

    #[test]
    fn answers_ignored_before_start() {
        let mut s = seated_session();
        assert_eq!(answer(&mut s, 2, true), Err(SessionError::GameNotStarted));
        assert_eq!(answer(&mut s, 2, false), Err(SessionError::GameNotStarted));
        assert_eq!(s.state().score(table(2)), 0);
        assert_eq!(s.state().position(table(2)), 0);
        assert_eq!(s.state().attempts(table(2)), 0);
        assert_eq!(s.state().current_turn(), TableId::FIRST);
    }

    #[test]
    fn answer_for_foreign_table_is_rejected() {
        let mut s = started_session();
        let res = s.answer(1, table(2), true);
        assert_eq!(res, Err(SessionError::NotBoundToTable { table: table(2) }));
        assert_eq!(s.state().score(table(2)), 0);
    }

    #[test]
    fn answer_from_teacher_or_stranger_is_rejected() {
        let mut s = started_session();
        assert!(s.answer(TEACHER, table(1), true).is_err());
        assert!(s.answer(999, table(1), true).is_err());
        assert_eq!(s.state().score(table(1)), 0);
    }

    #[test]
    fn correct_answer_scenario() {
        let mut s = started_session();
        let notices = answer(&mut s, 5, true).unwrap();
        assert_eq!(notices, vec![Notice::StateToAll]);
        assert_eq!(s.state().score(table(5)), 1);
        assert_eq!(s.state().position(table(5)), 1);
        assert_eq!(s.state().attempts(table(5)), 0);
        assert_eq!(s.state().current_turn(), table(2));
    }

    #[test]
    fn two_failures_scenario() {
        let mut s = started_session();
        // Bring the turn to table 3.
        answer(&mut s, 1, true).unwrap();
        answer(&mut s, 2, true).unwrap();
        assert_eq!(s.state().current_turn(), table(3));

        let notices = answer(&mut s, 3, false).unwrap();
        assert_eq!(notices, vec![Notice::StateToAll]);
        assert_eq!(s.state().current_turn(), table(3));
        assert_eq!(s.state().attempts(table(3)), 1);

        answer(&mut s, 3, false).unwrap();
        assert_eq!(s.state().position(table(3)), 1);
        assert_eq!(s.state().score(table(3)), 0);
        assert_eq!(s.state().attempts(table(3)), 0);
        assert_eq!(s.state().current_turn(), table(4));
    }

    #[test]
    fn answer_reports_outcome() {
        let mut s = started_session();
        let (_, outcome) = s.answer(1, table(1), true).unwrap();
        assert_eq!(outcome, AnswerOutcome::Scored);

        let (_, outcome) = s.answer(2, table(2), false).unwrap();
        assert_eq!(outcome, AnswerOutcome::Retry { attempts: 1 });
        let (_, outcome) = s.answer(2, table(2), false).unwrap();
        assert_eq!(outcome, AnswerOutcome::ForcedAdvance);
    }

    #[test]
    fn turn_wraps_after_seventh_table() {
        let mut s = started_session();
        for n in 1..=7 {
            answer(&mut s, n, true).unwrap();
        }
        assert_eq!(s.state().current_turn(), TableId::FIRST);
    }

    // --- teacherCommand ---

    #[test]
    fn start_requires_teacher() {
        let mut s = seated_session();
        assert_eq!(
            s.teacher_command(1, TeacherCommand::StartGame),
            Err(SessionError::NotTeacher)
        );
        assert!(!s.state().is_started());

        let notices = s.teacher_command(TEACHER, TeacherCommand::StartGame).unwrap();
        assert_eq!(notices, vec![Notice::StateToAll, Notice::RosterToAll]);
        assert!(s.state().is_started());
        assert_eq!(s.state().log().last().unwrap(), GAME_STARTED_MESSAGE);
    }

    #[test]
    fn reset_requires_teacher() {
        let mut s = started_session();
        answer(&mut s, 1, true).unwrap();
        assert_eq!(
            s.teacher_command(4, TeacherCommand::ResetGame),
            Err(SessionError::NotTeacher)
        );
        assert_eq!(s.state().score(table(1)), 1);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut s = started_session();
        answer(&mut s, 1, true).unwrap();
        answer(&mut s, 2, false).unwrap();
        answer(&mut s, 4, false).unwrap();
        answer(&mut s, 4, false).unwrap();

        s.teacher_command(TEACHER, TeacherCommand::ResetGame).unwrap();

        for t in TableId::all() {
            assert_eq!(s.state().score(t), 0);
            assert_eq!(s.state().position(t), 0);
            assert_eq!(s.state().attempts(t), 0);
        }
        assert_eq!(s.state().current_turn(), TableId::FIRST);
        assert!(!s.state().is_started());
        assert_eq!(s.state().log(), [NEW_GAME_MESSAGE.to_string()]);
        assert!(s.connected_tables().is_empty());
    }

    #[test]
    fn reset_unbinds_players_but_keeps_teacher() {
        let mut s = started_session();
        s.teacher_command(TEACHER, TeacherCommand::ResetGame).unwrap();
        assert_eq!(s.role(1), Role::Anonymous);
        assert!(s.role(TEACHER).is_teacher());

        // Teacher can immediately start the next game; old players must rejoin.
        s.teacher_command(TEACHER, TeacherCommand::StartGame).unwrap();
        assert!(answer(&mut s, 1, true).is_err());
        s.join(1, table(1)).unwrap();
        assert!(answer(&mut s, 1, true).is_ok());
    }

    // --- disconnect ---

    #[test]
    fn disconnect_player_updates_roster() {
        let mut s = seated_session();
        assert_eq!(s.disconnect(3), vec![Notice::RosterToAll]);
        assert!(!s.connected_tables().contains_key(&table(3)));
        assert_eq!(s.connected_tables().len(), 6);
    }

    #[test]
    fn disconnect_non_player_is_silent() {
        let mut s = seated_session();
        assert!(s.disconnect(TEACHER).is_empty());
        assert!(s.disconnect(12345).is_empty());
        assert_eq!(s.connected_tables().len(), 7);
    }

    #[test]
    fn disconnect_of_replaced_holder_keeps_new_holder() {
        let mut s = GameSession::new(SECRET);
        s.join(1, table(2)).unwrap();
        s.join(9, table(2)).unwrap();
        assert!(s.disconnect(1).is_empty());
        assert_eq!(s.connected_tables().get(&table(2)), Some(&9));
    }

    // --- dispatch ---

    #[test]
    fn handle_routes_every_message() {
        let mut s = GameSession::new(SECRET);
        assert!(s.handle(TEACHER, ClientMessage::JoinAsTeacher(SECRET.into())).is_ok());
        assert!(s.handle(1, ClientMessage::JoinTable(table(1))).is_ok());
        assert!(
            s.handle(TEACHER, ClientMessage::TeacherCommand(TeacherCommand::StartGame))
                .is_ok()
        );
        let applied = s
            .handle(
                1,
                ClientMessage::AnswerQuestion(AnswerPayload {
                    table: table(1),
                    is_correct: true,
                }),
            )
            .unwrap();
        assert_eq!(applied.notices, vec![Notice::StateToAll]);
        assert_eq!(applied.outcome, Some(AnswerOutcome::Scored));
        assert_eq!(s.handle(1, ClientMessage::Ping), Ok(Applied::default()));
        assert_eq!(s.state().score(table(1)), 1);
    }

    #[test]
    fn handle_reports_outcome_only_for_answers() {
        let mut s = GameSession::new(SECRET);
        let applied = s.handle(1, ClientMessage::JoinTable(table(1))).unwrap();
        assert_eq!(applied.outcome, None);

        s.join_as_teacher(TEACHER, SECRET).unwrap();
        s.teacher_command(TEACHER, TeacherCommand::StartGame).unwrap();
        let wrong = ClientMessage::AnswerQuestion(AnswerPayload {
            table: table(1),
            is_correct: false,
        });
        let applied = s.handle(1, wrong.clone()).unwrap();
        assert_eq!(applied.outcome, Some(AnswerOutcome::Retry { attempts: 1 }));
        let applied = s.handle(1, wrong).unwrap();
        assert_eq!(applied.outcome, Some(AnswerOutcome::ForcedAdvance));
    }

    #[test]
    fn teacher_update_serializes_roster() {
        let mut s = GameSession::new(SECRET);
        s.join(42, table(3)).unwrap();
        let json = serde_json::to_value(s.teacher_update()).unwrap();
        assert_eq!(json["connectedTables"]["3"], 42);
        assert_eq!(json["gameState"]["currentTurn"], 1);
    }
}
