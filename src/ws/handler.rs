//! WebSocket upgrade handler — one socket per table device or teacher
//! console, feeding inbound messages into the shared `GameSession`.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::api::state::SharedState;
use crate::game::session::{Applied, GameSession, Notice, Notices};
use crate::game::types::{ConnectionId, SessionError, TeacherCommand};

use super::manager::WsManager;
use super::messages::{ClientMessage, ServerEvent};

/// GET /ws — upgrade to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Core WebSocket session logic.
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (conn, mut rx) = state.ws.register().await;
    let (mut sink, stream) = socket.split();
    info!(conn, "client connected");

    // Writer task: forward events from the manager → WS sink.
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!(conn, error = %e, "failed to serialize event");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        // Try to close gracefully.
        let _ = sink.close().await;
    });

    // Reader task: handle client → server messages.
    let (stop_tx, stop_rx) = oneshot::channel();
    let mut reader = tokio::spawn(read_loop(stream, state.clone(), conn, stop_rx));

    let writer_done = tokio::select! {
        _ = &mut writer => true,
        _ = &mut reader => false,
    };
    if writer_done {
        // The reader may be mid-message; let it deliver before stopping.
        let _ = stop_tx.send(());
        let _ = reader.await;
    } else {
        writer.abort();
    }

    cleanup(&state, conn).await;
}

/// Feed inbound frames to the session until the client closes or `stop`
/// fires. `stop` is only checked between messages, so a message that has
/// been read is always applied and delivered in full.
async fn read_loop<S>(
    mut stream: S,
    state: SharedState,
    conn: ConnectionId,
    mut stop: oneshot::Receiver<()>,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let msg = tokio::select! {
            biased;
            _ = &mut stop => break,
            next = stream.next() => match next {
                Some(Ok(msg)) => msg,
                _ => break,
            },
        };
        match msg {
            Message::Text(text) => handle_client_message(&state, conn, &text).await,
            Message::Close(_) => break,
            _ => {} // Binary / Ping / Pong handled by Axum
        }
    }
}

/// Process a client-sent text message.
async fn handle_client_message(state: &SharedState, conn: ConnectionId, text: &str) {
    let msg = match ClientMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            // Malformed frames, unknown events and out-of-range tables.
            debug!(conn, error = %e, "invalid WS message");
            return;
        }
    };

    // Pings are answered directly without touching the game.
    if msg == ClientMessage::Ping {
        state.ws.send_to(conn, ServerEvent::pong()).await;
        return;
    }

    let mut session = state.session.lock().await;
    match session.handle(conn, msg.clone()) {
        Ok(applied) => {
            log_applied(conn, &msg, &applied, &session);
            deliver(&state.ws, &session, applied.notices).await;
        }
        Err(SessionError::InvalidPassword) => {
            warn!(conn, "teacher login rejected: invalid password");
        }
        Err(e) => {
            debug!(conn, error = %e, "message dropped");
        }
    }
}

/// Render notices from the session's current state and hand them to the
/// manager. Called with the session lock held so broadcasts keep mutation
/// order.
pub async fn deliver(ws: &WsManager, session: &GameSession, notices: Notices) {
    for notice in notices {
        match notice {
            Notice::StateToAll => {
                ws.broadcast(ServerEvent::GameState(session.state().clone()))
                    .await;
            }
            Notice::StateTo(target) => {
                ws.send_to(target, ServerEvent::GameState(session.state().clone()))
                    .await;
            }
            Notice::RosterToAll => {
                ws.broadcast(ServerEvent::TeacherUpdate(session.teacher_update()))
                    .await;
            }
            Notice::RosterTo(target) => {
                ws.send_to(target, ServerEvent::TeacherUpdate(session.teacher_update()))
                    .await;
            }
        }
    }
}

fn log_applied(
    conn: ConnectionId,
    msg: &ClientMessage,
    applied: &Applied,
    session: &GameSession,
) {
    match msg {
        ClientMessage::JoinTable(table) => info!(conn, %table, "table connected"),
        ClientMessage::JoinAsTeacher(_) => info!(conn, "teacher connected"),
        ClientMessage::AnswerQuestion(answer) => debug!(
            conn,
            table = %answer.table,
            correct = answer.is_correct,
            outcome = ?applied.outcome,
            turn = %session.state().current_turn(),
            "answer applied"
        ),
        ClientMessage::TeacherCommand(TeacherCommand::StartGame) => info!(conn, "game started"),
        ClientMessage::TeacherCommand(TeacherCommand::ResetGame) => info!(conn, "game reset"),
        ClientMessage::Ping => {}
    }
}

/// Remove the connection from the manager and the session. Idempotent.
async fn cleanup(state: &SharedState, conn: ConnectionId) {
    state.ws.unregister(conn).await;
    let mut session = state.session.lock().await;
    let notices = session.disconnect(conn);
    deliver(&state.ws, &session, notices).await;
    info!(conn, "client disconnected");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
