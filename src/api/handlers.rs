use axum::Json;
use axum::extract::State;

use crate::game::state::GameState;

use super::models::HealthResponse;
use super::state::SharedState;

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    let connections = state.ws.connection_count().await;
    let tables_online = state.session.lock().await.connected_tables().len();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime,
        connections,
        tables_online,
    })
}

// =========================================================================
// Game state
// =========================================================================

/// GET /api/state — read-only scoreboard snapshot, same shape as the
/// `gameState` WebSocket payload.
pub async fn game_state(State(state): State<SharedState>) -> Json<GameState> {
    let session = state.session.lock().await;
    Json(session.state().clone())
}

// =========================================================================
// Tests
// =========================================================================
