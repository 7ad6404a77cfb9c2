use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::game::session::GameSession;
use crate::ws::WsManager;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    /// The single game. Every inbound message locks it for the whole
    /// handle-and-broadcast step, so mutations and their broadcasts are
    /// strictly ordered.
    pub session: Mutex<GameSession>,
    pub ws: Arc<WsManager>,
    pub config: AppConfig,
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(AppState {
            session: Mutex::new(GameSession::new(config.teacher_password.clone())),
            ws: WsManager::new(),
            config,
            start_time: std::time::Instant::now(),
        })
    }
}
