use serde::Serialize;

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
    /// Live WebSocket connections.
    pub connections: usize,
    /// Tables currently bound to a device.
    pub tables_online: usize,
}
