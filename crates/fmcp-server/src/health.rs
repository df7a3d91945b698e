//! `/health` endpoint.

use std::time::Instant;

use fmcp_core::constants::VERSION;
use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` while the listener is up.
    pub status: String,
    /// Seconds since the server was created.
    pub uptime_secs: u64,
    /// Whether a plugin socket is open.
    pub plugin_connected: bool,
    /// Requests awaiting a reply.
    pub pending_requests: usize,
    /// Bound port, `0` before `start()`.
    pub port: u16,
    /// Crate version.
    pub bridge_version: String,
}

/// Build a health response from live state.
pub fn health_check(
    start_time: Instant,
    plugin_connected: bool,
    pending_requests: usize,
    port: u16,
) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        plugin_connected,
        pending_requests,
        port,
        bridge_version: VERSION.into(),
    }
}
