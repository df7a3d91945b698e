//! Prometheus metrics recorder and `/metrics` rendering.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

/// Install the global Prometheus recorder.
///
/// Returns `None` if a recorder is already installed; metrics then flow to
/// that recorder and `/metrics` answers 404.
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("prometheus metrics recorder installed");
            Some(handle)
        }
        Err(error) => {
            warn!(%error, "metrics recorder not installed");
            None
        }
    }
}

/// Render Prometheus text format.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

/// Settled bridge requests (counter, labels: outcome).
pub const BRIDGE_REQUESTS_TOTAL: &str = "bridge_requests_total";
/// Send-to-settlement time (histogram).
pub const BRIDGE_REQUEST_DURATION_SECONDS: &str = "bridge_request_duration_seconds";
/// Requests awaiting a reply (gauge).
pub const BRIDGE_PENDING_REQUESTS: &str = "bridge_pending_requests";
/// Plugin sockets accepted (counter).
pub const PLUGIN_CONNECTIONS_TOTAL: &str = "plugin_connections_total";
/// Plugin sockets closed or replaced (counter).
pub const PLUGIN_DISCONNECTIONS_TOTAL: &str = "plugin_disconnections_total";
/// Inbound frames that failed to parse (counter).
pub const BRIDGE_MALFORMED_FRAMES_TOTAL: &str = "bridge_malformed_frames_total";
/// Keepalive pings sent (counter).
pub const BRIDGE_KEEPALIVE_PINGS_TOTAL: &str = "bridge_keepalive_pings_total";
