//! Keepalive pings.
//!
//! Pings are sent at a fixed interval while the socket is open. A missed
//! pong is only observable through [`PluginConnection::last_pong_elapsed`];
//! it never closes the socket or fails pending requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::connection::PluginConnection;
use crate::metrics::BRIDGE_KEEPALIVE_PINGS_TOTAL;

/// Why the keepalive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveResult {
    /// The connection closed.
    Closed,
    /// The server is shutting down.
    Cancelled,
}

/// Ping `connection` every `interval` until it closes or `cancel` fires.
pub async fn run_keepalive(
    connection: Arc<PluginConnection>,
    interval: Duration,
    cancel: CancellationToken,
) -> KeepaliveResult {
    let mut ticker = time::interval(interval);
    let _ = ticker.tick().await; // consume first immediate tick

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !connection.is_open() || !connection.ping() {
                    return KeepaliveResult::Closed;
                }
                metrics::counter!(BRIDGE_KEEPALIVE_PINGS_TOTAL).increment(1);
                trace!(conn_id = %connection.id, since_pong_ms = connection.last_pong_elapsed().as_millis(), "sent ping");
            }
            () = connection.closed() => return KeepaliveResult::Closed,
            () = cancel.cancelled() => return KeepaliveResult::Cancelled,
        }
    }
}
