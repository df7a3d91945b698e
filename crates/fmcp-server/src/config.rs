//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use fmcp_core::constants::{DEFAULT_HOST, KEEPALIVE_INTERVAL, REQUEST_TIMEOUT};
use fmcp_settings::{BridgeSettings, PortPolicySetting};

/// What to do when the preferred port is taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PortPolicy {
    /// Probe the occupant and refuse to start with a diagnostic.
    #[default]
    FailFast,
    /// Try each following port up to the range end.
    ScanForward,
}

impl From<PortPolicySetting> for PortPolicy {
    fn from(setting: PortPolicySetting) -> Self {
        match setting {
            PortPolicySetting::FailFast => Self::FailFast,
            PortPolicySetting::Scan => Self::ScanForward,
        }
    }
}

/// Configuration for the bridge server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Preferred port (default `0` for auto-assign).
    pub port: u16,
    /// Conflict handling.
    pub port_policy: PortPolicy,
    /// Last port tried by [`PortPolicy::ScanForward`].
    pub port_range_end: u16,
    /// Per-request ceiling.
    pub request_timeout: Duration,
    /// Keepalive ping interval.
    pub keepalive_interval: Duration,
    /// Outbound queue depth per connection.
    pub max_send_queue: usize,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
    /// How long `stop()` waits for background tasks.
    pub shutdown_timeout: Duration,
    /// NDJSON audit log destination.
    pub audit_log_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: 0,
            port_policy: PortPolicy::FailFast,
            port_range_end: 0,
            request_timeout: REQUEST_TIMEOUT,
            keepalive_interval: KEEPALIVE_INTERVAL,
            max_send_queue: 1024,
            max_message_size: 64 * 1024 * 1024, // 64 MB
            shutdown_timeout: Duration::from_secs(5),
            audit_log_path: None,
        }
    }
}

impl ServerConfig {
    /// Map loaded settings onto the runtime config.
    pub fn from_settings(settings: &BridgeSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            port_policy: settings.port_policy.into(),
            port_range_end: settings.port_range_end,
            request_timeout: settings.request_timeout(),
            keepalive_interval: settings.keepalive_interval(),
            audit_log_path: settings.audit_log_path.clone(),
            ..Self::default()
        }
    }
}
