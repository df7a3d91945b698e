//! Package-level constants.

use std::time::Duration;

/// Bridge version reported in the `welcome` handshake and `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Human-facing product name. The HTTP banner starts with this string and the
/// port-conflict probe looks for [`BANNER_MARKER`] inside it.
pub const PRODUCT_NAME: &str = "F-MCP ATezer Bridge";

/// Substring that identifies a sibling bridge when probing an occupied port.
pub const BANNER_MARKER: &str = "F-MCP";

/// Plain-text body served on `GET /`.
pub const HTTP_BANNER: &str = "F-MCP ATezer Bridge (connect via WebSocket)\n";

/// Preferred port and first port of the reserved range.
pub const DEFAULT_PORT: u16 = 5454;

/// Last port of the reserved range.
pub const PORT_RANGE_END: u16 = 5470;

/// Loopback-only default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Ceiling for a single plugin request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Interval between keepalive pings.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Message returned to callers when no plugin is attached.
pub const PLUGIN_NOT_CONNECTED: &str = "F-MCP ATezer Bridge plugin not connected. Open Figma → Plugins → Development → F-MCP ATezer Bridge, and wait for 'ready' (no debug port needed).";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3, "VERSION must be semver (MAJOR.MINOR.PATCH)");
        for part in parts {
            let _: u32 = part.parse().expect("each semver segment must be a number");
        }
    }

    #[test]
    fn banner_carries_marker() {
        assert!(HTTP_BANNER.contains(BANNER_MARKER));
        assert!(HTTP_BANNER.starts_with(PRODUCT_NAME));
    }

    #[test]
    fn default_port_inside_range() {
        assert!(DEFAULT_PORT <= PORT_RANGE_END);
    }

    #[test]
    fn not_connected_message_is_actionable() {
        assert!(PLUGIN_NOT_CONNECTED.contains("not connected"));
        assert!(PLUGIN_NOT_CONNECTED.contains("Plugins"));
    }
}
