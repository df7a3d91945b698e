//! Bridge settings.

use std::path::PathBuf;
use std::time::Duration;

use fmcp_core::constants::{
    DEFAULT_HOST, DEFAULT_PORT, KEEPALIVE_INTERVAL, PORT_RANGE_END, REQUEST_TIMEOUT,
};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// What to do when the configured port is taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortPolicySetting {
    /// Probe the occupant and refuse to start.
    #[default]
    FailFast,
    /// Try the following ports up to `portRangeEnd`.
    Scan,
}

impl PortPolicySetting {
    /// Parse the env-var spelling. Accepts `failFast`/`fail-fast` and `scan`/`scanForward`.
    pub fn parse(val: &str) -> Option<Self> {
        match val.to_ascii_lowercase().as_str() {
            "failfast" | "fail-fast" | "fail_fast" => Some(Self::FailFast),
            "scan" | "scanforward" | "scan-forward" | "scan_forward" => Some(Self::Scan),
            _ => None,
        }
    }
}

/// Everything the bridge reads at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeSettings {
    /// Bind address. Loopback unless deliberately changed.
    pub host: String,
    /// Preferred port.
    pub port: u16,
    /// Conflict handling.
    pub port_policy: PortPolicySetting,
    /// Last port tried by the scan policy.
    pub port_range_end: u16,
    /// NDJSON audit log. Disabled when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_log_path: Option<PathBuf>,
    /// Per-request ceiling in milliseconds.
    pub request_timeout_ms: u64,
    /// Keepalive ping interval in milliseconds.
    pub keepalive_interval_ms: u64,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            port_policy: PortPolicySetting::default(),
            port_range_end: PORT_RANGE_END,
            audit_log_path: None,
            request_timeout_ms: millis(REQUEST_TIMEOUT),
            keepalive_interval_ms: millis(KEEPALIVE_INTERVAL),
            log_level: "info".to_string(),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl BridgeSettings {
    /// Request ceiling as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Keepalive interval as a [`Duration`].
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    /// Reject combinations the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SettingsError::InvalidValue("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(SettingsError::InvalidValue("port must be between 1 and 65535".into()));
        }
        if self.port_range_end < self.port {
            return Err(SettingsError::PortRange {
                port: self.port,
                end: self.port_range_end,
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "requestTimeoutMs must be greater than 0".into(),
            ));
        }
        if self.keepalive_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "keepaliveIntervalMs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults() {
        let s = BridgeSettings::default();
        assert_eq!(s.host, "127.0.0.1");
        assert_eq!(s.port, 5454);
        assert_eq!(s.port_range_end, 5470);
        assert_eq!(s.port_policy, PortPolicySetting::FailFast);
        assert_eq!(s.request_timeout(), Duration::from_secs(120));
        assert_eq!(s.keepalive_interval(), Duration::from_secs(15));
        assert!(s.audit_log_path.is_none());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn serde_is_camel_case() {
        let json = serde_json::to_value(BridgeSettings::default()).unwrap();
        assert_eq!(json["portPolicy"], "failFast");
        assert_eq!(json["requestTimeoutMs"], 120_000);
        assert!(json.get("auditLogPath").is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s: BridgeSettings = serde_json::from_str(r#"{"port": 6000, "portRangeEnd": 6010}"#).unwrap();
        assert_eq!(s.port, 6000);
        assert_eq!(s.host, "127.0.0.1");
    }

    #[test]
    fn policy_parse() {
        assert_eq!(PortPolicySetting::parse("failFast"), Some(PortPolicySetting::FailFast));
        assert_eq!(PortPolicySetting::parse("fail-fast"), Some(PortPolicySetting::FailFast));
        assert_eq!(PortPolicySetting::parse("scan"), Some(PortPolicySetting::Scan));
        assert_eq!(PortPolicySetting::parse("ScanForward"), Some(PortPolicySetting::Scan));
        assert_eq!(PortPolicySetting::parse("random"), None);
    }

    #[test]
    fn range_end_below_port_rejected() {
        let s = BridgeSettings { port: 6000, port_range_end: 5999, ..Default::default() };
        assert_matches!(
            s.validate(),
            Err(SettingsError::PortRange { port: 6000, end: 5999 })
        );
    }

    #[test]
    fn zero_timeouts_rejected() {
        let s = BridgeSettings { request_timeout_ms: 0, ..Default::default() };
        assert!(s.validate().is_err());
        let s = BridgeSettings { keepalive_interval_ms: 0, ..Default::default() };
        assert!(s.validate().is_err());
    }

    #[test]
    fn port_range_of_one_is_valid() {
        let s = BridgeSettings { port: 7000, port_range_end: 7000, ..Default::default() };
        assert!(s.validate().is_ok());
    }
}
