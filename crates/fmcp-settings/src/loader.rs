//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`BridgeSettings::default()`]
//! 2. If `~/.fmcp/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{BridgeSettings, PortPolicySetting};

/// Overrides the settings file location.
pub const ENV_SETTINGS_PATH: &str = "FMCP_SETTINGS_PATH";
/// Bind host.
pub const ENV_HOST: &str = "FIGMA_BRIDGE_HOST";
/// Preferred port.
pub const ENV_PORT: &str = "FIGMA_PLUGIN_BRIDGE_PORT";
/// `failFast` or `scan`.
pub const ENV_PORT_POLICY: &str = "FIGMA_BRIDGE_PORT_POLICY";
/// Audit log path; empty disables auditing.
pub const ENV_AUDIT_LOG_PATH: &str = "FIGMA_MCP_AUDIT_LOG_PATH";

/// Resolve the settings file path (`$FMCP_SETTINGS_PATH` or `~/.fmcp/settings.json`).
pub fn settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os(ENV_SETTINGS_PATH).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".fmcp").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<BridgeSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<BridgeSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<BridgeSettings> {
    let defaults = serde_json::to_value(BridgeSettings::default())?;

    if !path.exists() {
        debug!(?path, "settings file not found, using defaults");
        return Ok(serde_json::from_value(defaults)?);
    }

    debug!(?path, "loading settings from file");
    let content = std::fs::read_to_string(path)?;
    let user: Value = serde_json::from_str(&content)?;
    let explicit_range_end = user.get("portRangeEnd").is_some_and(|v| !v.is_null());
    let mut settings: BridgeSettings = serde_json::from_value(deep_merge(defaults, user))?;
    if !explicit_range_end {
        raise_range_end(&mut settings);
    }
    Ok(settings)
}

/// Keep the scan range from ending below a preferred port that was moved
/// without also moving `portRangeEnd`.
fn raise_range_end(settings: &mut BridgeSettings) {
    if settings.port_range_end < settings.port {
        settings.port_range_end = settings.port;
    }
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut BridgeSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Invalid values are ignored with a warning (fall back to file/default).
/// An empty audit path disables auditing.
pub fn apply_overrides(settings: &mut BridgeSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup(ENV_HOST).filter(|v| !v.trim().is_empty()) {
        settings.host = v.trim().to_string();
    }
    if let Some(v) = lookup(ENV_PORT) {
        match parse_u16_range(v.trim(), 1, 65535) {
            Some(port) => {
                settings.port = port;
                raise_range_end(settings);
            }
            None => tracing::warn!(key = ENV_PORT, value = %v, "invalid port env var, ignoring"),
        }
    }
    if let Some(v) = lookup(ENV_PORT_POLICY).filter(|v| !v.is_empty()) {
        match PortPolicySetting::parse(v.trim()) {
            Some(policy) => settings.port_policy = policy,
            None => {
                tracing::warn!(key = ENV_PORT_POLICY, value = %v, "invalid port policy env var, ignoring");
            }
        }
    }
    if let Some(v) = lookup(ENV_AUDIT_LOG_PATH) {
        let v = v.trim();
        settings.audit_log_path = (!v.is_empty()).then(|| PathBuf::from(v));
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}
