//! Audit line schema.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Kind of audited event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    /// A bridge request reached a terminal state.
    Tool,
    /// A plugin socket was accepted.
    PluginConnect,
    /// A plugin socket closed or was replaced.
    PluginDisconnect,
    /// A bridge-level failure not tied to one request.
    Error,
}

/// One audit line. `ts` is stamped at write time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub ts: String,
    /// Event kind.
    pub event: AuditEvent,
    /// Plugin method (tool events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Whether the request succeeded (tool events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds from send to settlement (tool events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AuditEntry {
    /// Entry for `event` with no optional fields.
    pub fn new(event: AuditEvent) -> Self {
        Self {
            ts: now_iso(),
            event,
            method: None,
            success: None,
            error: None,
            duration_ms: None,
        }
    }

    /// Tool entry for a settled request.
    pub fn tool(method: &str, error: Option<String>, duration_ms: u64) -> Self {
        Self {
            method: Some(method.to_owned()),
            success: Some(error.is_none()),
            error,
            duration_ms: Some(duration_ms),
            ..Self::new(AuditEvent::Tool)
        }
    }

    /// Error entry with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(AuditEvent::Error)
        }
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
