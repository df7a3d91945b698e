//! Per-request error taxonomy.
//!
//! Every variant is delivered only to the caller that issued the request.
//! Frames that cannot be correlated never become a [`BridgeError`]; they are
//! reported as [`crate::protocol::FrameError`] and logged by the server.

use std::time::Duration;

use crate::constants::PLUGIN_NOT_CONNECTED;

/// No plugin socket is attached.
pub const CONNECTION_UNAVAILABLE: &str = "CONNECTION_UNAVAILABLE";
/// No response arrived within the request ceiling.
pub const REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
/// The plugin answered with an `error` string.
pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
/// The bridge is shutting down.
pub const SERVER_STOPPED: &str = "SERVER_STOPPED";
/// The plugin answered with a payload of the wrong shape.
pub const MALFORMED_RESULT: &str = "MALFORMED_RESULT";
/// Arguments rejected before anything was sent.
pub const INVALID_PARAMS: &str = "INVALID_PARAMS";

/// Failure of a single bridge request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// No live plugin connection; the request was never sent.
    #[error("{}", PLUGIN_NOT_CONNECTED)]
    ConnectionUnavailable,

    /// The plugin did not answer within the ceiling.
    #[error("Plugin bridge request '{method}' timed out after {}ms", timeout.as_millis())]
    RequestTimeout {
        /// Method that timed out.
        method: String,
        /// Ceiling that elapsed.
        timeout: Duration,
    },

    /// The plugin explicitly reported a failure. The text is surfaced verbatim.
    #[error("{message}")]
    Remote {
        /// Method that failed.
        method: String,
        /// Error string sent by the plugin.
        message: String,
    },

    /// The server stopped while the request was pending.
    #[error("Plugin bridge server stopped")]
    ServerStopped,

    /// The plugin answered, but the payload does not match the operation's schema.
    #[error("Plugin bridge request '{method}' returned a malformed result: {reason}")]
    MalformedResult {
        /// Method whose result was rejected.
        method: String,
        /// What did not match.
        reason: String,
    },

    /// Arguments were rejected before sending.
    #[error("{message}")]
    InvalidParams {
        /// Description of what is wrong.
        message: String,
    },
}

impl BridgeError {
    /// Machine-readable error code for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConnectionUnavailable => CONNECTION_UNAVAILABLE,
            Self::RequestTimeout { .. } => REQUEST_TIMEOUT,
            Self::Remote { .. } => REMOTE_ERROR,
            Self::ServerStopped => SERVER_STOPPED,
            Self::MalformedResult { .. } => MALFORMED_RESULT,
            Self::InvalidParams { .. } => INVALID_PARAMS,
        }
    }

    /// Short reason recorded in the audit log.
    ///
    /// Timeouts are recorded as `"timeout"`; everything else uses the display text.
    pub fn audit_reason(&self) -> String {
        match self {
            Self::RequestTimeout { .. } => "timeout".to_owned(),
            other => other.to_string(),
        }
    }

    /// Shorthand for [`BridgeError::InvalidParams`].
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }
}
