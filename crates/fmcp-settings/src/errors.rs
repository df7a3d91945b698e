//! Settings error types.

use thiserror::Error;

/// Errors raised while loading or validating bridge settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read bridge settings file: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON, or a field has the wrong type.
    #[error("bridge settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// `portRangeEnd` lies below the preferred port.
    #[error("portRangeEnd {end} is below port {port}; raise portRangeEnd or lower port")]
    PortRange {
        /// Preferred port.
        port: u16,
        /// Configured end of the scan range.
        end: u16,
    },
    /// Any other out-of-range or empty value.
    #[error("invalid bridge setting: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
