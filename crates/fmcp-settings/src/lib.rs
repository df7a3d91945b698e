//! # fmcp-settings
//!
//! Configuration for the F-MCP plugin bridge.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`BridgeSettings::default()`]
//! 2. **User file**: `~/.fmcp/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `FIGMA_*` overrides (highest priority)
//!
//! There are no command-line flags.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{BridgeSettings, PortPolicySetting};
