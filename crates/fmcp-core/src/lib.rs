//! # fmcp-core
//!
//! Foundation types shared by every crate of the F-MCP plugin bridge:
//!
//! - [`protocol`]: JSON frames exchanged with the design-tool plugin
//! - [`methods`]: the closed set of plugin operations
//! - [`params`]: typed building blocks for operation arguments
//! - [`results`]: typed result shapes validated at the deserialization boundary
//! - [`ids`]: correlation and connection identifiers
//! - [`errors`]: [`BridgeError`], the per-request failure taxonomy
//! - [`transport`]: the [`PluginTransport`] seam between the façade and the server
//! - [`logging`]: `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod methods;
pub mod params;
pub mod protocol;
pub mod results;
pub mod transport;

pub use errors::BridgeError;
pub use ids::{ConnectionId, CorrelationId};
pub use methods::{BridgeMethod, Command};
pub use protocol::{
    BridgeRequest, BridgeResponse, ControlFrame, FrameError, InboundFrame, ResponseOutcome,
    WelcomeFrame, parse_frame,
};
pub use results::{ConsoleEntry, ConsoleLogs, LocalStyles, PluginObject};
pub use transport::PluginTransport;
