//! # fmcp-connector
//!
//! Typed design-tool operations for MCP tool handlers. Each call builds one
//! [`fmcp_core::Command`], validates it, sends it through a
//! [`fmcp_core::PluginTransport`] and decodes the result.

#![deny(unsafe_code)]

pub mod connector;

pub use connector::{
    DEFAULT_CONSOLE_LIMIT, DEFAULT_CONTEXT_DEPTH, DEFAULT_EXECUTE_TIMEOUT_MS,
    DEFAULT_STRUCTURE_DEPTH, PluginBridgeConnector,
};
