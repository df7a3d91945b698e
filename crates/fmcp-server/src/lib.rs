//! # fmcp-server
//!
//! The bridge side of the plugin connection.
//!
//! - One port serves the HTTP probe banner, `/health`, `/metrics` and the
//!   plugin WebSocket upgrade
//! - Port acquisition follows a fail-fast or scan-forward policy
//! - A single-plugin session replaces the old socket when a new one arrives
//! - The request correlator matches responses to callers by id, with a
//!   per-request timeout
//! - Keepalive pings and graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod correlator;
pub mod health;
pub mod metrics;
pub mod port;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::{PortPolicy, ServerConfig};
pub use correlator::RequestCorrelator;
pub use port::{ListenError, PortOccupant};
pub use server::BridgeServer;
