//! Plugin WebSocket: connection state, single-plugin session, keepalive and
//! frame dispatch.

pub mod connection;
pub mod handler;
pub mod keepalive;
pub mod session;
