//! Seam between typed callers and the live plugin socket.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::BridgeError;
use crate::methods::Command;

/// Sends a request to the plugin and waits for its settlement.
#[async_trait]
pub trait PluginTransport: Send + Sync {
    /// Send `method` with `params` and wait for the response.
    ///
    /// Fails immediately with [`BridgeError::ConnectionUnavailable`] when no
    /// plugin is attached.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, BridgeError>;

    /// Whether a plugin socket is currently open.
    fn is_connected(&self) -> bool;

    /// Validate and send a typed command.
    async fn dispatch(&self, command: Command) -> Result<Value, BridgeError> {
        command.validate()?;
        let (method, params) = command.into_parts()?;
        self.request(method.as_str(), Some(params)).await
    }
}
