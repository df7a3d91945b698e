//! Port acquisition policy.
//!
//! The preferred port is tried first. On `address in use` the policy either
//! walks forward through the reserved range or probes the occupant over HTTP
//! and fails with a diagnostic that names it.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use fmcp_core::constants::BANNER_MARKER;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::PortPolicy;

/// How long the occupant probe may take.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Who holds a port we could not bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortOccupant {
    /// Another bridge instance (its banner carries the product marker).
    SiblingBridge,
    /// Anything else, including occupants that did not answer.
    Foreign,
}

impl PortOccupant {
    /// Classify a probe response body.
    pub fn classify(body: Option<&str>) -> Self {
        match body {
            Some(body) if body.contains(BANNER_MARKER) => Self::SiblingBridge,
            _ => Self::Foreign,
        }
    }
}

/// Startup failure. Fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ListenError {
    /// Every port in the scan range was taken.
    #[error("No free port in range {start}–{end}. Free one with: {} then kill <PID>", find_hint(*start))]
    PortRangeExhausted {
        /// First port tried.
        start: u16,
        /// Last port tried.
        end: u16,
    },
    /// The preferred port is taken and the policy is fail-fast.
    #[error("{}", port_in_use_message(*port, *occupant))]
    PortInUse {
        /// Conflicting port.
        port: u16,
        /// Probe classification.
        occupant: PortOccupant,
    },
    /// Any other bind failure.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that failed.
        addr: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The server was stopped and cannot listen again.
    #[error("Plugin bridge server stopped")]
    Stopped,
}

/// Shell command that shows who holds `port`.
pub fn find_hint(port: u16) -> String {
    if cfg!(windows) {
        format!("netstat -ano | findstr :{port}")
    } else {
        format!("lsof -i :{port}")
    }
}

fn port_in_use_message(port: u16, occupant: PortOccupant) -> String {
    let hint = find_hint(port);
    match occupant {
        PortOccupant::SiblingBridge => format!(
            "Port {port} is already used by another F-MCP bridge instance. Find it: {hint}. \
             Kill it and retry, or set FIGMA_PLUGIN_BRIDGE_PORT to a different port."
        ),
        PortOccupant::Foreign => format!(
            "Port {port} is already in use by another application. Find it: {hint}. \
             Free the port and retry, or set FIGMA_PLUGIN_BRIDGE_PORT to a different port."
        ),
    }
}

/// Binds listeners and probes occupants. Stubbed in tests.
#[async_trait]
pub trait PortBinder: Send + Sync {
    /// Listener produced by a successful bind.
    type Listener: Send;

    /// Bind `host:port`.
    async fn bind(&self, host: &str, port: u16) -> io::Result<Self::Listener>;

    /// Best-effort `GET /` against the occupant. `None` if it did not answer.
    async fn probe(&self, host: &str, port: u16) -> Option<String>;
}

/// Real TCP binder.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpBinder;

#[async_trait]
impl PortBinder for TcpBinder {
    type Listener = TcpListener;

    async fn bind(&self, host: &str, port: u16) -> io::Result<TcpListener> {
        TcpListener::bind((host, port)).await
    }

    async fn probe(&self, host: &str, port: u16) -> Option<String> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .ok()?;
        let url = if host.contains(':') {
            format!("http://[{host}]:{port}/")
        } else {
            format!("http://{host}:{port}/")
        };
        match client.get(&url).send().await {
            Ok(resp) => resp.text().await.ok(),
            Err(error) => {
                debug!(%url, %error, "port occupant did not answer probe");
                None
            }
        }
    }
}

/// A listener and the port it was bound with.
#[derive(Debug)]
pub struct Bound<L> {
    /// The listener.
    pub listener: L,
    /// Port passed to the successful bind.
    pub port: u16,
}

/// Bind according to `policy`.
pub async fn bind_with_policy<B: PortBinder>(
    binder: &B,
    host: &str,
    port: u16,
    policy: PortPolicy,
    range_end: u16,
) -> Result<Bound<B::Listener>, ListenError> {
    match policy {
        PortPolicy::FailFast => match binder.bind(host, port).await {
            Ok(listener) => Ok(Bound { listener, port }),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                let body = binder.probe(host, port).await;
                let occupant = PortOccupant::classify(body.as_deref());
                warn!(port, ?occupant, "preferred port is taken");
                Err(ListenError::PortInUse { port, occupant })
            }
            Err(source) => Err(ListenError::Bind {
                addr: format!("{host}:{port}"),
                source,
            }),
        },
        PortPolicy::ScanForward => {
            let end = range_end.max(port);
            for candidate in port..=end {
                match binder.bind(host, candidate).await {
                    Ok(listener) => {
                        if candidate != port {
                            info!(preferred = port, port = candidate, "preferred port taken, using next free port");
                        }
                        return Ok(Bound { listener, port: candidate });
                    }
                    Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                        debug!(port = candidate, "port in use, trying next");
                    }
                    Err(source) => {
                        return Err(ListenError::Bind {
                            addr: format!("{host}:{candidate}"),
                            source,
                        });
                    }
                }
            }
            Err(ListenError::PortRangeExhausted { start: port, end })
        }
    }
}
