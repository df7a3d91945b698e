//! Request/response correlation over the plugin socket.
//!
//! Each outgoing request gets a fresh correlation id and an entry in the
//! pending table holding a `oneshot` sender. Whoever removes the entry owns
//! the only sender, so a request settles exactly once whether the reply, the
//! timeout or `reject_all` gets there first. The table lock is never held
//! across an `.await`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fmcp_audit::AuditSink;
use fmcp_core::{
    BridgeError, BridgeRequest, BridgeResponse, CorrelationId, PluginTransport, ResponseOutcome,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::metrics::{BRIDGE_PENDING_REQUESTS, BRIDGE_REQUESTS_TOTAL, BRIDGE_REQUEST_DURATION_SECONDS};
use crate::websocket::session::PluginSession;

type Settlement = Result<Value, BridgeError>;

struct PendingRequest {
    method: String,
    tx: oneshot::Sender<Settlement>,
}

#[derive(Default)]
struct PendingTable {
    entries: HashMap<CorrelationId, PendingRequest>,
    stopped: bool,
}

/// Matches plugin responses to waiting callers.
pub struct RequestCorrelator {
    session: Arc<PluginSession>,
    pending: Mutex<PendingTable>,
    timeout: Duration,
    audit: Arc<AuditSink>,
}

impl std::fmt::Debug for RequestCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCorrelator")
            .field("pending", &self.pending_count())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Removes the entry if the caller's future is dropped before settlement.
struct PendingGuard<'a> {
    correlator: &'a RequestCorrelator,
    id: &'a CorrelationId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.correlator.take(self.id).is_some() {
            debug!(id = %self.id, "pending request abandoned by caller");
        }
    }
}

impl RequestCorrelator {
    /// Correlator sending through `session` with a per-request `timeout`.
    pub fn new(session: Arc<PluginSession>, timeout: Duration, audit: Arc<AuditSink>) -> Self {
        Self {
            session,
            pending: Mutex::new(PendingTable::default()),
            timeout,
            audit,
        }
    }

    /// Per-request ceiling.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Requests awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().entries.len()
    }

    /// Send `method` to the plugin and wait for its settlement.
    ///
    /// Without an open connection this fails immediately with
    /// [`BridgeError::ConnectionUnavailable`] and nothing is sent or audited.
    /// Every other outcome appends exactly one `tool` audit line.
    #[instrument(skip(self, params), fields(id))]
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, BridgeError> {
        let Some(conn) = self.session.current().filter(|c| c.is_open()) else {
            debug!("plugin not connected, request not sent");
            return Err(BridgeError::ConnectionUnavailable);
        };

        let (tx, mut rx) = oneshot::channel();
        let id = self.register(method, tx, CorrelationId::generate)?;
        let _guard = PendingGuard { correlator: self, id: &id };
        let _ = tracing::Span::current().record("id", id.as_str());
        let started = Instant::now();

        let request = BridgeRequest {
            id: id.clone(),
            method: method.to_owned(),
            params,
        };
        let text = request
            .to_text()
            .map_err(|e| BridgeError::invalid_params(format!("params are not serializable: {e}")))?;

        let result = if conn.send_text(text) {
            debug!("request sent");
            match tokio::time::timeout(self.timeout, &mut rx).await {
                Ok(settled) => settled.unwrap_or_else(|_| Err(abandoned())),
                Err(_) if self.take(&id).is_some() => {
                    warn!(timeout_ms = self.timeout.as_millis(), "plugin request timed out");
                    Err(BridgeError::RequestTimeout {
                        method: method.to_owned(),
                        timeout: self.timeout,
                    })
                }
                // Settled concurrently with the deadline.
                Err(_) => rx.await.unwrap_or_else(|_| Err(abandoned())),
            }
        } else if self.take(&id).is_some() {
            debug!("send failed, socket closed or queue full");
            Err(BridgeError::ConnectionUnavailable)
        } else {
            rx.await.unwrap_or_else(|_| Err(abandoned()))
        };

        self.record(method, &result, started.elapsed());
        result
    }

    /// Insert a pending entry under the first id from `next_id` not already
    /// in the table.
    fn register(
        &self,
        method: &str,
        tx: oneshot::Sender<Settlement>,
        mut next_id: impl FnMut() -> CorrelationId,
    ) -> Result<CorrelationId, BridgeError> {
        let mut table = self.pending.lock();
        if table.stopped {
            return Err(BridgeError::ServerStopped);
        }
        let id = loop {
            match table.entries.entry(next_id()) {
                Entry::Vacant(slot) => {
                    let id = slot.key().clone();
                    let _ = slot.insert(PendingRequest {
                        method: method.to_owned(),
                        tx,
                    });
                    break id;
                }
                Entry::Occupied(taken) => {
                    debug!(id = %taken.key(), "correlation id already pending, regenerating");
                }
            }
        };
        set_pending_gauge(table.entries.len());
        Ok(id)
    }

    /// Settle the pending request matching `response.id`.
    ///
    /// Returns `false` for unknown or already-settled ids, which are ignored.
    pub fn handle_response(&self, response: BridgeResponse) -> bool {
        let Some(entry) = self.take(&response.id) else {
            debug!(id = %response.id, "response for unknown or settled id ignored");
            return false;
        };
        let settlement = match response.outcome {
            ResponseOutcome::Result(value) => Ok(value),
            ResponseOutcome::Error(message) => Err(BridgeError::Remote {
                method: entry.method,
                message,
            }),
            ResponseOutcome::Malformed(reason) => Err(BridgeError::MalformedResult {
                method: entry.method,
                reason,
            }),
        };
        let _ = entry.tx.send(settlement);
        true
    }

    /// Reject every pending request with [`BridgeError::ServerStopped`] and
    /// refuse new ones. Returns how many were rejected.
    pub fn reject_all(&self) -> usize {
        let drained: Vec<PendingRequest> = {
            let mut table = self.pending.lock();
            table.stopped = true;
            table.entries.drain().map(|(_, entry)| entry).collect()
        };
        set_pending_gauge(0);
        let count = drained.len();
        for entry in drained {
            let _ = entry.tx.send(Err(BridgeError::ServerStopped));
        }
        if count > 0 {
            debug!(count, "rejected pending requests on stop");
        }
        count
    }

    fn take(&self, id: &CorrelationId) -> Option<PendingRequest> {
        let mut table = self.pending.lock();
        let entry = table.entries.remove(id);
        if entry.is_some() {
            set_pending_gauge(table.entries.len());
        }
        entry
    }

    fn record(&self, method: &str, result: &Result<Value, BridgeError>, elapsed: Duration) {
        if matches!(result, Err(BridgeError::ConnectionUnavailable)) {
            return;
        }
        let outcome = match result {
            Ok(_) => "ok".to_owned(),
            Err(e) => e.code().to_ascii_lowercase(),
        };
        metrics::counter!(BRIDGE_REQUESTS_TOTAL, "outcome" => outcome).increment(1);
        metrics::histogram!(BRIDGE_REQUEST_DURATION_SECONDS).record(elapsed.as_secs_f64());
        self.audit
            .tool(method, result.as_ref().err().map(BridgeError::audit_reason), elapsed);
    }
}

/// Settlement for a pending sender dropped without a value. Entries leave the
/// table only to be settled, so this does not occur while the server runs.
fn abandoned() -> BridgeError {
    BridgeError::ConnectionUnavailable
}

#[allow(clippy::cast_precision_loss)]
fn set_pending_gauge(len: usize) {
    metrics::gauge!(BRIDGE_PENDING_REQUESTS).set(len as f64);
}

#[async_trait]
impl PluginTransport for RequestCorrelator {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, BridgeError> {
        RequestCorrelator::request(self, method, params).await
    }

    fn is_connected(&self) -> bool {
        self.session.is_connected()
    }
}
