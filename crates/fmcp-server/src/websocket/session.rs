//! Single-plugin session: at most one live socket.

use std::sync::Arc;

use fmcp_audit::{AuditEvent, AuditSink};
use fmcp_core::ConnectionId;
use parking_lot::RwLock;
use tracing::info;

use super::connection::PluginConnection;
use crate::metrics::{PLUGIN_CONNECTIONS_TOTAL, PLUGIN_DISCONNECTIONS_TOTAL};

/// Holds the current plugin connection.
///
/// A newly attached connection closes and replaces the previous one. Every
/// transition emits `plugin_connect` / `plugin_disconnect` to the audit sink.
#[derive(Debug)]
pub struct PluginSession {
    current: RwLock<Option<Arc<PluginConnection>>>,
    audit: Arc<AuditSink>,
}

impl PluginSession {
    /// Empty session.
    pub fn new(audit: Arc<AuditSink>) -> Self {
        Self {
            current: RwLock::new(None),
            audit,
        }
    }

    /// Make `conn` the current connection, evicting any previous one.
    pub fn attach(&self, conn: Arc<PluginConnection>) {
        let evicted = self.current.write().replace(conn.clone());
        if let Some(old) = evicted {
            info!(conn_id = %old.id, replacement = %conn.id, "replacing plugin connection");
            old.close();
            self.record_disconnect();
        }
        metrics::counter!(PLUGIN_CONNECTIONS_TOTAL).increment(1);
        self.audit.connection(AuditEvent::PluginConnect);
        info!(conn_id = %conn.id, "plugin connected");
    }

    /// Drop the connection `id` if it is still current.
    ///
    /// Returns `false` when `id` was already replaced.
    pub fn detach(&self, id: &ConnectionId) -> bool {
        let removed = {
            let mut current = self.current.write();
            match current.as_ref() {
                Some(conn) if &conn.id == id => current.take(),
                _ => None,
            }
        };
        match removed {
            Some(conn) => {
                conn.close();
                self.record_disconnect();
                info!(conn_id = %id, "plugin disconnected");
                true
            }
            None => false,
        }
    }

    /// Current connection, if any.
    pub fn current(&self) -> Option<Arc<PluginConnection>> {
        self.current.read().clone()
    }

    /// Whether the current socket is open.
    pub fn is_connected(&self) -> bool {
        self.current.read().as_ref().is_some_and(|c| c.is_open())
    }

    /// Close and drop the current connection.
    pub fn close_current(&self) {
        let taken = self.current.write().take();
        if let Some(conn) = taken {
            conn.close();
            self.record_disconnect();
            info!(conn_id = %conn.id, "plugin connection closed by server");
        }
    }

    fn record_disconnect(&self) {
        metrics::counter!(PLUGIN_DISCONNECTIONS_TOTAL).increment(1);
        self.audit.connection(AuditEvent::PluginDisconnect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use crate::websocket::connection::Outbound;

    fn conn() -> (Arc<PluginConnection>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(4);
        (Arc::new(PluginConnection::new(ConnectionId::new(), tx)), rx)
    }

    #[test]
    fn empty_session_is_disconnected() {
        let session = PluginSession::new(Arc::new(AuditSink::disabled()));
        assert!(!session.is_connected());
        assert!(session.current().is_none());
    }

    #[test]
    fn attach_then_detach() {
        let session = PluginSession::new(Arc::new(AuditSink::disabled()));
        let (c, _rx) = conn();
        session.attach(c.clone());
        assert!(session.is_connected());
        assert!(session.detach(&c.id));
        assert!(!session.is_connected());
        assert!(!c.is_open());
        assert!(!session.detach(&c.id));
    }

    #[test]
    fn second_attach_evicts_first() {
        let session = PluginSession::new(Arc::new(AuditSink::disabled()));
        let (first, _rx1) = conn();
        let (second, _rx2) = conn();
        session.attach(first.clone());
        session.attach(second.clone());

        assert!(!first.is_open());
        assert!(second.is_open());
        assert_eq!(session.current().unwrap().id, second.id);
        // The evicted socket's own teardown must not drop the replacement.
        assert!(!session.detach(&first.id));
        assert!(session.is_connected());
    }

    #[test]
    fn transitions_are_audited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.ndjson");
        let session = PluginSession::new(Arc::new(AuditSink::new(Some(path.clone()))));
        let (first, _rx1) = conn();
        let (second, _rx2) = conn();
        session.attach(first);
        session.attach(second);
        session.close_current();

        let events: Vec<String> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["event"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(
            events,
            ["plugin_connect", "plugin_disconnect", "plugin_connect", "plugin_disconnect"]
        );
    }
}
