//! Plugin socket lifecycle: writer task, keepalive, inbound frame dispatch.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use fmcp_core::{ConnectionId, ControlFrame, InboundFrame, WelcomeFrame, parse_frame};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use super::connection::{Outbound, PluginConnection};
use super::keepalive::run_keepalive;
use super::session::PluginSession;
use crate::correlator::RequestCorrelator;
use crate::metrics::BRIDGE_MALFORMED_FRAMES_TOTAL;

/// Everything a socket session needs from the server.
#[derive(Clone, Debug)]
pub struct SocketContext {
    /// Single-plugin session.
    pub session: Arc<PluginSession>,
    /// Pending-request table.
    pub correlator: Arc<RequestCorrelator>,
    /// Keepalive ping interval.
    pub keepalive_interval: Duration,
    /// Outbound queue depth.
    pub max_send_queue: usize,
    /// Bound port, echoed in the welcome frame.
    pub port: u16,
    /// Server shutdown signal.
    pub shutdown: CancellationToken,
}

/// Drive one accepted plugin socket until it closes, is replaced, or the
/// server shuts down.
#[instrument(skip_all, fields(conn_id))]
pub async fn handle_plugin_socket(socket: WebSocket, ctx: SocketContext) {
    let (tx, mut rx) = mpsc::channel::<Outbound>(ctx.max_send_queue);
    let conn = Arc::new(PluginConnection::new(ConnectionId::new(), tx));
    let _ = tracing::Span::current().record("conn_id", conn.id.as_str());
    ctx.session.attach(conn.clone());

    let (mut ws_tx, mut ws_rx) = socket.split();

    let writer_conn = conn.clone();
    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let message = match frame {
                        Some(Outbound::Text(text)) => Message::Text(text.into()),
                        Some(Outbound::Ping) => Message::Ping(Vec::new().into()),
                        None => break,
                    };
                    if ws_tx.send(message).await.is_err() {
                        break;
                    }
                }
                () = writer_conn.closed() => break,
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
        writer_conn.close();
    });

    let keepalive = tokio::spawn(run_keepalive(
        conn.clone(),
        ctx.keepalive_interval,
        ctx.shutdown.clone(),
    ));

    loop {
        tokio::select! {
            next = ws_rx.next() => {
                match next {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(text.as_str(), &conn, &ctx.correlator, ctx.port);
                    }
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => handle_frame(text, &conn, &ctx.correlator, ctx.port),
                        Err(error) => {
                            warn!(%error, len = bytes.len(), "dropping non-UTF-8 binary frame");
                            metrics::counter!(BRIDGE_MALFORMED_FRAMES_TOTAL).increment(1);
                        }
                    },
                    Some(Ok(Message::Pong(_))) => conn.mark_alive(),
                    Some(Ok(Message::Ping(_))) => {} // axum answers pings
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(error)) => {
                        debug!(%error, "plugin socket read failed");
                        break;
                    }
                }
            }
            () = conn.closed() => break,
            () = ctx.shutdown.cancelled() => break,
        }
    }

    conn.close();
    let _ = ctx.session.detach(&conn.id);
    if writer.await.is_err() {
        debug!("writer task ended abnormally");
    }
    keepalive.abort();
    info!(age_ms = conn.age().as_millis(), dropped = conn.drop_count(), "plugin socket closed");
}

/// Dispatch one inbound text frame.
pub fn handle_frame(text: &str, conn: &PluginConnection, correlator: &RequestCorrelator, port: u16) {
    match parse_frame(text) {
        Ok(InboundFrame::Control(ControlFrame::Ready)) => {
            conn.mark_ready();
            match serde_json::to_string(&WelcomeFrame::new(port)) {
                Ok(welcome) => {
                    if !conn.send_text(welcome) {
                        debug!("welcome not queued, socket closing");
                    }
                }
                Err(error) => warn!(%error, "failed to serialize welcome frame"),
            }
            info!(conn_id = %conn.id, "plugin ready");
        }
        Ok(InboundFrame::Control(ControlFrame::Other(kind))) => {
            debug!(kind, "ignoring control frame");
        }
        Ok(InboundFrame::Response(response)) => {
            trace!(id = %response.id, "response frame");
            let _ = correlator.handle_response(response);
        }
        Err(error) => {
            warn!(%error, "dropping malformed frame");
            metrics::counter!(BRIDGE_MALFORMED_FRAMES_TOTAL).increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmcp_audit::AuditSink;
    use serde_json::{Value, json};

    fn setup() -> (Arc<PluginConnection>, mpsc::Receiver<Outbound>, Arc<RequestCorrelator>) {
        let audit = Arc::new(AuditSink::disabled());
        let session = Arc::new(PluginSession::new(audit.clone()));
        let (tx, rx) = mpsc::channel(16);
        let conn = Arc::new(PluginConnection::new(ConnectionId::new(), tx));
        session.attach(conn.clone());
        let correlator = Arc::new(RequestCorrelator::new(session, Duration::from_secs(120), audit));
        (conn, rx, correlator)
    }

    #[test]
    fn ready_is_answered_with_welcome() {
        let (conn, mut rx, correlator) = setup();
        handle_frame(r#"{"type":"ready"}"#, &conn, &correlator, 5456);
        assert!(conn.is_ready());

        let Outbound::Text(text) = rx.try_recv().unwrap() else {
            panic!("expected a text frame");
        };
        let welcome: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(welcome["type"], "welcome");
        assert_eq!(welcome["port"], 5456);
        assert_eq!(welcome["bridgeVersion"], fmcp_core::constants::VERSION);
    }

    #[test]
    fn unknown_control_frame_is_ignored() {
        let (conn, mut rx, correlator) = setup();
        handle_frame(r#"{"type":"progress","pct":40}"#, &conn, &correlator, 5454);
        assert!(!conn.is_ready());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn garbage_is_dropped() {
        let (conn, mut rx, correlator) = setup();
        handle_frame("not json", &conn, &correlator, 5454);
        handle_frame("[1,2]", &conn, &correlator, 5454);
        handle_frame(r#"{"result":{}}"#, &conn, &correlator, 5454);
        assert!(rx.try_recv().is_err());
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn response_frame_settles_request() {
        let (conn, mut rx, correlator) = setup();
        let caller = correlator.clone();
        let call = tokio::spawn(async move { caller.request("getLocalComponents", None).await });

        let Some(Outbound::Text(text)) = rx.recv().await else {
            panic!("expected a request frame");
        };
        let sent: Value = serde_json::from_str(&text).unwrap();
        let reply = json!({"id": sent["id"], "result": {"components": []}}).to_string();
        handle_frame(&reply, &conn, &correlator, 5454);

        assert_eq!(call.await.unwrap().unwrap(), json!({"components": []}));
    }
}
