//! Plugin socket state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use fmcp_core::ConnectionId;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Frame queued for the socket writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Text frame.
    Text(String),
    /// Keepalive ping.
    Ping,
}

/// One accepted plugin socket.
///
/// All sends go through a single mpsc channel drained by the writer task, so
/// frames are never interleaved.
#[derive(Debug)]
pub struct PluginConnection {
    /// Unique connection ID.
    pub id: ConnectionId,
    tx: mpsc::Sender<Outbound>,
    /// When the socket was accepted.
    pub connected_at: Instant,
    open: AtomicBool,
    ready: AtomicBool,
    close: CancellationToken,
    last_pong: Mutex<Instant>,
    dropped_messages: AtomicU64,
}

impl PluginConnection {
    /// Wrap the writer channel of a freshly accepted socket.
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Outbound>) -> Self {
        let now = Instant::now();
        Self {
            id,
            tx,
            connected_at: now,
            open: AtomicBool::new(true),
            ready: AtomicBool::new(false),
            close: CancellationToken::new(),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Queue a text frame.
    ///
    /// Returns `false` if the connection is closed or the queue is full.
    pub fn send_text(&self, text: String) -> bool {
        self.enqueue(Outbound::Text(text))
    }

    /// Queue a keepalive ping.
    pub fn ping(&self) -> bool {
        self.enqueue(Outbound::Ping)
    }

    fn enqueue(&self, frame: Outbound) -> bool {
        if !self.is_open() {
            return false;
        }
        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Whether the socket is still open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    /// Mark closed and wake the socket tasks. Idempotent.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
        self.close.cancel();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.close.cancelled().await;
    }

    /// Record the `ready` handshake.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Whether the plugin sent `ready`.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Record a pong.
    pub fn mark_alive(&self) {
        *self.last_pong.lock() = Instant::now();
    }

    /// Time since the last pong (or accept).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection(capacity: usize) -> (PluginConnection, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        (PluginConnection::new(ConnectionId::new(), tx), rx)
    }

    #[test]
    fn new_connection_is_open_not_ready() {
        let (conn, _rx) = make_connection(4);
        assert!(conn.is_open());
        assert!(!conn.is_ready());
        assert!(conn.id.as_str().starts_with("conn_"));
    }

    #[tokio::test]
    async fn frames_arrive_in_order() {
        let (conn, mut rx) = make_connection(8);
        assert!(conn.send_text("a".into()));
        assert!(conn.ping());
        assert!(conn.send_text("b".into()));
        assert_eq!(rx.recv().await.unwrap(), Outbound::Text("a".into()));
        assert_eq!(rx.recv().await.unwrap(), Outbound::Ping);
        assert_eq!(rx.recv().await.unwrap(), Outbound::Text("b".into()));
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let (conn, _rx) = make_connection(1);
        assert!(conn.send_text("one".into()));
        assert!(!conn.send_text("two".into()));
        assert_eq!(conn.drop_count(), 1);
    }

    #[test]
    fn closed_receiver_means_not_open() {
        let (conn, rx) = make_connection(4);
        drop(rx);
        assert!(!conn.is_open());
        assert!(!conn.send_text("x".into()));
    }

    #[tokio::test]
    async fn close_wakes_waiters() {
        let (conn, _rx) = make_connection(4);
        let conn = std::sync::Arc::new(conn);
        let waiter = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.closed().await })
        };
        conn.close();
        conn.close();
        waiter.await.unwrap();
        assert!(!conn.is_open());
        assert!(!conn.ping());
    }

    #[test]
    fn ready_and_alive_marks() {
        let (conn, _rx) = make_connection(4);
        conn.mark_ready();
        assert!(conn.is_ready());
        std::thread::sleep(Duration::from_millis(5));
        conn.mark_alive();
        assert!(conn.last_pong_elapsed() < conn.age());
    }
}
