//! `BridgeServer`: HTTP probe, health, metrics and the plugin WebSocket on one port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use fmcp_audit::AuditSink;
use fmcp_core::PluginTransport;
use fmcp_core::constants::HTTP_BANNER;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::correlator::RequestCorrelator;
use crate::health::{self, HealthResponse};
use crate::port::{ListenError, TcpBinder, bind_with_policy};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::handler::{SocketContext, handle_plugin_socket};
use crate::websocket::session::PluginSession;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
struct AppState {
    session: Arc<PluginSession>,
    correlator: Arc<RequestCorrelator>,
    start_time: Instant,
    port: u16,
    config: Arc<ServerConfig>,
    shutdown: CancellationToken,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    fn socket_context(&self) -> SocketContext {
        SocketContext {
            session: self.session.clone(),
            correlator: self.correlator.clone(),
            keepalive_interval: self.config.keepalive_interval,
            max_send_queue: self.config.max_send_queue,
            port: self.port,
            shutdown: self.shutdown.clone(),
        }
    }
}

enum ListenState {
    Idle,
    Listening { addr: SocketAddr, task: JoinHandle<()> },
    Stopped,
}

/// The plugin bridge server.
///
/// Owns the listener, the single-plugin session, the correlator and the audit
/// sink. Callers reach the plugin through [`BridgeServer::transport`].
pub struct BridgeServer {
    config: Arc<ServerConfig>,
    audit: Arc<AuditSink>,
    session: Arc<PluginSession>,
    correlator: Arc<RequestCorrelator>,
    shutdown: ShutdownCoordinator,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
    bound_port: AtomicU16,
    state: tokio::sync::Mutex<ListenState>,
}

impl BridgeServer {
    /// Build a server. Nothing is bound until [`start`](Self::start).
    pub fn new(config: ServerConfig) -> Self {
        let audit = Arc::new(AuditSink::new(config.audit_log_path.clone()));
        let session = Arc::new(PluginSession::new(audit.clone()));
        let correlator = Arc::new(RequestCorrelator::new(
            session.clone(),
            config.request_timeout,
            audit.clone(),
        ));
        Self {
            config: Arc::new(config),
            audit,
            session,
            correlator,
            shutdown: ShutdownCoordinator::new(),
            start_time: Instant::now(),
            metrics: None,
            bound_port: AtomicU16::new(0),
            state: tokio::sync::Mutex::new(ListenState::Idle),
        }
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Bind according to the port policy and start serving.
    ///
    /// Idempotent while listening: a second call returns the bound address.
    /// Fails with [`ListenError::Stopped`] after [`stop`](Self::stop).
    pub async fn start(&self) -> Result<SocketAddr, ListenError> {
        let mut state = self.state.lock().await;
        match &*state {
            ListenState::Listening { addr, .. } => return Ok(*addr),
            ListenState::Stopped => return Err(ListenError::Stopped),
            ListenState::Idle => {}
        }

        let cfg = &self.config;
        let bound = match bind_with_policy(&TcpBinder, &cfg.host, cfg.port, cfg.port_policy, cfg.port_range_end).await {
            Ok(bound) => bound,
            Err(err) => {
                self.audit.error(err.to_string());
                error!(error = %err, "plugin bridge failed to listen");
                return Err(err);
            }
        };
        let addr = bound.listener.local_addr().map_err(|source| ListenError::Bind {
            addr: format!("{}:{}", cfg.host, bound.port),
            source,
        })?;
        self.bound_port.store(addr.port(), Ordering::Release);

        let router = self.router(addr.port());
        let token = self.shutdown.token();
        let task = tokio::spawn(async move {
            if let Err(error) = axum::serve(bound.listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(%error, "plugin bridge listener failed");
            }
        });

        info!(%addr, "plugin bridge listening");
        *state = ListenState::Listening { addr, task };
        Ok(addr)
    }

    /// Reject every pending request, close the plugin socket and stop listening.
    ///
    /// Terminal: the server cannot be started again.
    pub async fn stop(&self) {
        let rejected = self.correlator.reject_all();
        self.session.close_current();

        let previous = std::mem::replace(&mut *self.state.lock().await, ListenState::Stopped);
        match previous {
            ListenState::Listening { task, .. } => {
                self.shutdown
                    .graceful_shutdown(vec![task], self.config.shutdown_timeout)
                    .await;
            }
            ListenState::Idle | ListenState::Stopped => self.shutdown.shutdown(),
        }
        info!(rejected, "plugin bridge stopped");
    }

    /// Build the Axum router for a listener bound on `port`.
    pub fn router(&self, port: u16) -> Router {
        let state = AppState {
            session: self.session.clone(),
            correlator: self.correlator.clone(),
            start_time: self.start_time,
            port,
            config: self.config.clone(),
            shutdown: self.shutdown.token(),
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(state)
            .layer(CorsLayer::permissive())
    }

    /// Whether a plugin socket is open.
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Requests awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.correlator.pending_count()
    }

    /// Bound address, `None` unless listening.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state.lock().await {
            ListenState::Listening { addr, .. } => Some(*addr),
            ListenState::Idle | ListenState::Stopped => None,
        }
    }

    /// Bound port, `0` before `start()`.
    pub fn port(&self) -> u16 {
        self.bound_port.load(Ordering::Acquire)
    }

    /// Handle for sending requests to the plugin.
    pub fn transport(&self) -> Arc<dyn PluginTransport> {
        self.correlator.clone()
    }

    /// Audit sink shared with the session and correlator.
    pub fn audit(&self) -> &Arc<AuditSink> {
        &self.audit
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET / : WebSocket upgrade, or the plain-text banner.
async fn root_handler(
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => {
            let ctx = state.socket_context();
            ws.max_message_size(state.config.max_message_size)
                .on_failed_upgrade(|error| warn!(%error, "plugin websocket upgrade failed"))
                .on_upgrade(move |socket| handle_plugin_socket(socket, ctx))
        }
        Err(_) => ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], HTTP_BANNER).into_response(),
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.session.is_connected(),
        state.correlator.pending_count(),
        state.port,
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => crate::metrics::render(handle).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use fmcp_core::BridgeError;
    use tower::ServiceExt;

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String, Option<String>) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap(), content_type)
    }

    #[tokio::test]
    async fn root_serves_banner() {
        let server = BridgeServer::new(ServerConfig::default());
        let (status, body, content_type) = get_body(server.router(5454), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, HTTP_BANNER);
        assert!(content_type.unwrap().starts_with("text/plain"));
    }

    #[tokio::test]
    async fn health_reports_state() {
        let server = BridgeServer::new(ServerConfig::default());
        let (status, body, _) = get_body(server.router(5455), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["pluginConnected"], false);
        assert_eq!(parsed["pendingRequests"], 0);
        assert_eq!(parsed["port"], 5455);
    }

    #[tokio::test]
    async fn metrics_without_handle_is_404() {
        let server = BridgeServer::new(ServerConfig::default());
        let (status, _, _) = get_body(server.router(5454), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_with_handle_renders() {
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();
        let server = BridgeServer::new(ServerConfig::default()).with_metrics(handle);
        let (status, _, _) = get_body(server.router(5454), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let server = BridgeServer::new(ServerConfig::default());
        let (status, _, _) = get_body(server.router(5454), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn start_is_idempotent_and_stop_is_terminal() {
        let server = BridgeServer::new(ServerConfig::default());
        assert!(server.local_addr().await.is_none());

        let first = server.start().await.unwrap();
        let second = server.start().await.unwrap();
        assert_eq!(first, second);
        assert_ne!(first.port(), 0);
        assert_eq!(server.port(), first.port());

        server.stop().await;
        assert!(server.local_addr().await.is_none());
        assert!(matches!(server.start().await, Err(ListenError::Stopped)));
    }

    #[tokio::test]
    async fn stop_before_start_is_harmless() {
        let server = BridgeServer::new(ServerConfig::default());
        server.stop().await;
        assert_eq!(server.pending_count(), 0);
        assert_eq!(
            server.transport().request("getVariables", None).await.unwrap_err(),
            BridgeError::ConnectionUnavailable
        );
    }

    #[tokio::test]
    async fn transport_without_plugin_is_unavailable() {
        let server = BridgeServer::new(ServerConfig::default());
        let transport = server.transport();
        assert!(!transport.is_connected());
        assert_eq!(
            transport.request("getVariables", None).await.unwrap_err(),
            BridgeError::ConnectionUnavailable
        );
    }
}
