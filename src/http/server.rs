//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Accept connections until a shutdown signal, then drain them
//! - Resolve each request against the route table
//! - Forward requests to the chosen origin and stream the answer back
//! - Emit exactly one access or error record per request
//!
//! # Design Decisions
//! - One task per connection, kept in a `JoinSet` so shutdown can abort them
//! - Draining is bounded: connections still open after the drain window
//!   (e.g. an endless event stream) are closed

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    Router,
};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tower::ServiceExt;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ProxyConfig;
use crate::http::request::{forward_path_and_query, original_path_and_query, upstream_request};
use crate::http::response::{gateway_error, relay};
use crate::http::upstream::{build_client, send, UpstreamClient, UpstreamError};
use crate::net::InFlightTracker;
use crate::observability::{metrics, AccessRecord, AccessSink, ErrorRecord, TracingSink};
use crate::resilience::Deadlines;
use crate::routing::{OriginError, RouteTable, Router as ProxyRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub client: UpstreamClient,
    pub deadlines: Deadlines,
    pub sink: Arc<dyn AccessSink>,
    pub in_flight: InFlightTracker,
}

/// The proxy server: a route table plus an upstream client.
pub struct ProxyServer {
    app: Router,
    in_flight: InFlightTracker,
    drain_window: Duration,
}

impl ProxyServer {
    /// Build a server from validated configuration, logging through `tracing`.
    pub fn new(config: &ProxyConfig) -> Result<Self, OriginError> {
        let table = RouteTable::from_config(config)?;
        Ok(Self::with_table(
            table,
            Deadlines::from(&config.timeouts),
            Arc::new(TracingSink),
        ))
    }

    /// Build a server from an already compiled table and an explicit sink.
    pub fn with_table(table: RouteTable, deadlines: Deadlines, sink: Arc<dyn AccessSink>) -> Self {
        let in_flight = InFlightTracker::new();
        let state = AppState {
            router: Arc::new(ProxyRouter::new(table)),
            client: build_client(&deadlines),
            deadlines,
            sink,
            in_flight: in_flight.clone(),
        };

        let app = Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        Self {
            app,
            in_flight,
            drain_window: deadlines.shutdown,
        }
    }

    /// Tracker of upstream exchanges currently in flight.
    pub fn in_flight(&self) -> InFlightTracker {
        self.in_flight.clone()
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// Then stop accepting, ask open connections to finish their current
    /// response, and abort whatever is still open when the drain window ends.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Proxy server accepting connections");

        let (close_tx, close_rx) = watch::channel(());
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        connections.spawn(serve_connection(
                            stream,
                            remote,
                            self.app.clone(),
                            close_rx.clone(),
                        ));
                    }
                    Err(e) => {
                        // Usually fd exhaustion; back off instead of spinning.
                        tracing::warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                () = &mut shutdown => break,
            }
        }

        drop(listener);
        tracing::info!(
            open_connections = connections.len(),
            drain_window = ?self.drain_window,
            "Shutdown signal received, draining connections"
        );
        let _ = close_tx.send(());

        let drain = async { while connections.join_next().await.is_some() {} };
        if tokio::time::timeout(self.drain_window, drain).await.is_err() {
            tracing::warn!(
                open_connections = connections.len(),
                "Drain window elapsed, closing remaining connections"
            );
            connections.shutdown().await;
        }

        tracing::info!("Proxy server stopped");
        Ok(())
    }

    /// Run in a background task and return a handle to it.
    pub fn start(self, listener: TcpListener) -> Result<ServerHandle, std::io::Error> {
        let local_addr = listener.local_addr()?;
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let in_flight = self.in_flight();
        // Dropping the handle without calling `shutdown` also stops the server.
        let task = tokio::spawn(self.run(listener, async move {
            let _ = stop_rx.await;
        }));

        Ok(ServerHandle {
            local_addr,
            stop: stop_tx,
            in_flight,
            task,
        })
    }
}

/// Serve one client connection until it closes, draining it once `close` fires.
async fn serve_connection(
    stream: TcpStream,
    remote: SocketAddr,
    app: Router,
    mut close: watch::Receiver<()>,
) {
    let service = service_fn(move |mut request: Request<Incoming>| {
        request.extensions_mut().insert(ConnectInfo(remote));
        app.clone().oneshot(request)
    });

    let builder = AutoBuilder::new(TokioExecutor::new());
    let connection = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let mut closing = false;
    loop {
        tokio::select! {
            result = connection.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(client = %remote, error = %e, "Client connection ended with error");
                }
                break;
            }
            _ = close.changed(), if !closing => {
                closing = true;
                connection.as_mut().graceful_shutdown();
            }
        }
    }
}

/// Handle to a server started with [`ProxyServer::start`].
pub struct ServerHandle {
    local_addr: SocketAddr,
    stop: oneshot::Sender<()>,
    in_flight: InFlightTracker,
    task: JoinHandle<Result<(), std::io::Error>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn in_flight(&self) -> &InFlightTracker {
        &self.in_flight
    }

    /// Stop accepting, drain open connections and wait for the server.
    pub async fn shutdown(self) -> Result<(), std::io::Error> {
        let _ = self.stop.send(());
        self.task.await.map_err(std::io::Error::other)?
    }
}

/// Main proxy handler.
/// Resolves the origin, forwards the request, and relays the response.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let guard = state.in_flight.track();
    let request_id = Uuid::new_v4();

    let decision = state.router.decide(request.uri().path());
    let mut record = AccessRecord {
        request_id,
        method: request.method().to_string(),
        path: original_path_and_query(request.uri()),
        forward_path: forward_path_and_query(request.uri(), &decision),
        route: decision.route.clone(),
        origin: decision.target.clone(),
        client_addr,
        status: 0,
        latency: Default::default(),
    };

    tracing::debug!(
        request_id = %request_id,
        route = %decision.route,
        origin = %decision.target,
        "Proxying request"
    );

    let (parts, body) = request.into_parts();
    let result = match upstream_request(parts, body, &decision) {
        Ok(upstream) => send(&state.client, upstream, &decision.target, &state.deadlines).await,
        Err(source) => Err(UpstreamError::InvalidRequest {
            origin: decision.target.clone(),
            source,
        }),
    };

    record.latency = start.elapsed();
    match result {
        Ok(response) => {
            record.status = response.status().as_u16();
            state.sink.log_request(&record);
            metrics::record_request(&record.method, record.status, &record.route, &record.origin, start);
            relay(response, &state.deadlines, guard, record, state.sink.clone())
        }
        Err(error) => {
            let status = error.status();
            record.status = status.as_u16();
            metrics::record_request(&record.method, record.status, &record.route, &record.origin, start);
            metrics::record_upstream_error(&record.route, &record.origin, error.kind());
            let response = gateway_error(status, error.origin());
            state.sink.log_error(&ErrorRecord {
                request: record,
                kind: error.kind(),
                error: error.describe(),
            });
            response
        }
    }
}
