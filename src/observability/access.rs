//! Per-request access and error records.
//!
//! # Responsibilities
//! - Define the record emitted once per forwarding attempt
//! - Format records as single human-readable lines
//! - Provide the default sink, which writes through `tracing`
//!
//! # Design Decisions
//! - Sinks are infallible: nothing they do can fail a request
//! - Records are plain data; formatting is the only behavior
//! - Structured fields and the rendered line are both emitted, so text and
//!   JSON output carry the same information

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use uuid::Uuid;

use crate::routing::Origin;

/// `tracing` target used by [`TracingSink`].
pub const ACCESS_TARGET: &str = "dev_proxy::access";

/// Outcome of a forwarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    /// Log correlation only. Never sent upstream.
    pub request_id: Uuid,
    pub method: String,
    /// Path and query as received from the client.
    pub path: String,
    /// Path and query as sent to the origin.
    pub forward_path: String,
    pub route: String,
    pub origin: Origin,
    pub client_addr: SocketAddr,
    /// Status returned to the client.
    pub status: u16,
    pub latency: Duration,
}

impl AccessRecord {
    /// `GET /frontend/app.js -> http://localhost:8080/frontend/app.js`
    pub fn line(&self) -> String {
        format!(
            "{} {} -> {}{}",
            self.method, self.path, self.origin, self.forward_path
        )
    }
}

impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} ms) from {}",
            self.line(),
            self.status,
            self.latency.as_millis(),
            self.client_addr
        )
    }
}

/// A forwarding attempt that failed: either no response was obtained from the
/// origin, or the relayed body broke off after the head was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Request fields; `status` is the status sent to the client.
    pub request: AccessRecord,
    /// Short machine-friendly class, e.g. `connect`, `timeout` or `idle_timeout`.
    pub kind: &'static str,
    pub error: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed ({}): {} from {}",
            self.request.line(),
            self.kind,
            self.error,
            self.request.client_addr
        )
    }
}

/// Receives one record per forwarding attempt.
pub trait AccessSink: Send + Sync {
    /// Called once when the origin's response head has been received.
    fn log_request(&self, record: &AccessRecord);

    /// Called once when no response could be obtained from the origin.
    fn log_error(&self, record: &ErrorRecord);

    /// Called at most once, after [`AccessSink::log_request`], when the body
    /// fails mid-stream and the client connection is aborted.
    fn log_abort(&self, record: &ErrorRecord);
}

/// Default sink: structured `tracing` events under [`ACCESS_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AccessSink for TracingSink {
    fn log_request(&self, record: &AccessRecord) {
        tracing::info!(
            target: ACCESS_TARGET,
            request_id = %record.request_id,
            method = %record.method,
            path = %record.path,
            forward_path = %record.forward_path,
            route = %record.route,
            origin = %record.origin,
            client = %record.client_addr,
            status = record.status,
            latency_ms = record.latency.as_millis() as u64,
            "{}",
            record.line()
        );
    }

    fn log_error(&self, record: &ErrorRecord) {
        let request = &record.request;
        tracing::error!(
            target: ACCESS_TARGET,
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            forward_path = %request.forward_path,
            route = %request.route,
            origin = %request.origin,
            client = %request.client_addr,
            status = request.status,
            latency_ms = request.latency.as_millis() as u64,
            kind = record.kind,
            error = %record.error,
            "{} failed: {}",
            request.line(),
            record.error
        );
    }

    fn log_abort(&self, record: &ErrorRecord) {
        let request = &record.request;
        tracing::warn!(
            target: ACCESS_TARGET,
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            route = %request.route,
            origin = %request.origin,
            client = %request.client_addr,
            status = request.status,
            kind = record.kind,
            error = %record.error,
            "{} aborted mid-body: {}",
            request.line(),
            record.error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AccessRecord {
        AccessRecord {
            request_id: Uuid::nil(),
            method: "GET".to_string(),
            path: "/frontend/app.js".to_string(),
            forward_path: "/frontend/app.js".to_string(),
            route: "frontend".to_string(),
            origin: "http://localhost:8080".parse().unwrap(),
            client_addr: "127.0.0.1:50000".parse().unwrap(),
            status: 200,
            latency: Duration::from_millis(12),
        }
    }

    #[test]
    fn line_shows_original_and_forwarded_request() {
        assert_eq!(
            record().line(),
            "GET /frontend/app.js -> http://localhost:8080/frontend/app.js"
        );
    }

    #[test]
    fn display_includes_status_and_client() {
        assert_eq!(
            record().to_string(),
            "GET /frontend/app.js -> http://localhost:8080/frontend/app.js 200 (12 ms) from 127.0.0.1:50000"
        );
    }

    #[test]
    fn error_display_names_origin_and_cause() {
        let mut request = record();
        request.status = 502;
        let error = ErrorRecord {
            request,
            kind: "connect",
            error: "connection refused".to_string(),
        };
        let line = error.to_string();
        assert!(line.contains("http://localhost:8080"));
        assert!(line.contains("(connect): connection refused"));
    }

    #[test]
    fn tracing_sink_never_panics_without_subscriber() {
        let sink = TracingSink;
        sink.log_request(&record());
        sink.log_error(&ErrorRecord {
            request: record(),
            kind: "timeout",
            error: "no response".to_string(),
        });
        sink.log_abort(&ErrorRecord {
            request: record(),
            kind: "idle_timeout",
            error: "upstream body idle for 60s".to_string(),
        });
    }
}
