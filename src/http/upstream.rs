//! Outbound connections to origins.
//!
//! # Responsibilities
//! - Build the pooled HTTP/1.1 client used for every origin
//! - Send one request with a response-head deadline
//! - Classify failures into gateway-style outcomes
//!
//! # Design Decisions
//! - One shared client; idle connections are reused per origin
//! - No retries: the first failure is the final answer

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::resilience::Deadlines;
use crate::routing::Origin;

pub type UpstreamClient = Client<HttpConnector, Body>;

/// Why a request could not be forwarded.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("could not connect to {origin}")]
    Connect {
        origin: Origin,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("{origin} sent no response within {after:?}")]
    Timeout {
        origin: Origin,
        after: std::time::Duration,
    },

    #[error("request to {origin} failed")]
    Request {
        origin: Origin,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("cannot build request for {origin}")]
    InvalidRequest {
        origin: Origin,
        #[source]
        source: axum::http::Error,
    },
}

impl UpstreamError {
    /// Status returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            UpstreamError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short class used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Connect { .. } => "connect",
            UpstreamError::Timeout { .. } => "timeout",
            UpstreamError::Request { .. } => "upstream",
            UpstreamError::InvalidRequest { .. } => "invalid_request",
        }
    }

    /// Display of this error followed by its whole source chain.
    pub fn describe(&self) -> String {
        describe_chain(self)
    }

    pub fn origin(&self) -> &Origin {
        match self {
            UpstreamError::Connect { origin, .. }
            | UpstreamError::Timeout { origin, .. }
            | UpstreamError::Request { origin, .. }
            | UpstreamError::InvalidRequest { origin, .. } => origin,
        }
    }
}

/// `error: cause: root cause`, skipping causes that repeat the previous text.
pub fn describe_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut previous = text.clone();
    let mut source = error.source();
    while let Some(cause) = source {
        let current = cause.to_string();
        if current != previous {
            text.push_str(": ");
            text.push_str(&current);
        }
        previous = current;
        source = cause.source();
    }
    text
}

/// Build the shared upstream client.
pub fn build_client(deadlines: &Deadlines) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(deadlines.connect));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(deadlines.pool_idle)
        .pool_timer(TokioTimer::new())
        .build(connector)
}

/// Send `request` to `origin`, waiting at most `deadlines.response` for the head.
pub async fn send(
    client: &UpstreamClient,
    request: Request<Body>,
    origin: &Origin,
    deadlines: &Deadlines,
) -> Result<Response<Incoming>, UpstreamError> {
    match tokio::time::timeout(deadlines.response, client.request(request)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(source)) if source.is_connect() => Err(UpstreamError::Connect {
            origin: origin.clone(),
            source,
        }),
        Ok(Err(source)) => Err(UpstreamError::Request {
            origin: origin.clone(),
            source,
        }),
        Err(_) => Err(UpstreamError::Timeout {
            origin: origin.clone(),
            after: deadlines.response,
        }),
    }
}
