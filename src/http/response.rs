//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the origin's status, headers and body to the client
//! - Build gateway-style failure responses
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped automatically
//! - A body failure after the head was sent aborts the client connection;
//!   there is no way to report a status at that point, so it goes to the
//!   sink as an abort record instead

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use futures_util::StreamExt;
use hyper::body::Incoming;

use crate::http::request::strip_hop_by_hop;
use crate::http::upstream::describe_chain;
use crate::net::InFlightGuard;
use crate::observability::{metrics, AccessRecord, AccessSink, ErrorRecord};
use crate::resilience::{with_idle_timeout, BoxError, Deadlines, IdleTimeout};
use crate::routing::Origin;

/// Plain-text response telling the client the origin could not be reached.
pub fn gateway_error(status: StatusCode, origin: &Origin) -> axum::response::Response {
    let reason = status.canonical_reason().unwrap_or("Gateway Error");
    let body = format!("{} {}: could not get a response from {}\n", status.as_u16(), reason, origin);
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        body,
    )
        .into_response()
}

/// Relay an origin response, streaming its body.
///
/// `guard` is held by the body stream and released when the stream finishes
/// or is dropped (e.g. because the client went away). If the body fails, the
/// failure is reported once through `sink.log_abort` for `record`.
pub fn relay(
    response: Response<Incoming>,
    deadlines: &Deadlines,
    guard: InFlightGuard,
    record: AccessRecord,
    sink: Arc<dyn AccessSink>,
) -> axum::response::Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);

    let chunks = with_idle_timeout(Body::new(body).into_data_stream(), deadlines.idle).map(
        move |chunk| {
            let _held = &guard;
            if let Err(e) = &chunk {
                let kind = abort_kind(e);
                metrics::record_abort(&record.route, &record.origin, kind);
                sink.log_abort(&ErrorRecord {
                    request: record.clone(),
                    kind,
                    error: describe_chain(&**e),
                });
            }
            chunk
        },
    );

    Response::from_parts(parts, Body::from_stream(chunks))
}

fn abort_kind(error: &BoxError) -> &'static str {
    if error.downcast_ref::<IdleTimeout>().is_some() {
        "idle_timeout"
    } else {
        "body"
    }
}
