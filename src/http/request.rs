//! Request handling and transformation.
//!
//! # Responsibilities
//! - Compute the path and query forwarded to the origin
//! - Strip hop-by-hop headers
//! - Re-target the request URI at the chosen origin
//!
//! # Design Decisions
//! - Method, end-to-end headers and body are forwarded untouched
//! - `Host` is preserved as sent by the client
//! - The body is streamed, never buffered

use axum::body::Body;
use axum::http::header::{HeaderName, CONNECTION, HOST};
use axum::http::{request, HeaderMap, HeaderValue, Request, Uri, Version};

use crate::routing::ProxyDecision;

/// Connection-scoped headers that must not cross the proxy (RFC 9110 §7.6.1).
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Path plus query as sent to the origin.
pub fn forward_path_and_query(uri: &Uri, decision: &ProxyDecision) -> String {
    match uri.query() {
        Some(query) => format!("{}?{}", decision.forward_path, query),
        None => decision.forward_path.clone(),
    }
}

/// Path plus query as received from the client.
pub fn original_path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Turn the inbound request into the request sent to `decision.target`.
pub fn upstream_request(
    mut parts: request::Parts,
    body: Body,
    decision: &ProxyDecision,
) -> Result<Request<Body>, axum::http::Error> {
    let path_and_query = forward_path_and_query(&parts.uri, decision);
    let uri = Uri::builder()
        .scheme(decision.target.scheme().clone())
        .authority(decision.target.authority().clone())
        .path_and_query(path_and_query)
        .build()?;

    // HTTP/2 clients carry the host in the URI instead of a header.
    if !parts.headers.contains_key(HOST) {
        if let Some(authority) = parts.uri.authority() {
            if let Ok(value) = HeaderValue::from_str(authority.as_str()) {
                parts.headers.insert(HOST, value);
            }
        }
    }

    strip_hop_by_hop(&mut parts.headers);
    parts.uri = uri;
    parts.version = Version::HTTP_11;
    parts.extensions = Default::default();

    Ok(Request::from_parts(parts, body))
}
