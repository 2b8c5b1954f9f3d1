//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dev_proxy_requests_total` (counter): requests by method, status, route, target
//! - `dev_proxy_request_duration_seconds` (histogram): time to response head, by route and target
//! - `dev_proxy_upstream_errors_total` (counter): failures by route, target and kind
//! - `dev_proxy_responses_aborted_total` (counter): bodies cut short after the head was sent
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::Origin;

/// Install the Prometheus exporter on `addr`. Needs a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("dev_proxy_requests_total", "Requests forwarded, by status");
    describe_histogram!(
        "dev_proxy_request_duration_seconds",
        "Time until the origin's response head arrived"
    );
    describe_counter!(
        "dev_proxy_upstream_errors_total",
        "Requests for which no origin response was obtained"
    );
    describe_counter!(
        "dev_proxy_responses_aborted_total",
        "Responses whose body failed after the head was relayed"
    );

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, route: &str, target: &Origin, start: Instant) {
    counter!(
        "dev_proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string(),
        "target" => target.to_string()
    )
    .increment(1);
    histogram!(
        "dev_proxy_request_duration_seconds",
        "route" => route.to_string(),
        "target" => target.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(route: &str, target: &Origin, kind: &'static str) {
    counter!(
        "dev_proxy_upstream_errors_total",
        "route" => route.to_string(),
        "target" => target.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_abort(route: &str, target: &Origin, kind: &'static str) {
    counter!(
        "dev_proxy_responses_aborted_total",
        "route" => route.to_string(),
        "target" => target.to_string(),
        "kind" => kind
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_are_labelled_by_route_and_target() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let target: Origin = "http://localhost:8080".parse().unwrap();

        metrics::with_local_recorder(&recorder, || {
            record_request("GET", 200, "frontend", &target, Instant::now());
            record_upstream_error("frontend", &target, "connect");
            record_abort("frontend", &target, "idle_timeout");
        });

        let rendered = handle.render();
        assert!(rendered.contains(
            r#"dev_proxy_requests_total{method="GET",status="200",route="frontend",target="http://localhost:8080"} 1"#
        ), "{rendered}");
        assert!(rendered.contains(
            r#"dev_proxy_upstream_errors_total{route="frontend",target="http://localhost:8080",kind="connect"} 1"#
        ), "{rendered}");
        assert!(rendered.contains("dev_proxy_responses_aborted_total"), "{rendered}");
    }
}
