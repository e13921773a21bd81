//! Prometheus counters for the service, exported on their own port.

use std::net::SocketAddr;

use axum::{http::header, response::IntoResponse, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use sortwatch_core::telemetry::{HOST_STATS, REQUEST_METRICS};
use sortwatch_core::{BenchmarkReport, RecordOutcome};

lazy_static! {
    pub static ref HTTP_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests served",
        &["endpoint", "status"]
    )
    .expect("http_requests_total registers once");
    pub static ref SORT_DURATION: HistogramVec = register_histogram_vec!(
        "sort_duration_seconds",
        "Wall-clock time of one instrumented sort",
        &["algorithm"],
        vec![0.000_01, 0.000_1, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500, 1.0]
    )
    .expect("sort_duration_seconds registers once");
    pub static ref TELEMETRY_WRITE_FAILURES: IntCounterVec = register_int_counter_vec!(
        "telemetry_write_failures_total",
        "Telemetry appends that failed and were dropped",
        &["collection"]
    )
    .expect("telemetry_write_failures_total registers once");
}

/// Count one served request and any telemetry appends it lost.
pub fn observe_request(endpoint: &str, status: u16, outcome: RecordOutcome) {
    let status = status.to_string();
    HTTP_REQUESTS
        .with_label_values(&[endpoint, status.as_str()])
        .inc();
    if !outcome.request_metric {
        TELEMETRY_WRITE_FAILURES
            .with_label_values(&[REQUEST_METRICS])
            .inc();
    }
    if !outcome.host_stat {
        TELEMETRY_WRITE_FAILURES.with_label_values(&[HOST_STATS]).inc();
    }
}

pub fn observe_sorts(report: &BenchmarkReport) {
    for result in report.results() {
        SORT_DURATION
            .with_label_values(&[result.algorithm.as_str()])
            .observe(result.elapsed.as_secs_f64());
    }
}

/// Render the default registry in the text exposition format.
pub fn render() -> String {
    let encoder = TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|_| String::from("Encoding error"))
}

async fn scrape() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], render())
}

/// Start the exporter in a background task.
pub fn start_metrics_server(addr: SocketAddr) {
    lazy_static::initialize(&HTTP_REQUESTS);
    lazy_static::initialize(&SORT_DURATION);
    lazy_static::initialize(&TELEMETRY_WRITE_FAILURES);

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(scrape));
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!("Prometheus exporter listening on http://{}", addr);
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!("Prometheus exporter stopped: {}", e);
                }
            }
            Err(e) => {
                tracing::error!("Failed to bind metrics server: {}", e);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_request_counts_failures() {
        let outcome = RecordOutcome {
            request_metric: false,
            host_stat: true,
        };
        let before = TELEMETRY_WRITE_FAILURES
            .with_label_values(&[REQUEST_METRICS])
            .get();
        observe_request("/unit-test", 200, outcome);

        assert_eq!(
            TELEMETRY_WRITE_FAILURES
                .with_label_values(&[REQUEST_METRICS])
                .get(),
            before + 1
        );
        assert!(render().contains("http_requests_total"));
    }
}
