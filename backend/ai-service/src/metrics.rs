//! Prometheus metrics for ai-service.
//!
//! Exposes HTTP and orchestration collectors and the handler for the
//! `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, TextEncoder};

lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "ai_http_requests_total",
        "HTTP requests by route pattern and status class",
        &["method", "route", "status_class"]
    )
    .expect("failed to register ai_http_requests_total");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = prometheus::register_histogram_vec!(
        "ai_http_request_duration_seconds",
        "HTTP latency by route pattern",
        &["method", "route"],
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]
    )
    .expect("failed to register ai_http_request_duration_seconds");

    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGauge = prometheus::register_int_gauge!(
        "ai_http_requests_in_flight",
        "HTTP requests currently being served"
    )
    .expect("failed to register ai_http_requests_in_flight");

    pub static ref ANALYSIS_REQUESTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "ai_analysis_requests_total",
        "Analytical requests handled by the orchestrator",
        &["kind", "outcome"]
    )
    .expect("failed to register ai_analysis_requests_total");

    pub static ref ANALYSIS_DURATION_SECONDS: HistogramVec = prometheus::register_histogram_vec!(
        "ai_analysis_duration_seconds",
        "Orchestrator latency from receipt to completion",
        &["kind"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("failed to register ai_analysis_duration_seconds");
}

/// Record one orchestration outcome. `kind` is "unknown" when validation
/// failed before the kind could be read.
pub fn record_analysis(kind: &str, outcome: &str, duration_secs: f64) {
    ANALYSIS_REQUESTS_TOTAL
        .with_label_values(&[kind, outcome])
        .inc();
    ANALYSIS_DURATION_SECONDS
        .with_label_values(&[kind])
        .observe(duration_secs);
}

/// Record one served HTTP request. `route` is the matched pattern, or
/// "unmatched" for paths outside the route table.
pub fn record_http_request(method: &str, route: &str, status: u16, duration_secs: f64) {
    let status_class = match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    };

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, status_class])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route])
        .observe(duration_secs);
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
