//! Prometheus metrics for observability.
//!
//! - HTTP request metrics (latency, counts, in-flight)
//! - WebSocket connection metrics
//! - Queue operation counters (issued, served, finished, skipped)
//! - Paging failure counters

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "waitline_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("waitline_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "waitline_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures by surface (rest, ws).
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "waitline_auth_failures_total",
            "Total authentication failures",
        ),
        &["surface"],
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "waitline_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waitline_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket frames sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("waitline_ws_messages_sent_total", "WebSocket frames sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when a client falls behind its branch group).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waitline_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Queue Metrics
// =============================================================================

/// Tickets issued total.
pub static TICKETS_ISSUED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waitline_tickets_issued_total",
        "Total tickets issued since startup",
    )
    .unwrap()
});

/// Calls that served a ticket.
pub static CALLS_SERVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waitline_calls_served_total",
        "Call-next operations that served a ticket",
    )
    .unwrap()
});

/// Calls that found an empty queue.
pub static CALLS_EMPTY_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waitline_calls_empty_total",
        "Call-next operations that found nobody waiting",
    )
    .unwrap()
});

/// Tickets recorded finished.
pub static TICKETS_FINISHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waitline_tickets_finished_total",
        "Total tickets recorded finished",
    )
    .unwrap()
});

/// Tickets recorded skipped.
pub static TICKETS_SKIPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waitline_tickets_skipped_total",
        "Total tickets recorded skipped",
    )
    .unwrap()
});

/// Customer pages that failed after the retry.
pub static PAGE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waitline_page_failures_total",
        "Customer pages that failed after the single retry",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Queue
    registry
        .register(Box::new(TICKETS_ISSUED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(CALLS_SERVED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(CALLS_EMPTY_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(TICKETS_FINISHED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(TICKETS_SKIPPED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(PAGE_FAILURES_TOTAL.clone()))
        .unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collapse branch ids out of paths so the path label stays low-cardinality.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').collect();
    for i in 1..segments.len() {
        if segments[i - 1] == "branches" {
            segments[i] = "{branch}";
        }
    }
    segments.join("/")
}
