use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static UPSTREAM_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "dge_upstream_requests_total",
        "Upstream calls issued by the proxy",
        &["method", "resource"]
    )
    .expect("register upstream_requests_total")
});

pub static UPSTREAM_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "dge_upstream_errors_total",
        "Upstream calls that failed, by error kind",
        &["resource", "kind"]
    )
    .expect("register upstream_errors_total")
});

pub static UPSTREAM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "dge_upstream_duration_seconds",
        "Upstream call duration in seconds",
        &["method"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("register upstream_duration")
});

pub static SESSIONS_EXPIRED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "dge_sessions_expired_total",
        "Sessions ended because the token expired or could not be decoded"
    )
    .expect("register sessions_expired_total")
});

pub static LIST_DEGRADED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "dge_list_degraded_total",
        "List requests answered with an empty page after an upstream failure"
    )
    .expect("register list_degraded_total")
});

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}
