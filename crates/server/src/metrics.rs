use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use service::errors::ServiceError;

// Prometheus metrics (default registry)
pub static OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "todo_store_operations_total",
        "Todo store operations by outcome",
        &["operation", "outcome"]
    )
    .expect("register operations_total")
});

/// Count one call of `operation`; errors are labelled with their kind.
pub fn observe<T>(operation: &str, res: &Result<T, ServiceError>) {
    let outcome = match res {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    OPERATIONS_TOTAL.with_label_values(&[operation, outcome]).inc();
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}
