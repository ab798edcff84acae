//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring and observability.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};

use super::info::record_uptime;
use crate::AppState;
use crate::metrics::REGISTRY;

/// GET /metrics
///
/// Returns all metrics in Prometheus text format.
/// Authentication is applied by the top-level router composition.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    record_uptime(&state);

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_text) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, encoder.format_type())],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}
