//! Prometheus scrape endpoint

use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

fn render_metrics() -> prometheus::Result<(String, String)> {
    let encoder = TextEncoder::new();
    let families = crate::metrics::REGISTRY.gather();
    let text = encoder.encode_to_string(&families)?;
    Ok((text, encoder.format_type().to_string()))
}

async fn metrics_handler() -> Response {
    match render_metrics() {
        Ok((text, content_type)) => {
            ([(header::CONTENT_TYPE, content_type)], text).into_response()
        }
        Err(error) => {
            tracing::error!(%error, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}

/// Router for the `/metrics` endpoint, stateless on purpose so it can
/// be merged after the API routes take their state.
pub fn metrics_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(metrics_handler))
}
