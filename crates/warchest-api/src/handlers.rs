//! HTTP handlers. Read-only: nothing here writes a gauge.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::ApiState;

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = warchest_metrics::render_prometheus(&state.gauges);
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
