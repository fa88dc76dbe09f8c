//! warchest-api — HTTP surface of the controller.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use warchest_metrics::Gauges;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub gauges: Arc<Gauges>,
}

/// Build the API router.
pub fn build_router(gauges: Arc<Gauges>) -> Router {
    Router::new()
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/healthz", get(handlers::healthz))
        .with_state(ApiState { gauges })
}
