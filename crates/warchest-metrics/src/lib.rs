//! warchest-metrics — observability for the warchest controller.
//!
//! # Architecture
//!
//! ```text
//! Gauges (Arc-shared)
//!   ├── set() ← decision engine, the only writer
//!   └── get() → metrics endpoint, any number of readers
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod gauges;
pub mod prometheus;

pub use gauges::{Gauge, Gauges};
pub use prometheus::render_prometheus;
