//! Prometheus text exposition format.

use crate::gauges::{Gauges, GAUGES};

/// Render every gauge into Prometheus text format.
pub fn render_prometheus(gauges: &Gauges) -> String {
    let mut out = String::new();
    for desc in GAUGES {
        out.push_str(&format!("# HELP {} {}\n", desc.name, desc.help));
        out.push_str(&format!("# TYPE {} gauge\n", desc.name));
        out.push_str(&format!("{} {}\n", desc.name, (desc.read)(gauges).get()));
    }
    out
}
