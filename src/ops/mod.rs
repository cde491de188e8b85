//! Operational surfaces.
//!
//! - [`metrics`] - Evacuation request counters and snapshots

pub mod metrics;

pub use metrics::{EvacuationMetrics, MetricsSnapshot};
