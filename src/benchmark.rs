//! Benchmark module - Control loop timing metrics

pub mod metrics;

pub use metrics::{MetricsReport, TimingMetrics};
