//! ContentGuard Telemetry
//!
//! Observability for the moderation pipeline.
//!
//! Provides:
//! - A periodic cache health monitor with threshold alerts
//! - Filter decision counters and latency metrics

pub mod metrics;
pub mod monitor;

pub use metrics::{describe_metrics, DecisionStage, FilterMetrics, FilterMetricsSnapshot};
pub use monitor::{AlertCallback, CacheMonitor, MonitorConfig};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::{DecisionStage, FilterMetrics};
    pub use crate::monitor::{CacheMonitor, MonitorConfig};
}
