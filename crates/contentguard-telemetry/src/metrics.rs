//! Filter decision metrics
//!
//! Counters are kept twice: in process as atomics for [`FilterMetrics::snapshot`],
//! and through the `metrics` facade for whatever exporter the host installs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Pipeline stage that produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionStage {
    SensitiveWord,
    Pattern,
    Ai,
}

impl DecisionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SensitiveWord => "sensitive_word",
            Self::Pattern => "pattern",
            Self::Ai => "ai",
        }
    }
}

/// Register metric descriptions with the installed recorder
pub fn describe_metrics() {
    metrics::describe_counter!(
        "contentguard_filter_requests_total",
        "Total number of filter calls"
    );
    metrics::describe_counter!(
        "contentguard_filter_decisions_total",
        "Filter outcomes by stage (block, pass, error)"
    );
    metrics::describe_histogram!(
        "contentguard_filter_latency_us",
        metrics::Unit::Microseconds,
        "End-to-end filter latency"
    );
    metrics::describe_histogram!(
        "contentguard_analyzer_latency_us",
        metrics::Unit::Microseconds,
        "AI analyzer latency, cache hits included"
    );
}

/// Metrics collector for the content filter
#[derive(Clone)]
pub struct FilterMetrics {
    inner: Arc<FilterMetricsInner>,
}

struct FilterMetricsInner {
    total_requests: AtomicU64,
    blocked_sensitive_word: AtomicU64,
    blocked_pattern: AtomicU64,
    blocked_ai: AtomicU64,
    passed: AtomicU64,
    analyzer_errors: AtomicU64,
    analyzer_calls: AtomicU64,
    analyzer_latency_us: AtomicU64,
    total_latency_us: AtomicU64,
}

impl FilterMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FilterMetricsInner {
                total_requests: AtomicU64::new(0),
                blocked_sensitive_word: AtomicU64::new(0),
                blocked_pattern: AtomicU64::new(0),
                blocked_ai: AtomicU64::new(0),
                passed: AtomicU64::new(0),
                analyzer_errors: AtomicU64::new(0),
                analyzer_calls: AtomicU64::new(0),
                analyzer_latency_us: AtomicU64::new(0),
                total_latency_us: AtomicU64::new(0),
            }),
        }
    }

    /// Record a filter call
    pub fn record_request(&self) {
        self.inner.total_requests.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("contentguard_filter_requests_total").increment(1);
    }

    /// Record content blocked at `stage`
    pub fn record_blocked(&self, stage: DecisionStage) {
        let counter = match stage {
            DecisionStage::SensitiveWord => &self.inner.blocked_sensitive_word,
            DecisionStage::Pattern => &self.inner.blocked_pattern,
            DecisionStage::Ai => &self.inner.blocked_ai,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            "contentguard_filter_decisions_total",
            "stage" => stage.as_str(),
            "outcome" => "block"
        )
        .increment(1);
    }

    /// Record content that passed every stage
    pub fn record_passed(&self) {
        self.inner.passed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            "contentguard_filter_decisions_total",
            "stage" => DecisionStage::Ai.as_str(),
            "outcome" => "pass"
        )
        .increment(1);
    }

    /// Record a failed analyzer call
    pub fn record_analyzer_error(&self) {
        self.inner.analyzer_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            "contentguard_filter_decisions_total",
            "stage" => DecisionStage::Ai.as_str(),
            "outcome" => "error"
        )
        .increment(1);
    }

    /// Record analyzer latency
    pub fn record_analyzer_latency(&self, latency_us: u64) {
        self.inner.analyzer_calls.fetch_add(1, Ordering::Relaxed);
        self.inner
            .analyzer_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
        metrics::histogram!("contentguard_analyzer_latency_us").record(latency_us as f64);
    }

    /// Record end-to-end filter latency
    pub fn record_latency(&self, latency_us: u64) {
        self.inner
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
        metrics::histogram!("contentguard_filter_latency_us").record(latency_us as f64);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> FilterMetricsSnapshot {
        FilterMetricsSnapshot {
            total_requests: self.inner.total_requests.load(Ordering::Relaxed),
            blocked_sensitive_word: self.inner.blocked_sensitive_word.load(Ordering::Relaxed),
            blocked_pattern: self.inner.blocked_pattern.load(Ordering::Relaxed),
            blocked_ai: self.inner.blocked_ai.load(Ordering::Relaxed),
            passed: self.inner.passed.load(Ordering::Relaxed),
            analyzer_errors: self.inner.analyzer_errors.load(Ordering::Relaxed),
            analyzer_calls: self.inner.analyzer_calls.load(Ordering::Relaxed),
            analyzer_latency_us: self.inner.analyzer_latency_us.load(Ordering::Relaxed),
            total_latency_us: self.inner.total_latency_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for FilterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, PartialEq)]
pub struct FilterMetricsSnapshot {
    pub total_requests: u64,
    pub blocked_sensitive_word: u64,
    pub blocked_pattern: u64,
    pub blocked_ai: u64,
    pub passed: u64,
    pub analyzer_errors: u64,
    pub analyzer_calls: u64,
    pub analyzer_latency_us: u64,
    pub total_latency_us: u64,
}

impl FilterMetricsSnapshot {
    /// Content blocked at any stage
    pub fn total_blocked(&self) -> u64 {
        self.blocked_sensitive_word + self.blocked_pattern + self.blocked_ai
    }

    /// Calculate block rate
    pub fn block_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_blocked() as f64 / self.total_requests as f64
        }
    }

    /// Calculate average latency per request
    pub fn avg_latency_us(&self) -> u64 {
        if self.total_requests == 0 {
            0
        } else {
            self.total_latency_us / self.total_requests
        }
    }

    /// Calculate average analyzer latency per call
    pub fn avg_analyzer_latency_us(&self) -> u64 {
        if self.analyzer_calls == 0 {
            0
        } else {
            self.analyzer_latency_us / self.analyzer_calls
        }
    }
}
