//! Cache statistics snapshots and alert thresholds

use contentguard_core::{ContentType, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time view of cache health
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of entries currently held
    pub size: usize,

    /// Sum of declared entry sizes in bytes
    pub memory_usage: u64,

    /// hits / (hits + misses) over the manager's lifetime
    pub hit_rate: f64,

    /// Mean lookup latency in milliseconds
    pub avg_access_time: f64,

    /// Entries past their TTL that the sweep has not removed yet
    pub expired_entries: usize,

    pub hits: u64,

    pub misses: u64,

    /// Breakdown per content type
    pub type_stats: BTreeMap<ContentType, TypeStats>,
}

impl CacheStats {
    /// Total lookups recorded
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of held entries that are stale; 0 for an empty cache
    pub fn expired_ratio(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.expired_entries as f64 / self.size as f64
        }
    }
}

/// Statistics for one content type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeStats {
    pub count: usize,
    pub hit_rate: f64,
    /// Mean lookup latency in milliseconds
    pub avg_latency: f64,
}

/// Alert thresholds evaluated against [`CacheStats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheThresholds {
    /// Minimum acceptable hit rate
    pub hit_rate_min: f64,

    /// Maximum memory usage in bytes
    pub memory_usage_max: f64,

    /// Maximum average access time in milliseconds
    pub avg_access_time_max: f64,

    /// Maximum ratio of stale entries to held entries
    pub expired_ratio_max: f64,
}

impl Default for CacheThresholds {
    fn default() -> Self {
        Self {
            hit_rate_min: 0.7,
            memory_usage_max: 100e6,
            avg_access_time_max: 100.0,
            expired_ratio_max: 0.2,
        }
    }
}

impl CacheThresholds {
    /// Set a threshold by its configuration name
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "hit_rate_min" => self.hit_rate_min = value,
            "memory_usage_max" => self.memory_usage_max = value,
            "avg_access_time_max" => self.avg_access_time_max = value,
            "expired_ratio_max" => self.expired_ratio_max = value,
            other => {
                return Err(Error::validation(format!("unknown cache threshold '{}'", other)))
            }
        }
        Ok(())
    }

    /// Human-readable description of every violated threshold.
    ///
    /// The hit-rate check is skipped until at least one lookup has happened.
    pub fn violations(&self, stats: &CacheStats) -> Vec<String> {
        let mut alerts = Vec::new();

        let memory_mb = stats.memory_usage as f64 / (1024.0 * 1024.0);
        let memory_max_mb = self.memory_usage_max / (1024.0 * 1024.0);
        if stats.memory_usage as f64 > self.memory_usage_max {
            alerts.push(format!(
                "High memory usage: {:.2} MB (threshold: {:.2} MB)",
                memory_mb, memory_max_mb
            ));
        }

        if stats.accesses() > 0 && stats.hit_rate < self.hit_rate_min {
            alerts.push(format!(
                "Low hit rate: {:.2}% (threshold: {:.2}%)",
                stats.hit_rate * 100.0,
                self.hit_rate_min * 100.0
            ));
        }

        if stats.avg_access_time > self.avg_access_time_max {
            alerts.push(format!(
                "High average access time: {:.2} ms (threshold: {:.2} ms)",
                stats.avg_access_time, self.avg_access_time_max
            ));
        }

        let expired_ratio = stats.expired_ratio();
        if expired_ratio > self.expired_ratio_max {
            alerts.push(format!(
                "High expired entries ratio: {:.2}% (threshold: {:.2}%)",
                expired_ratio * 100.0,
                self.expired_ratio_max * 100.0
            ));
        }

        alerts
    }
}
