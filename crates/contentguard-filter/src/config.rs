//! Service configuration (YAML)

use crate::analyzer::{DEFAULT_CACHE_ENTRIES, DEFAULT_CACHE_TTL};
use contentguard_cache::CacheThresholds;
use contentguard_core::{Error, FilterLevel, Result};
use contentguard_providers::ProviderConfig;
use contentguard_telemetry::MonitorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Full configuration for a [`ContentFilterService`](crate::ContentFilterService)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Strictness of the AI stage
    #[serde(default)]
    pub level: FilterLevel,

    /// Moderation vendor
    pub provider: ProviderConfig,

    /// Words that block content outright
    #[serde(default)]
    pub sensitive_words: Vec<String>,

    /// Regex patterns that block content, checked in order
    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub monitor: MonitorSettings,
}

/// Analyzer cache sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_entries: usize,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_ENTRIES,
            ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Cache monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub log_path: Option<PathBuf>,
    pub thresholds: CacheThresholds,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 60,
            log_path: None,
            thresholds: CacheThresholds::default(),
        }
    }
}

impl MonitorSettings {
    pub fn to_monitor_config(&self) -> MonitorConfig {
        let config = MonitorConfig::default()
            .with_interval(Duration::from_secs(self.interval_secs))
            .with_thresholds(self.thresholds.clone());
        match &self.log_path {
            Some(path) => config.with_log_path(path),
            None => config,
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            return Err(Error::config("cache.max_entries must be greater than zero"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(Error::config("cache.ttl_secs must be greater than zero"));
        }
        if self.monitor.enabled && self.monitor.interval_secs == 0 {
            return Err(Error::config("monitor.interval_secs must be greater than zero"));
        }
        Ok(())
    }
}
