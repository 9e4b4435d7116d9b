//! Content filter service

use crate::analyzer::AiAnalyzer;
use crate::config::ServiceConfig;
use crate::rules::{LocalRules, RuleMatch};
use contentguard_cache::CacheStats;
use contentguard_core::{
    AiFilterResult, ContentType, FilterLevel, FilterResult, ModerationContext, Result,
};
use contentguard_providers::{new_provider, AiProvider};
use contentguard_telemetry::{CacheMonitor, DecisionStage, FilterMetrics, FilterMetricsSnapshot};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const SENSITIVE_WORD_SCORE: f64 = 1.0;
const PATTERN_SCORE: f64 = 0.8;

const SENSITIVE_WORD_CATEGORY: &str = "sensitive_words";
const PATTERN_CATEGORY: &str = "pattern_match";
const AI_BLOCK_REASON: &str = "AI model detected inappropriate content";

/// Staged moderation of user content
///
/// Safe to share across tasks; rule and level updates take effect for the
/// next call without interrupting in-flight ones.
pub struct ContentFilterService {
    rules: RwLock<LocalRules>,
    level: RwLock<FilterLevel>,
    analyzer: AiAnalyzer,
    metrics: FilterMetrics,
    monitor: Option<CacheMonitor<AiFilterResult>>,
}

impl ContentFilterService {
    /// Service with no local rules and a default-sized analyzer cache
    pub fn new(provider: Arc<dyn AiProvider>, level: FilterLevel) -> Self {
        Self::with_analyzer(AiAnalyzer::new(provider), level)
    }

    pub fn with_analyzer(analyzer: AiAnalyzer, level: FilterLevel) -> Self {
        Self {
            rules: RwLock::new(LocalRules::new()),
            level: RwLock::new(level),
            analyzer,
            metrics: FilterMetrics::new(),
            monitor: None,
        }
    }

    /// Build the provider, rules, cache and (optionally) monitor from config.
    ///
    /// Starting the monitor requires a tokio runtime.
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        config.validate()?;

        let provider = new_provider(config.provider.clone())?;
        let analyzer =
            AiAnalyzer::with_cache(provider, config.cache.max_entries, config.cache.ttl());
        let mut service = Self::with_analyzer(analyzer, config.level);

        service.load_sensitive_words(&config.sensitive_words)?;
        for pattern in &config.patterns {
            service.add_regex_pattern(pattern)?;
        }

        if config.monitor.enabled {
            let monitor =
                CacheMonitor::new(service.analyzer.cache(), config.monitor.to_monitor_config())?;
            monitor.start()?;
            service.monitor = Some(monitor);
        }

        info!(
            provider = service.analyzer.provider_name(),
            level = %config.level,
            words = config.sensitive_words.len(),
            patterns = config.patterns.len(),
            "Content filter service initialized"
        );
        Ok(service)
    }

    /// Moderate one piece of content.
    ///
    /// Local rule hits never error. Analyzer failures are returned so the
    /// caller can decide how to treat unanalyzable content.
    #[instrument(skip(self, ctx, content), fields(content_type = %content_type))]
    pub async fn filter(
        &self,
        ctx: &ModerationContext,
        content: &str,
        content_type: ContentType,
    ) -> Result<FilterResult> {
        let start = Instant::now();
        self.metrics.record_request();

        let result = self.run_stages(ctx, content, content_type).await;
        self.metrics
            .record_latency(start.elapsed().as_micros() as u64);
        result
    }

    async fn run_stages(
        &self,
        ctx: &ModerationContext,
        content: &str,
        content_type: ContentType,
    ) -> Result<FilterResult> {
        // Guard released before the analyzer await
        let local = self.rules.read().check(content);
        match local {
            Some(RuleMatch::Word(word)) => {
                debug!(word = %word, "Blocked by sensitive word");
                self.metrics.record_blocked(DecisionStage::SensitiveWord);
                return Ok(FilterResult::blocked(
                    SENSITIVE_WORD_SCORE,
                    SENSITIVE_WORD_CATEGORY,
                    format!("Contains sensitive word: {}", word),
                ));
            }
            Some(RuleMatch::Pattern(pattern)) => {
                debug!(pattern = %pattern, "Blocked by pattern");
                self.metrics.record_blocked(DecisionStage::Pattern);
                return Ok(FilterResult::blocked(
                    PATTERN_SCORE,
                    PATTERN_CATEGORY,
                    format!("Matches forbidden pattern: {}", pattern),
                ));
            }
            None => {}
        }

        let analyzer_start = Instant::now();
        let analysis = self.analyzer.analyze(ctx, content, content_type).await;
        self.metrics
            .record_analyzer_latency(analyzer_start.elapsed().as_micros() as u64);

        let analysis = match analysis {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, provider = self.analyzer.provider_name(), "AI analysis failed");
                self.metrics.record_analyzer_error();
                return Err(e);
            }
        };

        let level = *self.level.read();
        if level.should_block(analysis.score) {
            debug!(score = analysis.score, level = %level, "Blocked by AI analysis");
            self.metrics.record_blocked(DecisionStage::Ai);
            Ok(FilterResult::from_analysis(
                analysis,
                Some(AI_BLOCK_REASON.to_string()),
            ))
        } else {
            self.metrics.record_passed();
            Ok(FilterResult::from_analysis(analysis, None))
        }
    }

    /// Add sensitive words; existing words are kept
    pub fn load_sensitive_words<I, S>(&self, words: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let added = self.rules.write().add_words(words)?;
        info!(added, "Sensitive words loaded");
        Ok(added)
    }

    /// Append a regex pattern; an invalid pattern leaves the list unchanged
    pub fn add_regex_pattern(&self, pattern: &str) -> Result<()> {
        self.rules.write().add_pattern(pattern)?;
        debug!(pattern, "Regex pattern added");
        Ok(())
    }

    /// Change the filter level for subsequent calls
    pub fn update_config(&self, level: FilterLevel) {
        let previous = std::mem::replace(&mut *self.level.write(), level);
        info!(from = %previous, to = %level, "Filter level updated");
    }

    pub fn level(&self) -> FilterLevel {
        *self.level.read()
    }

    /// Analyzer cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.analyzer.cache_stats()
    }

    pub fn metrics(&self) -> FilterMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stop the monitor and the cache sweep
    pub fn shutdown(&self) {
        if let Some(monitor) = &self.monitor {
            monitor.stop();
        }
        self.analyzer.cache().close();
    }
}
