//! Cached AI analysis stage

use contentguard_cache::{CacheManager, CacheStats};
use contentguard_core::{AiFilterResult, ContentType, ModerationContext, Result};
use contentguard_providers::AiProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default capacity of the analyzer cache
pub const DEFAULT_CACHE_ENTRIES: usize = 10_000;

/// Default lifetime of a cached verdict
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Provider front-ended by a result cache keyed on (content type, content)
pub struct AiAnalyzer {
    provider: Arc<dyn AiProvider>,
    cache: Arc<CacheManager<AiFilterResult>>,
}

impl AiAnalyzer {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self::with_cache(provider, DEFAULT_CACHE_ENTRIES, DEFAULT_CACHE_TTL)
    }

    pub fn with_cache(provider: Arc<dyn AiProvider>, max_entries: usize, ttl: Duration) -> Self {
        Self {
            provider,
            cache: Arc::new(CacheManager::new(max_entries, ttl)),
        }
    }

    /// Cached verdict, or a fresh one from the provider.
    ///
    /// Provider errors are returned as-is and never cached.
    pub async fn analyze(
        &self,
        ctx: &ModerationContext,
        content: &str,
        content_type: ContentType,
    ) -> Result<AiFilterResult> {
        if let Some(cached) = self.cache.get(content_type, content) {
            debug!(content_type = %content_type, "Analyzer cache hit");
            return Ok(cached);
        }

        let result = self.provider.analyze(ctx, content, content_type).await?;
        self.cache
            .set(content_type, content, result.clone(), estimate_size(content, &result));
        Ok(result)
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Shared handle to the cache, for monitoring
    pub fn cache(&self) -> Arc<CacheManager<AiFilterResult>> {
        self.cache.clone()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.get_stats()
    }
}

/// Rough byte cost of a cached verdict
fn estimate_size(content: &str, result: &AiFilterResult) -> u64 {
    let categories: usize = result.categories.keys().map(|k| k.len() + 1).sum();
    let suggestions: usize = result.suggestions.iter().map(String::len).sum();
    (content.len() + categories + suggestions + std::mem::size_of::<AiFilterResult>()) as u64
}
