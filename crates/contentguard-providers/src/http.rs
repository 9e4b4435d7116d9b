//! Shared HTTP plumbing for vendor adapters

use contentguard_cache::CacheManager;
use contentguard_core::{AiFilterResult, ContentType, Error, ModerationContext, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const RESULT_CACHE_ENTRIES: usize = 1000;
const RESULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Approximate footprint of one cached verdict
const RESULT_SIZE_ESTIMATE: u64 = 1024;

/// reqwest client tagged with the vendor name for error context
pub(crate) struct VendorClient {
    client: reqwest::Client,
    provider: &'static str,
}

impl VendorClient {
    pub(crate) fn new(provider: &'static str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build {} HTTP client: {}", provider, e)))?;

        Ok(Self { client, provider })
    }

    pub(crate) fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }

    /// Send `request` under `ctx` and return the raw body of a 2xx response
    pub(crate) async fn send_raw(
        &self,
        ctx: &ModerationContext,
        request: reqwest::RequestBuilder,
    ) -> Result<String> {
        let provider = self.provider;
        ctx.run(async move {
            let response = request
                .send()
                .await
                .map_err(|e| Error::transport(format!("{} request failed: {}", provider, e)))?;

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                Error::transport(format!("{} response body unreadable: {}", provider, e))
            })?;

            if !status.is_success() {
                return Err(Error::Status {
                    provider: provider.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            debug!(provider, status = status.as_u16(), bytes = body.len(), "Vendor response");
            Ok(body)
        })
        .await
    }

    /// Send `request` and decode a 2xx JSON body into `T`
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        ctx: &ModerationContext,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let body = self.send_raw(ctx, request).await?;
        self.decode(&body)
    }

    pub(crate) fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T> {
        serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("invalid {} response: {}", self.provider, e)))
    }
}

/// Long-lived per-vendor verdict cache
pub(crate) struct ResultCache {
    inner: CacheManager<AiFilterResult>,
}

impl ResultCache {
    pub(crate) fn new() -> Self {
        Self {
            inner: CacheManager::new(RESULT_CACHE_ENTRIES, RESULT_CACHE_TTL),
        }
    }

    /// Serve a cached verdict or run `analyze` and remember its success
    pub(crate) async fn get_or_analyze<F>(
        &self,
        content_type: ContentType,
        content: &str,
        analyze: F,
    ) -> Result<AiFilterResult>
    where
        F: Future<Output = Result<AiFilterResult>>,
    {
        if let Some(cached) = self.inner.get(content_type, content) {
            debug!(content_type = %content_type, "Vendor cache hit");
            return Ok(cached);
        }

        let result = analyze.await?;
        self.inner
            .set(content_type, content, result.clone(), RESULT_SIZE_ESTIMATE);
        Ok(result)
    }
}

/// Highest score in `scores`, 0 when empty
pub(crate) fn max_score<I: IntoIterator<Item = f64>>(scores: I) -> f64 {
    scores.into_iter().fold(0.0, f64::max)
}
