//! Google content threat analysis

use crate::config::ProviderConfig;
use crate::http::{max_score, ResultCache, VendorClient};
use crate::provider::AiProvider;
use crate::standardize::standardize;
use async_trait::async_trait;
use contentguard_core::{AiFilterResult, ContentType, Error, ModerationContext, Result};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

const NAME: &str = "google";
const DEFAULT_BASE_URL: &str = "https://contentthreat.googleapis.com/v1beta1";

/// Confidence above which a category is called out in the suggestions
const SUGGESTION_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    categories: Vec<CategoryConfidence>,
}

#[derive(Debug, Deserialize)]
struct CategoryConfidence {
    name: String,
    confidence: f64,
}

/// Google adapter (text and image URLs); `region` carries the project id
pub struct GoogleProvider {
    config: ProviderConfig,
    client: VendorClient,
    cache: ResultCache,
    base_url: String,
}

impl GoogleProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.require("API key", &config.api_key)?;
        config.require("project id (region)", &config.region)?;
        let base_url = format!(
            "{}/projects/{}/locations/global",
            config.base_url(DEFAULT_BASE_URL),
            config.region
        );

        Ok(Self {
            client: VendorClient::new(NAME)?,
            cache: ResultCache::new(),
            base_url,
            config,
        })
    }

    async fn analyze_with(
        &self,
        ctx: &ModerationContext,
        method: &str,
        body: serde_json::Value,
        subject: &str,
    ) -> Result<AiFilterResult> {
        let request = self
            .client
            .post(&format!("{}/{}", self.base_url, method))
            .bearer_auth(&self.config.api_key)
            .json(&body);

        let response: AnalyzeResponse = self.client.send_json(ctx, request).await?;

        let raw: HashMap<String, f64> = response
            .categories
            .iter()
            .map(|c| (c.name.clone(), c.confidence))
            .collect();

        let suggestions = response
            .categories
            .iter()
            .filter(|c| c.confidence > SUGGESTION_CONFIDENCE)
            .map(|c| format!("High confidence ({:.2}) of {} {}", c.confidence, c.name, subject))
            .collect();

        Ok(AiFilterResult {
            score: max_score(response.categories.iter().map(|c| c.confidence)),
            categories: standardize(NAME, &raw),
            suggestions,
        })
    }
}

#[async_trait]
impl AiProvider for GoogleProvider {
    async fn analyze_text(&self, ctx: &ModerationContext, text: &str) -> Result<AiFilterResult> {
        let body = json!({ "text": text });
        self.cache
            .get_or_analyze(
                ContentType::Text,
                text,
                self.analyze_with(ctx, "text:analyze", body, "content"),
            )
            .await
    }

    async fn analyze_image(
        &self,
        ctx: &ModerationContext,
        image_url: &str,
    ) -> Result<AiFilterResult> {
        let body = json!({ "imageSource": { "imageUri": image_url } });
        self.cache
            .get_or_analyze(
                ContentType::Image,
                image_url,
                self.analyze_with(ctx, "image:analyze", body, "content in image"),
            )
            .await
    }

    async fn analyze_audio(&self, _ctx: &ModerationContext, _url: &str) -> Result<AiFilterResult> {
        Err(Error::unsupported(NAME, ContentType::Audio))
    }

    async fn analyze_video(&self, _ctx: &ModerationContext, _url: &str) -> Result<AiFilterResult> {
        Err(Error::unsupported(NAME, ContentType::Video))
    }

    fn name(&self) -> &str {
        NAME
    }
}
