//! OpenAI moderation endpoint

use crate::config::ProviderConfig;
use crate::http::{max_score, ResultCache, VendorClient};
use crate::provider::AiProvider;
use crate::standardize::standardize;
use async_trait::async_trait;
use contentguard_core::{AiFilterResult, ContentType, Error, ModerationContext, Result};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

const NAME: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Image inputs are only accepted by the omni moderation model
const IMAGE_MODEL: &str = "omni-moderation-latest";

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    #[serde(default)]
    categories: BTreeMap<String, bool>,
    #[serde(default)]
    category_scores: HashMap<String, f64>,
}

/// OpenAI `/moderations` adapter (text and image URLs)
pub struct OpenAiProvider {
    config: ProviderConfig,
    client: VendorClient,
    cache: ResultCache,
    url: String,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.require("API key", &config.api_key)?;
        let url = format!("{}/moderations", config.base_url(DEFAULT_BASE_URL));

        Ok(Self {
            client: VendorClient::new(NAME)?,
            cache: ResultCache::new(),
            url,
            config,
        })
    }

    async fn moderate(
        &self,
        ctx: &ModerationContext,
        body: serde_json::Value,
    ) -> Result<AiFilterResult> {
        let request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.config.api_key)
            .json(&body);

        let response: ModerationResponse = self.client.send_json(ctx, request).await?;
        let result = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::decode("no moderation results returned"))?;

        let suggestions = result
            .categories
            .iter()
            .filter(|(_, flagged)| **flagged)
            .map(|(category, _)| format!("Content contains inappropriate {}", category))
            .collect();

        Ok(AiFilterResult {
            score: max_score(result.category_scores.values().copied()),
            categories: standardize(NAME, &result.category_scores),
            suggestions,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn analyze_text(&self, ctx: &ModerationContext, text: &str) -> Result<AiFilterResult> {
        self.cache
            .get_or_analyze(ContentType::Text, text, self.moderate(ctx, json!({ "input": text })))
            .await
    }

    async fn analyze_image(
        &self,
        ctx: &ModerationContext,
        image_url: &str,
    ) -> Result<AiFilterResult> {
        let body = json!({
            "model": IMAGE_MODEL,
            "input": [{ "type": "image_url", "image_url": { "url": image_url } }],
        });
        self.cache
            .get_or_analyze(ContentType::Image, image_url, self.moderate(ctx, body))
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
