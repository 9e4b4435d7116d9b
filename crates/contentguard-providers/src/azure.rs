//! Azure Content Moderator

use crate::config::ProviderConfig;
use crate::http::{max_score, ResultCache, VendorClient};
use crate::provider::AiProvider;
use crate::standardize::standardize;
use async_trait::async_trait;
use contentguard_core::{AiFilterResult, ContentType, Error, ModerationContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const NAME: &str = "azure";
const SUBSCRIPTION_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Classifier scores below this are not reported as raw categories
const TEXT_CATEGORY_FLOOR: f64 = 0.5;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScreenResponse {
    #[serde(default)]
    classification: Option<Classification>,
    #[serde(default)]
    terms: Option<Vec<Term>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Classification {
    #[serde(default)]
    category1: CategoryScore,
    #[serde(default)]
    category2: CategoryScore,
    #[serde(default)]
    category3: CategoryScore,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CategoryScore {
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Term {
    term: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct EvaluateRequest<'a> {
    data_representation: &'static str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EvaluateResponse {
    #[serde(default)]
    adult_classification_score: f64,
    #[serde(default)]
    racy_classification_score: f64,
    #[serde(default)]
    is_image_adult_classified: bool,
    #[serde(default)]
    is_image_racy_classified: bool,
}

/// Azure Content Moderator adapter (text and image URLs)
pub struct AzureProvider {
    config: ProviderConfig,
    client: VendorClient,
    cache: ResultCache,
    base_url: String,
}

impl AzureProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.require("API key", &config.api_key)?;
        config.require("endpoint", &config.endpoint)?;
        let base_url = format!("{}/contentmoderator/moderate/v1.0", config.base_url(""));

        Ok(Self {
            client: VendorClient::new(NAME)?,
            cache: ResultCache::new(),
            base_url,
            config,
        })
    }

    async fn screen_text(&self, ctx: &ModerationContext, text: &str) -> Result<AiFilterResult> {
        let request = self
            .client
            .post(&format!("{}/ProcessText/Screen", self.base_url))
            .query(&[("classify", "True")])
            .header(SUBSCRIPTION_HEADER, &self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(text.to_string());

        let response: ScreenResponse = self.client.send_json(ctx, request).await?;
        let classification = response.classification.unwrap_or_default();
        let scores = [
            ("Adult", classification.category1.score),
            ("Violence", classification.category2.score),
            ("Hate", classification.category3.score),
        ];

        let raw: HashMap<String, f64> = scores
            .iter()
            .filter(|(_, score)| *score > TEXT_CATEGORY_FLOOR)
            .map(|(label, score)| (label.to_string(), *score))
            .collect();

        let suggestions = response
            .terms
            .unwrap_or_default()
            .into_iter()
            .map(|t| format!("Found inappropriate term: {}", t.term))
            .collect();

        Ok(AiFilterResult {
            score: max_score(scores.iter().map(|(_, s)| *s)),
            categories: standardize(NAME, &raw),
            suggestions,
        })
    }

    async fn evaluate_image(
        &self,
        ctx: &ModerationContext,
        image_url: &str,
    ) -> Result<AiFilterResult> {
        let request = self
            .client
            .post(&format!("{}/ProcessImage/Evaluate", self.base_url))
            .header(SUBSCRIPTION_HEADER, &self.config.api_key)
            .json(&EvaluateRequest {
                data_representation: "URL",
                value: image_url,
            });

        let response: EvaluateResponse = self.client.send_json(ctx, request).await?;

        let mut raw = HashMap::new();
        let mut suggestions = Vec::new();
        if response.is_image_adult_classified {
            raw.insert("Adult".to_string(), response.adult_classification_score);
            suggestions.push("Image contains adult content".to_string());
        }
        if response.is_image_racy_classified {
            raw.insert("Racy".to_string(), response.racy_classification_score);
            suggestions.push("Image contains racy content".to_string());
        }

        Ok(AiFilterResult {
            score: response
                .adult_classification_score
                .max(response.racy_classification_score),
            categories: standardize(NAME, &raw),
            suggestions,
        })
    }
}

#[async_trait]
impl AiProvider for AzureProvider {
    async fn analyze_text(&self, ctx: &ModerationContext, text: &str) -> Result<AiFilterResult> {
        self.cache
            .get_or_analyze(ContentType::Text, text, self.screen_text(ctx, text))
            .await
    }

    async fn analyze_image(
        &self,
        ctx: &ModerationContext,
        image_url: &str,
    ) -> Result<AiFilterResult> {
        self.cache
            .get_or_analyze(ContentType::Image, image_url, self.evaluate_image(ctx, image_url))
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
