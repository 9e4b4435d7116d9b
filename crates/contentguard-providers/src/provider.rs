//! Provider trait and factory

use crate::azure::AzureProvider;
use crate::config::{ProviderConfig, ProviderType};
use crate::google::GoogleProvider;
use crate::openai::OpenAiProvider;
use crate::tencent::TencentProvider;
use async_trait::async_trait;
use contentguard_core::{AiFilterResult, ContentType, ModerationContext, Result};
use std::sync::Arc;
use tracing::info;

/// A moderation vendor
///
/// Non-text content is passed as a URL the vendor fetches itself.
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn analyze_text(&self, ctx: &ModerationContext, text: &str) -> Result<AiFilterResult>;

    async fn analyze_image(
        &self,
        ctx: &ModerationContext,
        image_url: &str,
    ) -> Result<AiFilterResult>;

    async fn analyze_audio(
        &self,
        ctx: &ModerationContext,
        audio_url: &str,
    ) -> Result<AiFilterResult>;

    async fn analyze_video(
        &self,
        ctx: &ModerationContext,
        video_url: &str,
    ) -> Result<AiFilterResult>;

    /// Vendor name, as used by the category tables
    fn name(&self) -> &str;

    /// Dispatch on content type
    async fn analyze(
        &self,
        ctx: &ModerationContext,
        content: &str,
        content_type: ContentType,
    ) -> Result<AiFilterResult> {
        match content_type {
            ContentType::Text => self.analyze_text(ctx, content).await,
            ContentType::Image => self.analyze_image(ctx, content).await,
            ContentType::Audio => self.analyze_audio(ctx, content).await,
            ContentType::Video => self.analyze_video(ctx, content).await,
        }
    }
}

/// Build the adapter for `config.provider_type`, validating its credentials
pub fn new_provider(config: ProviderConfig) -> Result<Arc<dyn AiProvider>> {
    let provider_type = config.provider_type;
    let provider: Arc<dyn AiProvider> = match provider_type {
        ProviderType::OpenAi => Arc::new(OpenAiProvider::new(config)?),
        ProviderType::Azure => Arc::new(AzureProvider::new(config)?),
        ProviderType::Google => Arc::new(GoogleProvider::new(config)?),
        ProviderType::Tencent => Arc::new(TencentProvider::new(config)?),
    };

    info!(provider = %provider_type, "AI provider initialized");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentguard_core::Error;

    #[tokio::test]
    async fn test_factory_builds_each_vendor() {
        let configs = vec![
            ProviderConfig::new(ProviderType::OpenAi, "sk-test"),
            ProviderConfig::new(ProviderType::Azure, "key")
                .with_endpoint("https://westus.api.cognitive.microsoft.com"),
            ProviderConfig::new(ProviderType::Google, "token").with_region("my-project"),
            ProviderConfig::new(ProviderType::Tencent, "AKID").with_secret("secret"),
        ];

        for config in configs {
            let expected = config.provider_type.as_str();
            let provider = new_provider(config).unwrap();
            assert_eq!(provider.name(), expected);
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected() {
        let cases = vec![
            ProviderConfig::new(ProviderType::OpenAi, ""),
            ProviderConfig::new(ProviderType::Azure, "key"),
            ProviderConfig::new(ProviderType::Google, "token"),
            ProviderConfig::new(ProviderType::Tencent, "AKID"),
        ];

        for config in cases {
            let result = new_provider(config);
            assert!(matches!(result, Err(Error::Config(_))));
        }
    }

    #[tokio::test]
    async fn test_unsupported_modality() {
        let provider = new_provider(
            ProviderConfig::new(ProviderType::Azure, "key").with_endpoint("http://127.0.0.1:9"),
        )
        .unwrap();

        let ctx = ModerationContext::new();
        let err = provider
            .analyze(&ctx, "https://cdn.example.com/clip.mp4", ContentType::Video)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedContentType {
                content_type: ContentType::Video,
                ..
            }
        ));
    }
}
