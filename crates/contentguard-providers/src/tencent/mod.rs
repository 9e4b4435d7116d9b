//! Tencent Cloud content security (TMS, IMS, AMS, VMS)
//!
//! Text and image moderation answer synchronously. Audio and video create a
//! moderation task that is then polled with `DescribeTaskDetail` until it
//! reports `Success` or `Failed`, or the [`PollPolicy`] runs out.
//!
//! Every vendor score is on a 0-100 scale and is divided by 100 before
//! normalization.

mod signer;

pub use signer::Tc3Signer;

use crate::config::ProviderConfig;
use crate::http::{max_score, ResultCache, VendorClient};
use crate::provider::AiProvider;
use crate::standardize::standardize;
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use contentguard_core::{AiFilterResult, ContentType, Error, ModerationContext, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const NAME: &str = "tencent";
const API_VERSION: &str = "2020-12-29";
const DEFAULT_REGION: &str = "ap-guangzhou";
const BIZ_TYPE: &str = "default";

/// Sub-scores above this (0-100) are called out in the suggestions
const DETAIL_SCORE: f64 = 70.0;

/// Polling schedule for asynchronous moderation tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before each status query
    pub interval: Duration,
    /// Status queries before giving up
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const AUDIO: PollPolicy = PollPolicy {
        interval: Duration::from_secs(2),
        max_attempts: 10,
    };

    pub const VIDEO: PollPolicy = PollPolicy {
        interval: Duration::from_secs(5),
        max_attempts: 30,
    };

    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// One Tencent Cloud product endpoint
struct ServiceTarget {
    service: &'static str,
    url: String,
    host: String,
}

impl ServiceTarget {
    fn new(service: &'static str, endpoint: &str) -> Result<Self> {
        let url = if endpoint.is_empty() {
            format!("https://{}.tencentcloudapi.com", service)
        } else {
            endpoint.trim_end_matches('/').to_string()
        };

        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| Error::config(format!("invalid tencent endpoint '{}': {}", url, e)))?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(Error::config(format!("tencent endpoint '{}' has no host", url))),
        };

        Ok(Self { service, url, host })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TextModeration {
    #[serde(default)]
    suggestion: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    keywords: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LabelScore {
    #[serde(default)]
    label: String,
    #[serde(default)]
    sub_label: String,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ImageModeration {
    #[serde(default)]
    suggestion: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    sub_label: String,
    #[serde(default)]
    score: f64,
    porn_info: Option<LabelScore>,
    terrorism_info: Option<LabelScore>,
    politics_info: Option<LabelScore>,
    ads_info: Option<LabelScore>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AudioTaskRequest<'a> {
    tasks: [AudioTaskInput<'a>; 1],
    biz_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AudioTaskInput<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AudioTaskCreated {
    #[serde(default)]
    results: Vec<TaskHandle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskHandle {
    #[serde(default)]
    task_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FrameResult {
    #[serde(default)]
    label: String,
    #[serde(default)]
    sub_label: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SegmentResult {
    #[serde(default)]
    label: String,
    #[serde(default)]
    sub_label: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    start_time: i64,
    #[serde(default)]
    end_time: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskDetail {
    #[serde(default)]
    status: String,
    #[serde(default)]
    suggestion: String,
    #[serde(default)]
    labels: Option<Vec<LabelScore>>,
    #[serde(default)]
    audio_text: String,
    #[serde(default)]
    image_results: Option<Vec<FrameResult>>,
    #[serde(default)]
    audio_results: Option<Vec<SegmentResult>>,
}

/// Tencent Cloud adapter; the only vendor covering all four content types
pub struct TencentProvider {
    client: VendorClient,
    cache: ResultCache,
    signer: Tc3Signer,
    region: String,
    text: ServiceTarget,
    image: ServiceTarget,
    audio: ServiceTarget,
    video: ServiceTarget,
    audio_polling: PollPolicy,
    video_polling: PollPolicy,
}

impl TencentProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.require("API key", &config.api_key)?;
        config.require("API secret", &config.api_secret)?;

        let region = if config.region.is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            config.region.clone()
        };

        Ok(Self {
            client: VendorClient::new(NAME)?,
            cache: ResultCache::new(),
            signer: Tc3Signer::new(config.api_key.clone(), config.api_secret.clone()),
            region,
            text: ServiceTarget::new("tms", &config.endpoint)?,
            image: ServiceTarget::new("ims", &config.endpoint)?,
            audio: ServiceTarget::new("ams", &config.endpoint)?,
            video: ServiceTarget::new("vms", &config.endpoint)?,
            audio_polling: PollPolicy::AUDIO,
            video_polling: PollPolicy::VIDEO,
        })
    }

    pub fn with_audio_polling(mut self, policy: PollPolicy) -> Self {
        self.audio_polling = policy;
        self
    }

    pub fn with_video_polling(mut self, policy: PollPolicy) -> Self {
        self.video_polling = policy;
        self
    }

    /// Signed call to `action`, returning the decoded `Response` object
    async fn call<B, T>(
        &self,
        ctx: &ModerationContext,
        target: &ServiceTarget,
        action: &str,
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_string(body)?;
        let timestamp = Utc::now().timestamp();
        let authorization =
            self.signer
                .authorization(target.service, &target.host, &payload, timestamp)?;

        let request = self
            .client
            .post(&target.url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, authorization)
            .header("X-TC-Action", action)
            .header("X-TC-Version", API_VERSION)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Region", &self.region)
            .body(payload);

        let raw = self.client.send_raw(ctx, request).await?;
        let envelope: Envelope = self.client.decode(&raw)?;

        if let Some(error) = envelope.response.get("Error") {
            let error: ApiError = serde_json::from_value(error.clone())
                .map_err(|e| Error::decode(format!("invalid tencent error payload: {}", e)))?;
            warn!(action, code = %error.code, "Tencent API error");
            return Err(Error::Provider {
                provider: NAME.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(envelope.response)
            .map_err(|e| Error::decode(format!("invalid tencent {} response: {}", action, e)))
    }

    /// Query a task until it settles
    async fn poll_task(
        &self,
        ctx: &ModerationContext,
        target: &ServiceTarget,
        task_id: &str,
        policy: PollPolicy,
    ) -> Result<TaskDetail> {
        let query = json!({ "TaskId": task_id });

        for attempt in 1..=policy.max_attempts {
            ctx.sleep(policy.interval).await?;

            let detail: TaskDetail = self
                .call(ctx, target, "DescribeTaskDetail", &query)
                .await?;

            if detail.status == "Success" {
                return Ok(detail);
            }
            if detail.status == "Failed" {
                return Err(Error::TaskFailed {
                    task_id: task_id.to_string(),
                });
            }
            debug!(task_id, attempt, status = %detail.status, "Moderation task pending");
        }

        Err(Error::TaskTimeout {
            task_id: task_id.to_string(),
            attempts: policy.max_attempts,
        })
    }

    async fn moderate_text(&self, ctx: &ModerationContext, text: &str) -> Result<AiFilterResult> {
        let body = json!({
            "Content": base64::engine::general_purpose::STANDARD.encode(text.as_bytes()),
        });
        let response: TextModeration = self.call(ctx, &self.text, "TextModeration", &body).await?;

        let score = response.score / 100.0;
        let mut raw = HashMap::new();
        raw.insert(response.label.clone(), score);

        let mut suggestions = Vec::new();
        if let Some(keywords) = response.keywords.filter(|k| !k.is_empty()) {
            suggestions.push(format!("Found sensitive keywords: {}", keywords.join(", ")));
        }
        suggestions.push(format!("Suggestion: {}", response.suggestion));

        Ok(AiFilterResult {
            score,
            categories: standardize(NAME, &raw),
            suggestions,
        })
    }

    async fn moderate_image(
        &self,
        ctx: &ModerationContext,
        image_url: &str,
    ) -> Result<AiFilterResult> {
        let body = json!({ "FileUrl": image_url });
        let response: ImageModeration =
            self.call(ctx, &self.image, "ImageModeration", &body).await?;

        let details = [
            ("Porn", "Adult", &response.porn_info),
            ("Terror", "Violence", &response.terrorism_info),
            ("Politics", "Political", &response.politics_info),
            ("Ad", "Advertisement", &response.ads_info),
        ];

        let mut raw = HashMap::new();
        raw.insert(response.label.clone(), response.score / 100.0);
        for (label, _, info) in &details {
            if let Some(info) = info.as_ref().filter(|i| i.score > 0.0) {
                raw.insert(label.to_string(), info.score / 100.0);
            }
        }

        let mut suggestions = vec![format!("Overall category: {}", response.label)];
        if !response.sub_label.is_empty() {
            suggestions.push(format!("Sub-category: {}", response.sub_label));
        }
        for (_, kind, info) in &details {
            if let Some(info) = info.as_ref().filter(|i| i.score > DETAIL_SCORE) {
                suggestions.push(format!(
                    "{} content detected: {} ({})",
                    kind, info.label, info.sub_label
                ));
            }
        }
        suggestions.push(format!("Action suggestion: {}", response.suggestion));

        let score = max_score(
            std::iter::once(response.score)
                .chain(details.iter().filter_map(|(_, _, info)| info.as_ref().map(|i| i.score))),
        );

        Ok(AiFilterResult {
            score: score / 100.0,
            categories: standardize(NAME, &raw),
            suggestions,
        })
    }

    async fn moderate_audio(
        &self,
        ctx: &ModerationContext,
        audio_url: &str,
    ) -> Result<AiFilterResult> {
        let request = AudioTaskRequest {
            tasks: [AudioTaskInput { url: audio_url }],
            biz_type: BIZ_TYPE,
        };
        let created: AudioTaskCreated = self
            .call(ctx, &self.audio, "CreateAudioModerationTask", &request)
            .await?;

        let task_id = created
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::decode("no audio moderation task created"))?
            .task_id;
        if task_id.is_empty() {
            return Err(Error::decode("audio moderation task has no id"));
        }
        debug!(task_id = %task_id, "Audio moderation task created");

        let detail = self
            .poll_task(ctx, &self.audio, &task_id, self.audio_polling)
            .await?;
        let labels = detail.labels.unwrap_or_default();

        let mut suggestions = Vec::new();
        if !detail.audio_text.is_empty() {
            suggestions.push(format!("Transcribed text: {}", detail.audio_text));
        }
        for label in labels.iter().filter(|l| l.score > DETAIL_SCORE) {
            suggestions.push(format!("Detected {} content ({})", label.label, label.sub_label));
        }
        suggestions.push(format!("Action suggestion: {}", detail.suggestion));

        Ok(AiFilterResult {
            score: max_score(labels.iter().map(|l| l.score)) / 100.0,
            categories: standardize(NAME, &label_scores(&labels)),
            suggestions,
        })
    }

    async fn moderate_video(
        &self,
        ctx: &ModerationContext,
        video_url: &str,
    ) -> Result<AiFilterResult> {
        let body = json!({ "VideoUrl": video_url, "BizType": BIZ_TYPE });
        let created: TaskHandle = self
            .call(ctx, &self.video, "CreateVideoModerationTask", &body)
            .await?;
        if created.task_id.is_empty() {
            return Err(Error::decode("video moderation task has no id"));
        }
        debug!(task_id = %created.task_id, "Video moderation task created");

        let detail = self
            .poll_task(ctx, &self.video, &created.task_id, self.video_polling)
            .await?;
        let labels = detail.labels.unwrap_or_default();
        let frames = detail.image_results.unwrap_or_default();
        let segments = detail.audio_results.unwrap_or_default();

        let mut suggestions = vec![format!("Overall suggestion: {}", detail.suggestion)];
        if !frames.is_empty() {
            suggestions.push("Suspicious video frames:".to_string());
            for frame in frames.iter().filter(|f| f.score > DETAIL_SCORE) {
                suggestions.push(format!(
                    "- At {}: Detected {} content ({}) with score {}%",
                    clock(frame.timestamp),
                    frame.label,
                    frame.sub_label,
                    frame.score
                ));
            }
        }
        if !segments.is_empty() {
            suggestions.push("Suspicious audio segments:".to_string());
            for segment in segments.iter().filter(|s| s.score > DETAIL_SCORE) {
                suggestions.push(format!(
                    "- From {} to {}: Detected {} content ({})",
                    clock(segment.start_time),
                    clock(segment.end_time),
                    segment.label,
                    segment.sub_label
                ));
                if !segment.text.is_empty() {
                    suggestions.push(format!("  Text: {}", segment.text));
                }
            }
        }

        let score = max_score(
            labels
                .iter()
                .map(|l| l.score)
                .chain(frames.iter().map(|f| f.score))
                .chain(segments.iter().map(|s| s.score)),
        );

        Ok(AiFilterResult {
            score: score / 100.0,
            categories: standardize(NAME, &label_scores(&labels)),
            suggestions,
        })
    }
}

fn label_scores(labels: &[LabelScore]) -> HashMap<String, f64> {
    labels
        .iter()
        .map(|l| (l.label.clone(), l.score / 100.0))
        .collect()
}

/// `HH:MM:SS` for a vendor timestamp in seconds
fn clock(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

#[async_trait]
impl AiProvider for TencentProvider {
    async fn analyze_text(&self, ctx: &ModerationContext, text: &str) -> Result<AiFilterResult> {
        self.cache
            .get_or_analyze(ContentType::Text, text, self.moderate_text(ctx, text))
            .await
    }

    async fn analyze_image(
        &self,
        ctx: &ModerationContext,
        image_url: &str,
    ) -> Result<AiFilterResult> {
        self.cache
            .get_or_analyze(ContentType::Image, image_url, self.moderate_image(ctx, image_url))
            .await
    }

    async fn analyze_audio(
        &self,
        ctx: &ModerationContext,
        audio_url: &str,
    ) -> Result<AiFilterResult> {
        self.cache
            .get_or_analyze(ContentType::Audio, audio_url, self.moderate_audio(ctx, audio_url))
            .await
    }

    async fn analyze_video(
        &self,
        ctx: &ModerationContext,
        video_url: &str,
    ) -> Result<AiFilterResult> {
        self.cache
            .get_or_analyze(ContentType::Video, video_url, self.moderate_video(ctx, video_url))
            .await
    }

    fn name(&self) -> &str {
        NAME
    }
}
