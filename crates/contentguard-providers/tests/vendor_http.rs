//! Vendor adapters against mock HTTP servers

use contentguard_core::{ContentType, Error, ModerationContext};
use contentguard_providers::tencent::TencentProvider;
use contentguard_providers::{new_provider, AiProvider, PollPolicy, ProviderConfig, ProviderType};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tencent(server: &MockServer) -> TencentProvider {
    let config = ProviderConfig::new(ProviderType::Tencent, "AKIDTEST")
        .with_secret("secret")
        .with_endpoint(server.uri());
    TencentProvider::new(config)
        .unwrap()
        .with_audio_polling(PollPolicy::new(Duration::from_millis(10), 5))
        .with_video_polling(PollPolicy::new(Duration::from_millis(10), 3))
}

#[tokio::test]
async fn test_openai_text_and_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/moderations"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "input": "you are awful" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "modr-1",
            "results": [{
                "flagged": true,
                "categories": { "harassment": true, "hate": false, "violence": false },
                "category_scores": { "harassment": 0.92, "hate": 0.31, "violence": 0.01 }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = new_provider(
        ProviderConfig::new(ProviderType::OpenAi, "sk-test").with_endpoint(server.uri()),
    )
    .unwrap();
    let ctx = ModerationContext::new();

    let result = provider.analyze(&ctx, "you are awful", ContentType::Text).await.unwrap();
    assert_eq!(result.score, 0.92);
    assert_eq!(result.categories.get("harassment"), Some(&true));
    assert!(!result.categories.contains_key("hate_speech"));
    assert_eq!(result.suggestions, vec!["Content contains inappropriate harassment"]);

    // Served from the vendor cache; the mock expects exactly one call
    let again = provider.analyze_text(&ctx, "you are awful").await.unwrap();
    assert_eq!(again, result);
}

#[tokio::test]
async fn test_openai_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/moderations"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let provider = new_provider(
        ProviderConfig::new(ProviderType::OpenAi, "sk-test").with_endpoint(server.uri()),
    )
    .unwrap();

    let err = provider
        .analyze_text(&ModerationContext::new(), "hello")
        .await
        .unwrap_err();
    match err {
        Error::Status { provider, status, body } => {
            assert_eq!(provider, "openai");
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_openai_undecodable_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let provider = new_provider(
        ProviderConfig::new(ProviderType::OpenAi, "sk-test").with_endpoint(server.uri()),
    )
    .unwrap();

    let err = provider
        .analyze_text(&ModerationContext::new(), "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[tokio::test]
async fn test_azure_text_screen() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contentmoderator/moderate/v1.0/ProcessText/Screen"))
        .and(query_param("classify", "True"))
        .and(header("Ocp-Apim-Subscription-Key", "azure-key"))
        .and(header("content-type", "text/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Classification": {
                "Category1": { "Score": 0.82 },
                "Category2": { "Score": 0.6 },
                "Category3": { "Score": 0.1 }
            },
            "Terms": [{ "Index": 3, "Term": "crap" }]
        })))
        .mount(&server)
        .await;

    let provider = new_provider(
        ProviderConfig::new(ProviderType::Azure, "azure-key").with_endpoint(server.uri()),
    )
    .unwrap();

    let result = provider
        .analyze_text(&ModerationContext::new(), "what crap")
        .await
        .unwrap();
    assert_eq!(result.score, 0.82);
    assert_eq!(result.categories.len(), 1);
    assert_eq!(result.categories.get("adult_content"), Some(&true));
    assert_eq!(result.suggestions, vec!["Found inappropriate term: crap"]);
}

#[tokio::test]
async fn test_azure_image_evaluate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contentmoderator/moderate/v1.0/ProcessImage/Evaluate"))
        .and(body_partial_json(json!({
            "DataRepresentation": "URL",
            "Value": "https://cdn.example.com/a.jpg"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AdultClassificationScore": 0.95,
            "RacyClassificationScore": 0.4,
            "IsImageAdultClassified": true,
            "IsImageRacyClassified": false
        })))
        .mount(&server)
        .await;

    let provider = new_provider(
        ProviderConfig::new(ProviderType::Azure, "azure-key").with_endpoint(server.uri()),
    )
    .unwrap();

    let result = provider
        .analyze(&ModerationContext::new(), "https://cdn.example.com/a.jpg", ContentType::Image)
        .await
        .unwrap();
    assert_eq!(result.score, 0.95);
    assert_eq!(result.categories.get("adult_content"), Some(&true));
    assert_eq!(result.suggestions, vec!["Image contains adult content"]);
}

#[tokio::test]
async fn test_google_text_analyze() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/my-project/locations/global/text:analyze"))
        .and(header("authorization", "Bearer ya29.token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": [
                { "name": "violence", "confidence": 0.85 },
                { "name": "adult", "confidence": 0.2 },
                { "name": "spam", "confidence": 0.75 }
            ]
        })))
        .mount(&server)
        .await;

    let provider = new_provider(
        ProviderConfig::new(ProviderType::Google, "ya29.token")
            .with_region("my-project")
            .with_endpoint(server.uri()),
    )
    .unwrap();

    let result = provider
        .analyze_text(&ModerationContext::new(), "fight me")
        .await
        .unwrap();
    assert_eq!(result.score, 0.85);
    assert_eq!(result.categories.keys().collect::<Vec<_>>(), vec!["violence"]);
    assert_eq!(
        result.suggestions,
        vec![
            "High confidence (0.85) of violence content",
            "High confidence (0.75) of spam content",
        ]
    );
}

#[tokio::test]
async fn test_tencent_text_signed_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("X-TC-Action", "TextModeration"))
        .and(header("X-TC-Version", "2020-12-29"))
        .and(header("X-TC-Region", "ap-guangzhou"))
        .and(header_regex(
            "authorization",
            r"^TC3-HMAC-SHA256 Credential=AKIDTEST/\d{4}-\d{2}-\d{2}/tms/tc3_request, SignedHeaders=content-type;host, Signature=[0-9a-f]{64}$",
        ))
        .and(body_partial_json(json!({ "Content": "YnV5IGNoZWFwIHBpbGxz" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": {
                "Suggestion": "Block",
                "Label": "Ad",
                "Score": 80,
                "Keywords": ["cheap pills"],
                "RequestId": "req-1"
            }
        })))
        .mount(&server)
        .await;

    let provider = tencent(&server);
    let result = provider
        .analyze_text(&ModerationContext::new(), "buy cheap pills")
        .await
        .unwrap();

    assert_eq!(result.score, 0.8);
    assert_eq!(result.categories.get("advertisement"), Some(&true));
    assert_eq!(
        result.suggestions,
        vec!["Found sensitive keywords: cheap pills", "Suggestion: Block"]
    );
}

#[tokio::test]
async fn test_tencent_image_sub_scores() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("X-TC-Action", "ImageModeration"))
        .and(body_partial_json(json!({ "FileUrl": "https://cdn.example.com/b.png" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": {
                "Suggestion": "Block",
                "Label": "Porn",
                "SubLabel": "SexyBehavior",
                "Score": 60,
                "PornInfo": { "Label": "Porn", "SubLabel": "SexyBehavior", "Score": 91 },
                "AdsInfo": { "Label": "Ad", "SubLabel": "QRCode", "Score": 0 }
            }
        })))
        .mount(&server)
        .await;

    let provider = tencent(&server);
    let result = provider
        .analyze_image(&ModerationContext::new(), "https://cdn.example.com/b.png")
        .await
        .unwrap();

    assert_eq!(result.score, 0.91);
    assert_eq!(result.categories.keys().collect::<Vec<_>>(), vec!["adult_content"]);
    assert_eq!(
        result.suggestions,
        vec![
            "Overall category: Porn",
            "Sub-category: SexyBehavior",
            "Adult content detected: Porn (SexyBehavior)",
            "Action suggestion: Block",
        ]
    );
}

#[tokio::test]
async fn test_tencent_error_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": {
                "Error": {
                    "Code": "AuthFailure.SignatureFailure",
                    "Message": "The provided credentials could not be validated."
                },
                "RequestId": "req-2"
            }
        })))
        .mount(&server)
        .await;

    let err = tencent(&server)
        .analyze_text(&ModerationContext::new(), "hello")
        .await
        .unwrap_err();
    match err {
        Error::Provider { provider, code, .. } => {
            assert_eq!(provider, "tencent");
            assert_eq!(code, "AuthFailure.SignatureFailure");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_tencent_audio_polls_until_success() {
    let server = MockServer::start().await;
    Mock::given(header("X-TC-Action", "CreateAudioModerationTask"))
        .and(header_regex("authorization", "/ams/tc3_request"))
        .and(body_partial_json(json!({
            "Tasks": [{ "Url": "https://cdn.example.com/c.mp3" }],
            "BizType": "default"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": { "Results": [{ "TaskId": "task-audio", "Code": "OK" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(header("X-TC-Action", "DescribeTaskDetail"))
        .and(body_partial_json(json!({ "TaskId": "task-audio" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": { "TaskId": "task-audio", "Status": "Processing" }
        })))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(header("X-TC-Action", "DescribeTaskDetail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": {
                "TaskId": "task-audio",
                "Status": "Success",
                "Suggestion": "Block",
                "AudioText": "some transcript",
                "Labels": [
                    { "Label": "Porn", "Score": 88, "SubLabel": "Moan" },
                    { "Label": "Normal", "Score": 12, "SubLabel": "" }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = tencent(&server)
        .analyze(&ModerationContext::new(), "https://cdn.example.com/c.mp3", ContentType::Audio)
        .await
        .unwrap();

    assert_eq!(result.score, 0.88);
    assert_eq!(result.categories.get("adult_content"), Some(&true));
    assert_eq!(
        result.suggestions,
        vec![
            "Transcribed text: some transcript",
            "Detected Porn content (Moan)",
            "Action suggestion: Block",
        ]
    );
}

#[tokio::test]
async fn test_tencent_video_task_failed() {
    let server = MockServer::start().await;
    Mock::given(header("X-TC-Action", "CreateVideoModerationTask"))
        .and(body_partial_json(json!({ "VideoUrl": "https://cdn.example.com/d.mp4" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": { "TaskId": "task-video" }
        })))
        .mount(&server)
        .await;
    Mock::given(header("X-TC-Action", "DescribeTaskDetail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": { "TaskId": "task-video", "Status": "Failed" }
        })))
        .mount(&server)
        .await;

    let err = tencent(&server)
        .analyze_video(&ModerationContext::new(), "https://cdn.example.com/d.mp4")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TaskFailed { ref task_id } if task_id == "task-video"));
}

#[tokio::test]
async fn test_tencent_video_task_timeout() {
    let server = MockServer::start().await;
    Mock::given(header("X-TC-Action", "CreateVideoModerationTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": { "TaskId": "task-slow" }
        })))
        .mount(&server)
        .await;
    Mock::given(header("X-TC-Action", "DescribeTaskDetail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": { "TaskId": "task-slow", "Status": "Processing" }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let err = tencent(&server)
        .analyze_video(&ModerationContext::new(), "https://cdn.example.com/e.mp4")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TaskTimeout { attempts: 3, .. }));
    assert!(err.is_task_error());
}

#[tokio::test]
async fn test_deadline_abandons_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "results": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let provider = new_provider(
        ProviderConfig::new(ProviderType::OpenAi, "sk-test").with_endpoint(server.uri()),
    )
    .unwrap();

    let ctx = ModerationContext::with_timeout(Duration::from_millis(50));
    let err = provider.analyze_text(&ctx, "slow").await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded));
}

#[tokio::test]
async fn test_cancelled_context_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = ModerationContext::new();
    ctx.cancel();

    let err = tencent(&server).analyze_text(&ctx, "hello").await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}
