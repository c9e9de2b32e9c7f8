mod common;

use dishscout_common::DishError;
use dishscout_llm::gemini::GeminiClient;
use dishscout_llm::grounding::GroundingChunk;
use dishscout_llm::traits::LlmClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-test";
const GENERATE_PATH: &str = "/models/gemini-test:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key".to_string(), MODEL.to_string())
        .expect("client builds")
        .with_endpoint(server.uri())
        .with_timeout(Duration::from_secs(2))
}

fn ok_body() -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    { "text": "## Top Japanese in Singapore\n" },
                    { "text": "- **Sushi Tei**: $$" }
                ]
            },
            "finishReason": "STOP",
            "groundingMetadata": {
                "groundingChunks": [
                    { "maps": { "uri": "https://maps.google.com/?cid=1", "title": "Sushi Tei" } },
                    { "web": { "uri": "https://example.com", "title": "Example" } }
                ]
            }
        }],
        "usageMetadata": { "promptTokenCount": 40, "candidatesTokenCount": 60, "totalTokenCount": 100 },
        "modelVersion": "gemini-test-001"
    })
}

#[tokio::test]
async fn generate_returns_text_and_grounding() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "find food" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).generate("find food").await.expect("ok");

    assert_eq!(
        response.text,
        "## Top Japanese in Singapore\n- **Sushi Tei**: $$"
    );
    assert_eq!(response.model.as_deref(), Some("gemini-test-001"));
    assert_eq!(response.tokens_used, Some(100));
    let meta = response.grounding_metadata.expect("grounding");
    assert_eq!(meta.grounding_chunks.len(), 2);
    assert_eq!(
        meta.grounding_chunks[0],
        GroundingChunk::maps("https://maps.google.com/?cid=1", "Sushi Tei")
    );
}

#[tokio::test]
async fn maps_grounding_adds_the_tool() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({ "tools": [{ "googleMaps": {} }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).with_maps_grounding(true);
    client.generate("find food").await.expect("ok");
}

#[tokio::test]
async fn server_error_is_a_service_error_and_not_retried() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).generate("find food").await.unwrap_err();
    match err {
        DishError::Service { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "The model is overloaded.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_is_a_configuration_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).generate("find food").await.unwrap_err();
    assert!(err.is_config(), "got {err:?}");
}

#[tokio::test]
async fn rate_limit_is_reported() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = client_for(&server).generate("find food").await.unwrap_err();
    assert!(matches!(err, DishError::Service { status: 429, .. }));
}

#[tokio::test]
async fn safety_block_is_an_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).generate("find food").await.unwrap_err();
    assert!(matches!(err, DishError::Service { .. }));
}

#[tokio::test]
async fn empty_candidates_is_an_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server).generate("find food").await.unwrap_err();
    assert!(matches!(err, DishError::Service { .. }));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server).generate("find food").await.unwrap_err();
    assert!(matches!(err, DishError::Decode(_)));
}

#[tokio::test]
async fn slow_service_times_out() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).with_timeout(Duration::from_millis(300));
    let err = client.generate("find food").await.unwrap_err();
    assert!(matches!(err, DishError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    common::init_test_tracing();
    let client = GeminiClient::new("test-key".into(), MODEL.into())
        .unwrap()
        .with_endpoint("http://127.0.0.1:9")
        .with_timeout(Duration::from_secs(2));

    let err = client.generate("find food").await.unwrap_err();
    assert!(
        matches!(err, DishError::Transport(_) | DishError::Timeout),
        "got {err:?}"
    );
}
