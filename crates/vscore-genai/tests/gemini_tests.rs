//! Gemini client tests against a mock server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vscore_genai::{GeminiClient, GeminiConfig, GenAiError, GenerativeModel, ResponseFormat};

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    }))
}

fn client_for(server: &MockServer, models: &[&str]) -> GeminiClient {
    let config = GeminiConfig::new("test-key")
        .with_base_url(server.uri())
        .with_models(models.iter().copied());
    GeminiClient::new(config).unwrap()
}

#[tokio::test]
async fn test_generate_sends_generation_config() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/primary:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(text_response("{\"ok\": true}"))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server, &["primary"])
        .generate("score this", 0.3, ResponseFormat::Json)
        .await
        .unwrap();
    assert_eq!(text, "{\"ok\": true}");
}

#[tokio::test]
async fn test_falls_back_to_next_model() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/primary:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/models/secondary:generateContent"))
        .respond_with(text_response("from secondary"))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server, &["primary", "secondary"])
        .generate("prompt", 0.2, ResponseFormat::Text)
        .await
        .unwrap();
    assert_eq!(text, "from secondary");
}

#[tokio::test]
async fn test_all_models_failing_returns_last_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/primary:generateContent"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/models/secondary:generateContent"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
        .mount(&server)
        .await;

    let err = client_for(&server, &["primary", "secondary"])
        .generate("prompt", 0.2, ResponseFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, GenAiError::RateLimited(Some(2000))));
}

#[tokio::test]
async fn test_empty_candidates_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/primary:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = client_for(&server, &["primary"])
        .generate("prompt", 0.2, ResponseFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, GenAiError::InvalidResponse(_)));
}

#[test]
#[serial_test::serial]
fn test_config_from_env() {
    std::env::remove_var("GEMINI_API_KEY");
    assert!(matches!(GeminiConfig::from_env(), Err(GenAiError::Config(_))));

    std::env::set_var("GEMINI_API_KEY", "env-key");
    std::env::set_var("GEMINI_MODELS", "model-a, model-b,,");
    let config = GeminiConfig::from_env().unwrap();
    assert_eq!(config.models, vec!["model-a", "model-b"]);

    std::env::remove_var("GEMINI_API_KEY");
    std::env::remove_var("GEMINI_MODELS");
}
