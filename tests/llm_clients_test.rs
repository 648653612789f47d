use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

use contact_cleaner::config::{Config, LlmConfig};
use contact_cleaner::error::CleanerError;
use contact_cleaner::resolver::{
    EngineState, LlmClient, NameResolver, OllamaClient, OpenAiClient, RetryPolicy,
};
use contact_cleaner::types::{NameInput, ResolutionMethod};

fn llm_config(server: &MockServer) -> LlmConfig {
    LlmConfig {
        openai_api_key: Some("test-key".to_string()),
        openai_base_url: server.base_url(),
        ollama_base_url: server.base_url(),
        remote_timeout_seconds: 5,
        local_timeout_seconds: 5,
        ..LlmConfig::default()
    }
}

fn stacy() -> NameInput {
    NameInput::new("STACY ROCK", "CATERED TOO INC", "AP@CATEREDTOO.COM")
}

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"total_tokens": 420}
    })
}

#[tokio::test]
async fn test_openai_client_parses_strict_json() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key")
                .body_includes("STACY ROCK");
            then.status(200)
                .json_body(chat_completion(r#"{"first_name": "Stacy", "last_name": "Rock"}"#));
        })
        .await;

    let client = OpenAiClient::new(&llm_config(&server)).expect("client");
    let parsed = client.parse_name(&stacy()).await.expect("parsed");

    mock.assert_async().await;
    assert_eq!(parsed.first_name.as_deref(), Some("Stacy"));
    assert_eq!(parsed.last_name.as_deref(), Some("Rock"));
    assert_eq!(parsed.tokens_used, Some(420));
}

#[tokio::test]
async fn test_openai_client_rejects_prose_and_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions").body_includes("JOHN");
            then.status(200)
                .json_body(chat_completion("The first name is John."));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions").body_includes("STACY");
            then.status(500).body("upstream exploded");
        })
        .await;

    let client = OpenAiClient::new(&llm_config(&server)).expect("client");

    let err = client
        .parse_name(&NameInput::new("JOHN", "", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, CleanerError::RemoteLlm(_)));

    let err = client.parse_name(&stacy()).await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[test]
fn test_openai_client_requires_key() {
    let config = LlmConfig {
        openai_api_key: Some("   ".to_string()),
        ..LlmConfig::default()
    };
    assert!(matches!(OpenAiClient::new(&config), Err(CleanerError::Config(_))));
}

#[tokio::test]
async fn test_ollama_client_extracts_embedded_json() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_includes("\"stream\":false");
            then.status(200).json_body(json!({
                "model": "qwen2.5:7b-instruct-q4_K_M",
                "response": "Sure! {\"first\": \"Tamera\", \"lastName\": \"Garlock\"} // initial matches email",
                "done": true
            }));
        })
        .await;

    let client = OllamaClient::new(&llm_config(&server)).expect("client");
    let parsed = client
        .parse_name(&NameInput::new("KOREY KOENIG-DAMIENS & TAMERA", "", "tgarlock@x.com"))
        .await
        .expect("parsed");

    mock.assert_async().await;
    assert_eq!(parsed.first_name.as_deref(), Some("Tamera"));
    assert_eq!(parsed.last_name.as_deref(), Some("Garlock"));
}

#[tokio::test]
async fn test_ollama_health_check() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({"models": []}));
        })
        .await;
    let client = OllamaClient::new(&llm_config(&server)).expect("client");
    assert!(client.health_check().await);

    let unreachable = LlmConfig {
        ollama_base_url: "http://127.0.0.1:1".to_string(),
        ..LlmConfig::default()
    };
    let client = OllamaClient::new(&unreachable).expect("client");
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn test_cascade_retries_remote_then_uses_local() {
    let server = MockServer::start_async().await;
    let remote = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503).body("overloaded");
        })
        .await;
    let local = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .json_body(json!({"response": "{\"first_name\": \"Stacy\", \"last_name\": \"Rock\"}"}));
        })
        .await;

    let config = llm_config(&server);
    let resolver = NameResolver::new(
        Some(Box::new(OpenAiClient::new(&config).expect("remote"))),
        Some(Box::new(OllamaClient::new(&config).expect("local"))),
        RetryPolicy {
            max_attempts: 2,
            delay: Duration::ZERO,
        },
    );
    let mut state = EngineState::from_config(&Config::default());

    let result = resolver.resolve(&mut state, &stacy()).await;

    remote.assert_calls_async(2).await;
    local.assert_calls_async(1).await;
    assert_eq!(result.method(), ResolutionMethod::LocalLlm);
    assert_eq!(result.first_name(), Some("Stacy"));
    assert_eq!(result.last_name(), Some("Rock"));
    assert_eq!(state.stats.local_llm, 1);
    assert_eq!(state.stats.errors, 1);
    assert_eq!(state.budget.current_cost(), 0.0);
}
