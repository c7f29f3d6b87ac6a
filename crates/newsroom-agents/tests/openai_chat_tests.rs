use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newsroom_agents::OpenAiChat;
use newsroom_core::traits::GenerativeProvider;
use newsroom_core::{ProviderError, ProviderErrorCode};

async fn generate_blocking(base: String, prompt: &'static str) -> Result<String, ProviderError> {
    tokio::task::spawn_blocking(move || {
        OpenAiChat::new("sk-test", &base, "gpt-4o-mini", 0.4, 900, Duration::from_secs(5))?.generate(prompt)
    })
    .await
    .expect("blocking task")
}

#[tokio::test]
async fn returns_first_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 900,
            "messages": [{"role": "system"}, {"role": "user", "content": "write about cats"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Cats Rule\n\nOne."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = generate_blocking(format!("{}/v1", server.uri()), "write about cats").await.expect("generate");
    assert_eq!(answer, "Cats Rule\n\nOne.");
}

#[tokio::test]
async fn missing_content_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": null}}]
        })))
        .mount(&server)
        .await;

    let err = generate_blocking(format!("{}/v1", server.uri()), "x").await.unwrap_err();
    assert_eq!(err.code, ProviderErrorCode::InvalidResponse);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let err = generate_blocking(format!("{}/v1", server.uri()), "x").await.unwrap_err();
    assert_eq!(err.code, ProviderErrorCode::InvalidResponse);
}

#[tokio::test]
async fn http_statuses_map_to_codes_without_retry() {
    for (status, code) in [
        (401, ProviderErrorCode::Auth),
        (429, ProviderErrorCode::RateLimited),
        (503, ProviderErrorCode::Server),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let err = generate_blocking(format!("{}/v1", server.uri()), "x").await.unwrap_err();
        assert_eq!(err.code, code, "status {}", status);
    }
}

#[test]
fn empty_key_or_model_is_config_error() {
    let err = OpenAiChat::new("", "http://localhost", "gpt-4o-mini", 0.4, 10, Duration::from_secs(1)).err().unwrap();
    assert_eq!(err.code, ProviderErrorCode::Config);
    let err = OpenAiChat::new("sk", "http://localhost", " ", 0.4, 10, Duration::from_secs(1)).err().unwrap();
    assert_eq!(err.code, ProviderErrorCode::Config);
}
