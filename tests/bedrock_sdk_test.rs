//! Wiremock integration tests for BedrockSdkClient.
//!
//! The SDK signs every request with SigV4; these tests point it at a mock
//! endpoint with static credentials and check the wire exchange.

use hermod::config::{Config, Secrets};
use hermod::providers::bedrock_sdk::static_credentials;
use hermod::providers::{ConverseMessage, ConverseRequest, ModelProvider};
use hermod::{BedrockSdkClient, HermodBuilder, HermodError, Message};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header_regex, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> BedrockSdkClient {
    BedrockSdkClient::connect(
        "us-east-1",
        Some(static_credentials("AKIDTEST", "test-secret", None)),
        Some(&server.uri()),
    )
    .await
}

fn request(model_id: &str) -> ConverseRequest {
    ConverseRequest {
        model_id: model_id.to_string(),
        messages: vec![ConverseMessage::user("Say hello")],
        system: Some("Be terse".to_string()),
        temperature: 0.5,
        max_tokens: 50,
    }
}

fn converse_ok() -> serde_json::Value {
    json!({
        "output": {
            "message": {
                "role": "assistant",
                "content": [{"text": "Hel"}, {"text": "lo!"}]
            }
        },
        "stopReason": "end_turn",
        "usage": {"inputTokens": 12, "outputTokens": 8, "totalTokens": 20},
        "metrics": {"latencyMs": 210}
    })
}

/// A signed converse call carries the conversation and limits.
#[tokio::test]
async fn test_signed_converse_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/model/test-model/converse"))
        .and(header_regex(
            "authorization",
            r"^AWS4-HMAC-SHA256 Credential=AKIDTEST/\d{8}/us-east-1/bedrock/aws4_request",
        ))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": [{"text": "Say hello"}]}],
            "system": [{"text": "Be terse"}],
            "inferenceConfig": {"maxTokens": 50, "temperature": 0.5}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(converse_ok()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let reply = client(&mock_server)
        .await
        .converse(&request("test-model"))
        .await
        .expect("converse should succeed");

    assert_eq!(reply.content.as_deref(), Some("Hello!"));
    assert_eq!(reply.stop_reason.as_deref(), Some("end_turn"));
    let usage = reply.usage.unwrap();
    assert_eq!(usage.input_tokens, Some(12));
    assert_eq!(usage.output_tokens, Some(8));
    assert_eq!(usage.total_tokens, Some(20));
}

/// Inference-profile ARNs stay one path segment.
#[tokio::test]
async fn test_arn_model_id_is_one_segment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/model/arn[^/]*inference-profile%2Fus\.amazon\.nova-lite-v1[^/]*/converse$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(converse_ok()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let arn = "arn:aws:bedrock:us-east-1:123456789012:inference-profile/us.amazon.nova-lite-v1:0";
    let reply = client(&mock_server).await.converse(&request(arn)).await;
    assert!(reply.is_ok(), "{reply:?}");
}

/// Service errors keep the AWS error code and message.
#[tokio::test]
async fn test_service_error_code_and_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header(
                    "x-amzn-ErrorType",
                    "ValidationException:http://internal.amazon.com/coral/com.amazon.bedrock/",
                )
                .set_body_json(json!({"message": "The provided model identifier is invalid."})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .await
        .converse(&request("bogus"))
        .await
        .unwrap_err();

    match err {
        HermodError::Provider { code, message } => {
            assert_eq!(code, "ValidationException");
            assert_eq!(message, "The provided model identifier is invalid.");
        }
        other => panic!("expected Provider error, got {other:?}"),
    }
}

/// IAM keys in the secrets file are enough to route through configuration.
#[tokio::test]
async fn test_router_from_config_with_iam_keys() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/model/us\.amazon\.nova-lite-v1(%3A|:)0/converse$"))
        .and(header_regex(
            "authorization",
            r"^AWS4-HMAC-SHA256 Credential=AKIDFILE/",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(converse_ok()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config: Config = toml::from_str(&format!(
        "[provider]\nregion = \"us-east-1\"\nendpoint = \"{}\"\n",
        mock_server.uri()
    ))
    .unwrap();
    let secrets: Secrets = toml::from_str(
        "[aws]\naccess_key_id = \"AKIDFILE\"\nsecret_access_key = \"file-secret\"\n",
    )
    .unwrap();

    let router = HermodBuilder::from_config(&config, &secrets)
        .await
        .unwrap()
        .build()
        .unwrap();

    let messages = [Message::user("Say hello")];
    let first = router.route("nova-lite", &messages, 0.7, 50).await.unwrap();
    let second = router.route("nova-lite", &messages, 0.7, 50).await.unwrap();

    assert_eq!(first.content, "Hello!");
    assert_eq!(first.usage.total_tokens, 20);
    assert!(!first.cached);
    assert!(second.cached);
}
