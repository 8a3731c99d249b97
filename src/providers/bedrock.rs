//! Amazon Bedrock Converse API client.
//!
//! Talks to the runtime endpoint over HTTPS with a Bedrock API key sent as a
//! bearer token. IAM-signed access goes through
//! [`BedrockSdkClient`](super::BedrockSdkClient) instead. See:
//! <https://docs.aws.amazon.com/bedrock/latest/APIReference/API_runtime_Converse.html>

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::traits::{
    ConverseMessage, ConverseReply, ConverseRequest, ConverseRole, ModelProvider, ReplyUsage,
};
use crate::{HermodError, Result};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Error code reported for failures that never reached Bedrock.
pub const TRANSPORT_ERROR: &str = "TransportError";

/// Client for the Bedrock runtime `Converse` operation.
#[derive(Clone)]
pub struct BedrockClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl BedrockClient {
    /// Client for the public runtime endpoint of `region`.
    pub fn new(region: &str, api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, endpoint_for_region(region))
    }

    /// Client with a custom base URL (VPC endpoints, wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            api_key: api_key.into(),
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/model/{model_id}/converse`, with the model id as one
    /// percent-encoded path segment (ARNs carry `/`).
    fn converse_url(&self, model_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            HermodError::Configuration(format!("invalid Bedrock endpoint '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                HermodError::Configuration(format!(
                    "Bedrock endpoint '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["model", model_id, "converse"]);
        Ok(url)
    }

    /// Map a non-success response to a provider error.
    ///
    /// The code comes from `x-amzn-ErrorType` (suffix after `:` dropped) or
    /// the HTTP status; the message from the JSON body when it has one.
    async fn error_from_response(response: reqwest::Response) -> HermodError {
        let status = response.status();
        let code = response
            .headers()
            .get("x-amzn-ErrorType")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(':').next())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP{}", status.as_u16()));

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });

        HermodError::provider(code, message)
    }
}

/// Runtime endpoint for a region.
pub fn endpoint_for_region(region: &str) -> String {
    format!("https://bedrock-runtime.{region}.amazonaws.com")
}

#[async_trait]
impl ModelProvider for BedrockClient {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseReply> {
        let url = self.converse_url(&request.model_id)?;
        let body = ConverseBody::from_request(request);

        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| HermodError::provider(TRANSPORT_ERROR, e.to_string()))?;

        if !response.status().is_success() {
            let err = Self::error_from_response(response).await;
            warn!(model_id = %request.model_id, error = %err, "bedrock converse failed");
            return Err(err);
        }

        let output: ConverseOutput = response
            .json()
            .await
            .map_err(|e| HermodError::provider(TRANSPORT_ERROR, e.to_string()))?;

        Ok(output.into_reply())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseBody<'a> {
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<TextBlock<'a>>,
    inference_config: InferenceConfig,
}

impl<'a> ConverseBody<'a> {
    fn from_request(request: &'a ConverseRequest) -> Self {
        Self {
            messages: request.messages.iter().map(WireMessage::from).collect(),
            system: request
                .system
                .as_deref()
                .map(|text| vec![TextBlock { text }])
                .unwrap_or_default(),
            inference_config: InferenceConfig {
                max_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: ConverseRole,
    content: [TextBlock<'a>; 1],
}

impl<'a> From<&'a ConverseMessage> for WireMessage<'a> {
    fn from(msg: &'a ConverseMessage) -> Self {
        Self {
            role: msg.role,
            content: [TextBlock { text: &msg.content }],
        }
    }
}

#[derive(Serialize)]
struct TextBlock<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseOutput {
    #[serde(default)]
    output: Option<OutputBody>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

impl ConverseOutput {
    fn into_reply(self) -> ConverseReply {
        // Non-text blocks (tool use, reasoning) are ignored.
        let texts: Vec<String> = self
            .output
            .and_then(|o| o.message)
            .map(|m| m.content.into_iter().filter_map(|b| b.text).collect())
            .unwrap_or_default();
        let content = if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        };

        ConverseReply {
            content,
            usage: self.usage.map(|u| ReplyUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
                total_tokens: u.total_tokens,
            }),
            stop_reason: self.stop_reason,
        }
    }
}

#[derive(Deserialize)]
struct OutputBody {
    #[serde(default)]
    message: Option<OutputMessage>,
}

#[derive(Deserialize)]
struct OutputMessage {
    #[serde(default)]
    content: Vec<OutputBlock>,
}

#[derive(Deserialize)]
struct OutputBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "Message")]
    message: Option<String>,
}
