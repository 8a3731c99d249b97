//! Amazon Bedrock Converse provider on the AWS SDK.
//!
//! Requests are SigV4-signed with IAM credentials: either an explicit access
//! key pair or whatever the default AWS credential chain resolves (env,
//! profile, SSO, instance role).

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_bedrockruntime::operation::converse::{
    ConverseError, ConverseOutput as ConverseResponse,
};
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, InferenceConfiguration,
    Message as BedrockMessage, SystemContentBlock,
};
use tracing::warn;

use super::bedrock::TRANSPORT_ERROR;
use super::traits::{
    ConverseMessage, ConverseReply, ConverseRequest, ConverseRole, ModelProvider, ReplyUsage,
};
use crate::{HermodError, Result};

/// Provider name attached to credentials built from hermod configuration.
const CREDENTIALS_SOURCE: &str = "hermod-config";

/// Bedrock runtime client using the AWS SDK.
#[derive(Clone)]
pub struct BedrockSdkClient {
    client: Client,
}

impl BedrockSdkClient {
    /// Load AWS configuration for `region` and build a client.
    ///
    /// Explicit `credentials` win; without them the default credential chain
    /// is used. `endpoint` overrides the regional runtime endpoint.
    pub async fn connect(
        region: &str,
        credentials: Option<Credentials>,
        endpoint: Option<&str>,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()));

        if let Some(credentials) = credentials {
            loader = loader.credentials_provider(credentials);
        }
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        Self::from_client(Client::new(&sdk_config))
    }

    /// Wrap an already configured runtime client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// Static credentials from an access key pair.
pub fn static_credentials(
    access_key_id: &str,
    secret_access_key: &str,
    session_token: Option<String>,
) -> Credentials {
    Credentials::new(
        access_key_id,
        secret_access_key,
        session_token,
        None,
        CREDENTIALS_SOURCE,
    )
}

#[async_trait]
impl ModelProvider for BedrockSdkClient {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseReply> {
        let messages = request
            .messages
            .iter()
            .map(to_bedrock_message)
            .collect::<Result<Vec<_>>>()?;

        let mut call = self
            .client
            .converse()
            .model_id(&request.model_id)
            .set_messages(Some(messages))
            .inference_config(inference_config(request));

        if let Some(system) = &request.system {
            call = call.system(SystemContentBlock::Text(system.clone()));
        }

        let output = call.send().await.map_err(|e| {
            let err = provider_error(e);
            warn!(model_id = %request.model_id, error = %err, "bedrock converse failed");
            err
        })?;

        Ok(into_reply(&output))
    }
}

fn to_bedrock_message(msg: &ConverseMessage) -> Result<BedrockMessage> {
    let role = match msg.role {
        ConverseRole::User => ConversationRole::User,
        ConverseRole::Assistant => ConversationRole::Assistant,
    };
    BedrockMessage::builder()
        .role(role)
        .content(ContentBlock::Text(msg.content.clone()))
        .build()
        .map_err(|e| HermodError::provider("ValidationException", e.to_string()))
}

#[allow(clippy::cast_possible_truncation)]
fn inference_config(request: &ConverseRequest) -> InferenceConfiguration {
    InferenceConfiguration::builder()
        .max_tokens(i32::try_from(request.max_tokens).unwrap_or(i32::MAX))
        .temperature(request.temperature as f32)
        .build()
}

/// Service errors keep their AWS code and message; anything that never got
/// a service answer is a transport error.
fn provider_error(err: SdkError<ConverseError>) -> HermodError {
    match &err {
        SdkError::ServiceError(service) => {
            let inner = service.err();
            let code = inner.code().unwrap_or("UnknownError").to_string();
            let message = inner
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(inner).to_string());
            HermodError::provider(code, message)
        }
        _ => HermodError::provider(TRANSPORT_ERROR, DisplayErrorContext(&err).to_string()),
    }
}

fn into_reply(output: &ConverseResponse) -> ConverseReply {
    // Non-text blocks (tool use, reasoning) are ignored.
    let texts: Vec<&str> = match output.output() {
        Some(ConverseOutput::Message(msg)) => msg
            .content()
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    let content = (!texts.is_empty()).then(|| texts.concat());

    ConverseReply {
        content,
        usage: output.usage().map(|u| ReplyUsage {
            input_tokens: u32::try_from(u.input_tokens()).ok(),
            output_tokens: u32::try_from(u.output_tokens()).ok(),
            total_tokens: u32::try_from(u.total_tokens()).ok(),
        }),
        stop_reason: Some(output.stop_reason().as_str().to_string()),
    }
}
