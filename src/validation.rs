//! Request validation.
//!
//! Every check here is pure and reports the violated constraint as
//! [`HermodError::InvalidRequest`] with a reason meant to be shown verbatim
//! to the caller. The router runs [`validate()`] before touching the
//! catalog, the cache or the provider.

use serde_json::Value;

use crate::catalog::ModelCatalog;
use crate::types::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationRequest, Message, Role};
use crate::{HermodError, Result};

/// Inclusive lower bound for `temperature`.
pub const MIN_TEMPERATURE: f64 = 0.0;

/// Inclusive upper bound for `temperature`.
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Inclusive upper bound for `max_tokens`.
pub const MAX_TOKENS_LIMIT: u32 = 100_000;

fn invalid(reason: impl Into<String>) -> HermodError {
    HermodError::InvalidRequest(reason.into())
}

/// Validate a typed request: conversation shape, temperature and token limit.
pub fn validate(request: &GenerationRequest) -> Result<()> {
    validate_messages(&request.messages)?;
    validate_temperature(request.temperature)?;
    validate_max_tokens(request.max_tokens)
}

/// A conversation must be non-empty and every message must carry text.
pub fn validate_messages(messages: &[Message]) -> Result<()> {
    if messages.is_empty() {
        return Err(invalid("Messages list cannot be empty"));
    }
    for (i, msg) in messages.iter().enumerate() {
        if msg.content.trim().is_empty() {
            return Err(invalid(format!("Message {i} content cannot be empty")));
        }
    }
    Ok(())
}

/// Temperature must lie in `[0.0, 2.0]`. NaN is rejected.
pub fn validate_temperature(temperature: f64) -> Result<()> {
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(invalid(format!(
            "Temperature must be between {MIN_TEMPERATURE:.1} and {MAX_TEMPERATURE:.1}"
        )));
    }
    Ok(())
}

/// `max_tokens` must lie in `1..=100000`.
pub fn validate_max_tokens(max_tokens: u32) -> Result<()> {
    if max_tokens == 0 {
        return Err(invalid("Max tokens must be greater than 0"));
    }
    if max_tokens > MAX_TOKENS_LIMIT {
        return Err(invalid(format!(
            "Max tokens cannot exceed {MAX_TOKENS_LIMIT}"
        )));
    }
    Ok(())
}

/// Check a model name against the catalog.
///
/// A blank name is a malformed request; a well-formed but unknown name is
/// `UnknownModel`, whose message lists the valid names.
pub fn validate_model_name(name: &str, catalog: &ModelCatalog) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid("Model name cannot be empty"));
    }
    catalog.lookup(name).map(|_| ())
}

/// Decode and validate an untyped request.
///
/// Missing `temperature` / `max_tokens` take the defaults. Used through
/// [`GenerationRequest::from_json()`].
pub(crate) fn decode_request(value: &Value) -> Result<GenerationRequest> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid("Request must be an object"))?;

    let model = match obj.get("model") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(invalid("Model name must be a string")),
        None => return Err(invalid("Request must have a 'model' key")),
    };

    let messages = match obj.get("messages") {
        Some(Value::Array(items)) => decode_messages(items)?,
        Some(_) => return Err(invalid("Messages must be a list")),
        None => return Err(invalid("Request must have a 'messages' key")),
    };

    let temperature = match obj.get("temperature") {
        None | Some(Value::Null) => DEFAULT_TEMPERATURE,
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid("Temperature must be a number"))?,
        Some(_) => return Err(invalid("Temperature must be a number")),
    };

    let max_tokens = match obj.get("max_tokens") {
        None | Some(Value::Null) => DEFAULT_MAX_TOKENS,
        Some(Value::Number(n)) => decode_max_tokens(n)?,
        Some(_) => return Err(invalid("Max tokens must be an integer")),
    };

    let request = GenerationRequest {
        model,
        messages,
        temperature,
        max_tokens,
    };
    validate(&request)?;
    Ok(request)
}

fn decode_messages(items: &[Value]) -> Result<Vec<Message>> {
    if items.is_empty() {
        return Err(invalid("Messages list cannot be empty"));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let obj = item
                .as_object()
                .ok_or_else(|| invalid(format!("Message {i} must be an object")))?;

            let (Some(role), Some(content)) = (obj.get("role"), obj.get("content")) else {
                return Err(invalid(format!(
                    "Message {i} must have 'role' and 'content' keys"
                )));
            };

            let role = role
                .as_str()
                .ok_or_else(|| invalid(format!("Message {i} role must be a string")))?
                .parse::<Role>()
                .map_err(|e| match e {
                    HermodError::InvalidRequest(reason) => invalid(format!("Message {i} has {reason}")),
                    other => other,
                })?;

            let content = content
                .as_str()
                .ok_or_else(|| invalid(format!("Message {i} content must be a string")))?;

            if content.trim().is_empty() {
                return Err(invalid(format!("Message {i} content cannot be empty")));
            }

            Ok(Message::new(role, content))
        })
        .collect()
}

fn decode_max_tokens(n: &serde_json::Number) -> Result<u32> {
    if let Some(v) = n.as_u64() {
        // Anything past the limit is reported by the range check, not as an overflow.
        return Ok(u32::try_from(v).unwrap_or(u32::MAX));
    }
    if n.as_i64().is_some() {
        return Err(invalid("Max tokens must be greater than 0"));
    }
    Err(invalid("Max tokens must be an integer"))
}
