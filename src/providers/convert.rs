//! Conversions from canonical messages to provider conversations.
//!
//! Some backends (the Llama family on Bedrock, for one) reject a dedicated
//! system prompt. For those the first system message is folded into the
//! conversation as user text prefixed with `"System: "`.

use tracing::debug;

use super::traits::{ConverseMessage, ConverseRole};
use crate::types::{Message, Role};

/// Split canonical messages into an optional system prompt and a provider
/// conversation.
///
/// The first system message is:
/// - returned separately when `supports_system` is true;
/// - otherwise prepended (`"System: <text>\n\n"`) to the first user message
///   already in the conversation;
/// - otherwise inserted as a leading user message `"System: <text>"`.
///
/// Later system messages are dropped. User and assistant messages pass
/// through unchanged, in order.
pub fn to_converse_messages(
    messages: &[Message],
    supports_system: bool,
) -> (Option<String>, Vec<ConverseMessage>) {
    let mut system_prompt = None;
    let mut seen_system = false;
    let mut conversation = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            Role::System if seen_system => {
                debug!("dropping additional system message");
            }
            Role::System => {
                seen_system = true;
                if supports_system {
                    system_prompt = Some(msg.content.clone());
                } else {
                    merge_system(&mut conversation, &msg.content);
                }
            }
            Role::User => conversation.push(ConverseMessage::user(msg.content.clone())),
            Role::Assistant => conversation.push(ConverseMessage::assistant(msg.content.clone())),
        }
    }

    (system_prompt, conversation)
}

fn merge_system(conversation: &mut Vec<ConverseMessage>, system: &str) {
    let first_user = conversation
        .iter_mut()
        .find(|m| m.role == ConverseRole::User);
    match first_user {
        Some(user) => user.content = format!("System: {system}\n\n{}", user.content),
        None => conversation.insert(0, ConverseMessage::user(format!("System: {system}"))),
    }
}
