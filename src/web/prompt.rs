use serde_json::Value;

use crate::config::PromptConfig;
use crate::error::{RelayError, RelayResult};
use crate::web::models::ChatTurn;

/// The two system turns placed ahead of every conversation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system_prompt: String,
    org_context: String,
}

impl PromptTemplate {
    pub fn new(system_prompt: impl Into<String>, org_context: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            org_context: org_context.into(),
        }
    }

    /// System turns first, then the client turns minus any `system` ones,
    /// in their original order. Clients cannot override the instructions.
    pub fn assemble(&self, turns: Vec<ChatTurn>) -> Vec<ChatTurn> {
        let mut messages = Vec::with_capacity(turns.len() + 2);
        messages.push(ChatTurn::system(self.system_prompt.as_str()));
        messages.push(ChatTurn::system(self.org_context.as_str()));
        messages.extend(turns.into_iter().filter(|turn| !turn.is_system()));
        messages
    }
}

impl From<&PromptConfig> for PromptTemplate {
    fn from(config: &PromptConfig) -> Self {
        Self::new(config.system_prompt.clone(), config.org_context.clone())
    }
}

/// Checks that `messages` is present and an array of objects with `content`.
/// Turns are otherwise passed through as sent.
pub fn parse_turns(messages: Option<Value>) -> RelayResult<Vec<ChatTurn>> {
    let items = match messages {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(RelayError::invalid_input("messages must be an array")),
        None => return Err(RelayError::InvalidInput { detail: None }),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            ChatTurn::from_value(item).map_err(|reason| RelayError::InvalidTurn {
                detail: format!("messages[{}]: {}", i, reason),
            })
        })
        .collect()
}
