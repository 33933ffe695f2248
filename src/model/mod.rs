use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::error::{RelayError, RelayResult};
use crate::web::models::{ChatTurn, UpstreamPayload};

/// Client for the upstream chat-completion API. One call per relay request,
/// no retries.
pub struct CompletionClient {
    config: UpstreamConfig,
    fallback_reply: String,
    client: Client,
}

impl CompletionClient {
    pub fn new(config: UpstreamConfig, fallback_reply: impl Into<String>) -> anyhow::Result<Self> {
        info!("Using completion API at: {} (model {})", config.url, config.model);
        if config.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; upstream calls will be sent without credentials");
        }

        // The deadline covers connect, send and reading the body.
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            config,
            fallback_reply: fallback_reply.into(),
            client,
        })
    }

    pub fn payload<'a>(&'a self, messages: Vec<ChatTurn>) -> UpstreamPayload<'a> {
        UpstreamPayload {
            model: &self.config.model,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            messages,
        }
    }

    /// Sends the assembled conversation and returns the trimmed reply text,
    /// or the fallback reply when the answer has none.
    pub async fn complete(&self, messages: Vec<ChatTurn>) -> RelayResult<String> {
        let payload = self.payload(messages);
        debug!("Sending {} messages to {}", payload.messages.len(), self.config.url);

        let mut request = self.client.post(&self.config.url).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| transport_error(e, &self.config))?;

        let status = response.status();
        if !status.is_success() {
            // Best effort: an unreadable body becomes an empty detail.
            let detail = response.text().await.unwrap_or_default();
            return Err(RelayError::Upstream {
                status: Some(status.as_u16()),
                detail,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, &self.config))?;
        let response_json: Value = serde_json::from_slice(&body)?;
        debug!("Response JSON: {}", response_json);

        let reply = extract_reply(&response_json).unwrap_or_else(|| self.fallback_reply.clone());
        info!("Reply length: {} characters", reply.len());
        Ok(reply)
    }
}

fn transport_error(e: reqwest::Error, config: &UpstreamConfig) -> RelayError {
    let detail = if e.is_timeout() {
        format!("upstream request timed out after {}s", config.timeout.as_secs())
    } else {
        format!("upstream request failed: {}", e)
    };
    RelayError::Upstream { status: None, detail }
}

/// First completion's message text, trimmed. `None` when absent or blank.
pub fn extract_reply(response: &Value) -> Option<String> {
    response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}
