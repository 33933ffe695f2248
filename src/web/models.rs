use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SYSTEM_ROLE: &str = "system";

static NULL_CONTENT: Value = Value::Null;

/// One message in a conversation, kept as the JSON object the client sent so
/// fields like `name` or multi-part `content` reach the upstream untouched.
/// Only `role == "system"` gets special treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatTurn(Map<String, Value>);

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("role".to_string(), Value::String(SYSTEM_ROLE.to_string()));
        fields.insert("content".to_string(), Value::String(content.into()));
        Self(fields)
    }

    /// Accepts any object that carries a `content` key.
    pub fn from_value(value: Value) -> Result<Self, &'static str> {
        match value {
            Value::Object(fields) if fields.contains_key("content") => Ok(Self(fields)),
            Value::Object(_) => Err("missing field `content`"),
            _ => Err("expected an object"),
        }
    }

    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    pub fn content(&self) -> &Value {
        self.0.get("content").unwrap_or(&NULL_CONTENT)
    }

    pub fn is_system(&self) -> bool {
        self.role() == Some(SYSTEM_ROLE)
    }
}

/// Incoming body. `messages` stays untyped until validation so a missing
/// or mistyped field is reported as bad input rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct ConversationRequest {
    #[serde(default)]
    pub messages: Option<Value>,
}

/// Body sent to the completion API.
#[derive(Debug, Serialize)]
pub struct UpstreamPayload<'a> {
    pub model: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelayReply {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}
