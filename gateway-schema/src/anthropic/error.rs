//! Anthropic Messages API error schema.

use serde::{Deserialize, Serialize};

/// `{ "type": "error", "error": { "type": "...", "message": "..." } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicErrorBody {
    #[serde(rename = "type", default = "default_error_type")]
    pub envelope_type: String,
    pub error: AnthropicErrorObject,
}

fn default_error_type() -> String {
    "error".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicErrorObject {
    pub r#type: String,
    pub message: String,
}

impl AnthropicErrorBody {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            envelope_type: "error".to_string(),
            error: AnthropicErrorObject {
                r#type: kind.into(),
                message: message.into(),
            },
        }
    }
}
