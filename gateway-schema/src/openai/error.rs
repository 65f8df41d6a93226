//! OpenAI Chat Completions error schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ "error": { "message": "...", "type": "...", "code": ... } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenaiErrorBody {
    #[serde(rename = "error")]
    pub inner: OpenaiErrorObject,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenaiErrorObject {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<Value>,
}

impl OpenaiErrorBody {
    pub fn new(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            inner: OpenaiErrorObject {
                message: message.into(),
                r#type: kind.into(),
                code: None,
                param: None,
            },
        }
    }
}
