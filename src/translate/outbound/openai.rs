//! Native response → OpenAI Chat Completion response (§4.2.5).

use super::{extract_candidate_parts, map_finish_reason_openai};
use crate::translate::{RequestContext, TranslateContext};
use gateway_schema::gemini::GeminiResponseBody;
use serde_json::{json, Value};

pub fn translate(response: &GeminiResponseBody, rc: &RequestContext, ctx: &TranslateContext) -> Value {
    let parts = extract_candidate_parts(response, rc, ctx);

    let mut message = json!({ "role": "assistant" });
    let message_obj = message.as_object_mut().unwrap();

    if !parts.text.is_empty() {
        message_obj.insert("content".to_string(), json!(parts.text));
    } else {
        message_obj.insert("content".to_string(), Value::Null);
    }

    if !parts.thoughts.is_empty() {
        let reasoning = parts.thoughts.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join("\n");
        message_obj.insert("reasoning_content".to_string(), json!(reasoning));
    }

    if !parts.tool_calls.is_empty() {
        let tool_calls: Vec<Value> = parts
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.args.to_string(),
                    }
                })
            })
            .collect();
        message_obj.insert("tool_calls".to_string(), json!(tool_calls));
    }

    let usage = response.usageMetadata.clone().map(translate_usage).unwrap_or(json!({
        "prompt_tokens": 0,
        "completion_tokens": 0,
        "total_tokens": 0,
    }));

    json!({
        "id": rc.request_id,
        "object": "chat.completion",
        "model": rc.requested_model,
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": map_finish_reason_openai(parts.finish_reason.as_deref()),
        }],
        "usage": usage,
    })
}

fn translate_usage(native: Value) -> Value {
    json!({
        "prompt_tokens": native.get("promptTokenCount").cloned().unwrap_or(json!(0)),
        "completion_tokens": native.get("candidatesTokenCount").cloned().unwrap_or(json!(0)),
        "total_tokens": native.get("totalTokenCount").cloned().unwrap_or(json!(0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_context() -> RequestContext {
        crate::translate::inbound::common::build_request_context("gemini-2.5-pro", None)
    }

    #[test]
    fn maps_tool_call_into_openai_shape() {
        let ctx = TranslateContext::new();
        let rc = request_context();
        let response: GeminiResponseBody = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"functionCall": {"id": "t1", "name": "my_tool", "args": {"x": 1}}}]},
                "finishReason": "TOOL_USE"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
        }))
        .unwrap();
        let body = translate(&response, &rc, &ctx);
        assert_eq!(body["choices"][0]["finish_reason"], json!("tool_calls"));
        let call = &body["choices"][0]["message"]["tool_calls"][0];
        assert_eq!(call["function"]["name"], json!("my_tool"));
        assert_eq!(body["usage"]["prompt_tokens"], json!(10));
    }

    #[test]
    fn plain_text_response() {
        let ctx = TranslateContext::new();
        let rc = request_context();
        let response: GeminiResponseBody = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "hi there"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        let body = translate(&response, &rc, &ctx);
        assert_eq!(body["choices"][0]["message"]["content"], json!("hi there"));
        assert_eq!(body["choices"][0]["finish_reason"], json!("stop"));
    }
}
