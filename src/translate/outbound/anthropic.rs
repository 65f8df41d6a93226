//! Native response → Anthropic Messages response (§4.2.5).

use super::{extract_candidate_parts, map_finish_reason_anthropic};
use crate::translate::{RequestContext, TranslateContext};
use gateway_schema::gemini::GeminiResponseBody;
use serde_json::{json, Value};

pub fn translate(response: &GeminiResponseBody, rc: &RequestContext, ctx: &TranslateContext) -> Value {
    let parts = extract_candidate_parts(response, rc, ctx);

    let mut content = Vec::new();
    for thought in &parts.thoughts {
        let mut block = json!({ "type": "thinking", "thinking": thought.text });
        if let Some(sig) = &thought.signature {
            block["signature"] = json!(sig);
        }
        content.push(block);
    }
    if !parts.text.is_empty() {
        content.push(json!({ "type": "text", "text": parts.text }));
    }
    for call in &parts.tool_calls {
        content.push(json!({
            "type": "tool_use",
            "id": call.id,
            "name": call.name,
            "input": call.args,
        }));
    }

    let usage = response.usageMetadata.as_ref().map(translate_usage).unwrap_or(json!({
        "input_tokens": 0,
        "output_tokens": 0,
    }));

    json!({
        "id": rc.request_id,
        "type": "message",
        "role": "assistant",
        "model": rc.requested_model,
        "content": content,
        "stop_reason": map_finish_reason_anthropic(parts.finish_reason.as_deref()),
        "stop_sequence": Value::Null,
        "usage": usage,
    })
}

fn translate_usage(native: &Value) -> Value {
    json!({
        "input_tokens": native.get("promptTokenCount").cloned().unwrap_or(json!(0)),
        "output_tokens": native.get("candidatesTokenCount").cloned().unwrap_or(json!(0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_context() -> RequestContext {
        crate::translate::inbound::common::build_request_context("claude-sonnet-4-5-thinking", None)
    }

    #[test]
    fn thinking_block_carries_signature() {
        let ctx = TranslateContext::new();
        let rc = request_context();
        let response: GeminiResponseBody = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "pondering", "thought": true, "thoughtSignature": "c2ln"},
                    {"text": "the answer"}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        let body = translate(&response, &rc, &ctx);
        assert_eq!(body["content"][0]["type"], json!("thinking"));
        assert_eq!(body["content"][0]["signature"], json!("c2ln"));
        assert_eq!(body["content"][1]["text"], json!("the answer"));
        assert_eq!(body["stop_reason"], json!("end_turn"));
    }

    #[test]
    fn tool_use_block_resolves_original_name() {
        let ctx = TranslateContext::new();
        let rc = request_context();
        ctx.tool_names.remember(&rc.session_id, &rc.normalized_model, "my.tool!", "my_tool");
        let response: GeminiResponseBody = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"functionCall": {"id": "t1", "name": "my_tool", "args": {}}}]},
                "finishReason": "TOOL_USE"
            }]
        }))
        .unwrap();
        let body = translate(&response, &rc, &ctx);
        assert_eq!(body["content"][0]["name"], json!("my.tool!"));
        assert_eq!(body["stop_reason"], json!("tool_use"));
    }
}
