//! Native response → public API family (§4.2.5).

pub mod anthropic;
pub mod gemini;
pub mod openai;

use crate::translate::{RequestContext, TranslateContext};
use gateway_schema::gemini::GeminiResponseBody;
use serde_json::Value;

/// One upstream tool call, with its name already rewritten back to whatever
/// the caller originally declared.
#[derive(Debug, Clone)]
pub struct ResolvedToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

/// A single thought part, paired with whatever signature upstream attached
/// (or a cache-filled sentinel if none was present).
#[derive(Debug, Clone)]
pub struct ResolvedThought {
    pub text: String,
    pub signature: Option<String>,
}

/// A response walked and categorized per §4.2.5, with tool names resolved
/// and signatures recorded/filled through the shared caches.
#[derive(Debug, Clone, Default)]
pub struct CandidateParts {
    pub thoughts: Vec<ResolvedThought>,
    pub text: String,
    pub tool_calls: Vec<ResolvedToolCall>,
    pub finish_reason: Option<String>,
}

/// Walks the first candidate's parts in order, splitting them into
/// `thought`, plain `text`, and `functionCall` categories, rewriting tool
/// names back to their caller-declared form and recording any thought
/// signatures seen along the way.
pub fn extract_candidate_parts(
    response: &GeminiResponseBody,
    rc: &RequestContext,
    ctx: &TranslateContext,
) -> CandidateParts {
    let mut out = CandidateParts::default();
    let Some(candidate) = response.candidates.first() else {
        return out;
    };
    out.finish_reason = candidate.finish_reason.clone();

    let Some(content) = candidate.content.as_ref() else {
        return out;
    };

    for part in &content.parts {
        if let Some(text) = &part.text {
            if part.thought == Some(true) {
                out.thoughts.push(ResolvedThought {
                    text: text.clone(),
                    signature: part.thought_signature.clone(),
                });
            } else {
                out.text.push_str(text);
            }
            continue;
        }

        if let Some(call) = &part.function_call {
            let id = call.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
            let sanitized = call.get("name").and_then(Value::as_str).unwrap_or_default();
            let name = ctx.tool_names.resolve(&rc.session_id, &rc.normalized_model, sanitized);
            let args = call.get("args").cloned().unwrap_or_else(|| serde_json::json!({}));
            if let Some(sig) = &part.thought_signature {
                if !id.is_empty() {
                    ctx.signatures.record_outbound(&id, sig);
                }
            }
            out.tool_calls.push(ResolvedToolCall { id, name, args });
        }
    }

    out
}

/// Maps a native `finishReason` to the OpenAI `finish_reason` value
/// (§4.2.5 table). Unknown/absent reasons default to `"stop"`.
pub fn map_finish_reason_openai(native: Option<&str>) -> &'static str {
    match native {
        Some("MAX_TOKENS") => "length",
        Some("TOOL_USE") | Some("FUNCTION_CALL") => "tool_calls",
        Some("SAFETY") => "content_filter",
        _ => "stop",
    }
}

/// Maps a native `finishReason` to the Anthropic `stop_reason` value
/// (§4.2.5 table). Unknown/absent reasons default to `"end_turn"`.
pub fn map_finish_reason_anthropic(native: Option<&str>) -> &'static str {
    match native {
        Some("MAX_TOKENS") => "max_tokens",
        Some("TOOL_USE") | Some("FUNCTION_CALL") => "tool_use",
        Some("SAFETY") => "stop_sequence",
        _ => "end_turn",
    }
}
