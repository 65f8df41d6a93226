//! Native response → Gemini `generateContent` response (§4.2.5).
//!
//! The native shape *is* the Gemini response shape, so this is close to an
//! identity pass-through; the only work is recording any thought signatures
//! seen so a later request in the same session can round-trip them.

use super::extract_candidate_parts;
use crate::translate::{RequestContext, TranslateContext};
use gateway_schema::gemini::GeminiResponseBody;
use serde_json::Value;

pub fn translate(response: &GeminiResponseBody, rc: &RequestContext, ctx: &TranslateContext) -> Value {
    let _ = extract_candidate_parts(response, rc, ctx);
    serde_json::to_value(response).unwrap_or(Value::Null)
}
