//! Gemini `generateContent`/`streamGenerateContent` → native (§4.2.4).
//!
//! Gemini requests are already shaped like the native request, so this is
//! close to an identity mapping: strip `safetySettings`, force validated
//! function calling when tools are present, and backfill missing
//! `functionCall`/`functionResponse` ids.

use super::common::{build_request_context, fill_missing_thought_signatures};
use crate::error::GatewayError;
use crate::translate::{RequestContext, TranslateContext};
use gateway_schema::gemini::{GeminiGenerateContentRequest, ToolConfig};
use gateway_schema::native::{AntigravityRequestBody, AntigravityRequestMeta};
use serde_json::json;

pub fn translate(
    model: &str,
    mut req: GeminiGenerateContentRequest,
    ctx: &TranslateContext,
) -> Result<(AntigravityRequestBody, RequestContext), GatewayError> {
    let first_user_text = req
        .contents
        .iter()
        .find(|c| c.role.as_deref().unwrap_or("user") == "user")
        .and_then(|c| c.parts.iter().find_map(|p| p.text.clone()));
    let rc = build_request_context(model, first_user_text.as_deref());

    req.extra.remove("safetySettings");
    force_validated_tool_config(&mut req);
    backfill_function_call_ids(&mut req);
    fill_missing_thought_signatures(&mut req.contents, ctx, &rc);

    req.extra.insert("sessionId".to_string(), json!(rc.session_id));

    let body = AntigravityRequestMeta {
        project: String::new(),
        request_id: rc.request_id.clone(),
        model: rc.normalized_model.clone(),
    }
    .into_request(req);

    Ok((body, rc))
}

fn force_validated_tool_config(req: &mut GeminiGenerateContentRequest) {
    if !req.tools.as_ref().is_some_and(|tools| !tools.is_empty()) {
        return;
    }
    let tool_config = req.tool_config.get_or_insert_with(|| ToolConfig {
        function_calling_config: None,
        retrieval_config: None,
        extra: Default::default(),
    });
    let mut fcc = tool_config.function_calling_config.take().unwrap_or_else(|| json!({}));
    if let Some(obj) = fcc.as_object_mut() {
        obj.insert("mode".to_string(), json!("VALIDATED"));
    } else {
        fcc = json!({ "mode": "VALIDATED" });
    }
    tool_config.function_calling_config = Some(fcc);
}

/// Up to the shorter list, pairs each id-less `functionCall` with the
/// id-less `functionResponse` at the same position; extras on either side
/// pass through unmodified (§9 open question: positional pairing).
fn backfill_function_call_ids(req: &mut GeminiGenerateContentRequest) {
    let mut assigned_ids = Vec::new();
    for content in &mut req.contents {
        for part in &mut content.parts {
            if let Some(call) = part.function_call.as_mut() {
                if !has_string_id(call) {
                    let id = crate::ids::generate_tool_use_id();
                    if let Some(obj) = call.as_object_mut() {
                        obj.insert("id".to_string(), json!(id.clone()));
                    }
                    assigned_ids.push(id);
                }
            }
        }
    }

    let mut cursor = 0usize;
    for content in &mut req.contents {
        for part in &mut content.parts {
            if let Some(response) = part.function_response.as_mut() {
                if !has_string_id(response) {
                    if let Some(id) = assigned_ids.get(cursor) {
                        if let Some(obj) = response.as_object_mut() {
                            obj.insert("id".to_string(), json!(id.clone()));
                        }
                        cursor += 1;
                    }
                }
            }
        }
    }
}

fn has_string_id(value: &serde_json::Value) -> bool {
    value.get("id").and_then(serde_json::Value::as_str).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(contents: serde_json::Value) -> GeminiGenerateContentRequest {
        serde_json::from_value(json!({ "contents": contents })).unwrap()
    }

    #[test]
    fn strips_safety_settings_and_injects_session_id() {
        let mut req: GeminiGenerateContentRequest = serde_json::from_value(json!({
            "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
            "safetySettings": [{"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE"}]
        }))
        .unwrap();
        req.extra.insert("unused".into(), json!(1));
        let ctx = TranslateContext::new();
        let (body, _rc) = translate("gemini-2.5-pro", req, &ctx).unwrap();
        assert!(!body.request.extra.contains_key("safetySettings"));
        assert!(body.request.extra.contains_key("sessionId"));
    }

    #[test]
    fn forces_validated_mode_when_tools_present() {
        let req: GeminiGenerateContentRequest = serde_json::from_value(json!({
            "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
            "tools": [{"functionDeclarations": [{"name": "f", "description": "d"}]}],
            "toolConfig": {"functionCallingConfig": {"mode": "AUTO"}}
        }))
        .unwrap();
        let ctx = TranslateContext::new();
        let (body, _rc) = translate("gemini-2.5-pro", req, &ctx).unwrap();
        let mode = body.request.tool_config.unwrap().function_calling_config.unwrap()["mode"].clone();
        assert_eq!(mode, json!("VALIDATED"));
    }

    #[test]
    fn backfills_ids_by_position() {
        let req = request(json!([
            {"role": "model", "parts": [
                {"functionCall": {"name": "a", "args": {}}},
                {"functionCall": {"name": "b", "args": {}}}
            ]},
            {"role": "user", "parts": [
                {"functionResponse": {"name": "a", "response": {}}}
            ]}
        ]));
        let ctx = TranslateContext::new();
        let (body, _rc) = translate("gemini-2.5-pro", req, &ctx).unwrap();
        let call_a_id = body.request.contents[0].parts[0].function_call.as_ref().unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();
        let response_id = body.request.contents[1].parts[0].function_response.as_ref().unwrap()["id"]
            .as_str()
            .unwrap();
        assert_eq!(call_a_id, response_id);
        // second call has no matching response; gets an id but no pairing needed.
        assert!(body.request.contents[0].parts[1].function_call.as_ref().unwrap()["id"].is_string());
    }

    #[test]
    fn preserves_existing_ids() {
        let req = request(json!([
            {"role": "model", "parts": [{"functionCall": {"id": "keep-me", "name": "a", "args": {}}}]}
        ]));
        let ctx = TranslateContext::new();
        let (body, _rc) = translate("gemini-2.5-pro", req, &ctx).unwrap();
        let id = body.request.contents[0].parts[0].function_call.as_ref().unwrap()["id"].as_str().unwrap();
        assert_eq!(id, "keep-me");
    }
}
