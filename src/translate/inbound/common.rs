//! Shared helpers used by every family's inbound translator.

use crate::translate::model::{self, ModelFamily};
use crate::translate::{RequestContext, TranslateContext};
use gateway_schema::gemini::Content;

pub fn build_request_context(requested_model: &str, first_user_text: Option<&str>) -> RequestContext {
    let normalized_model = model::normalize_model_name(requested_model);
    let family = ModelFamily::detect(&normalized_model);
    let thinking_capable = model::is_thinking_capable(family, &normalized_model);
    RequestContext {
        session_id: crate::ids::session_id_for(first_user_text),
        request_id: crate::ids::generate_request_id(),
        requested_model: requested_model.to_string(),
        normalized_model,
        family,
        thinking_capable,
    }
}

/// Refills `thoughtSignature` on any tool-call part that lacks one, keyed
/// by the part's (already-assigned) tool-call id (§4.2.3). Only thinking-
/// capable models are given the inert sentinel upstream requires in place
/// of a real signature; other families never had signatures to begin with.
pub fn fill_missing_thought_signatures(
    contents: &mut [Content],
    ctx: &TranslateContext,
    rc: &RequestContext,
) {
    if !rc.thinking_capable {
        return;
    }
    for content in contents {
        for part in &mut content.parts {
            if part.thought_signature.is_some() {
                continue;
            }
            let Some(id) = part
                .function_call
                .as_ref()
                .and_then(|call| call.get("id"))
                .and_then(serde_json::Value::as_str)
            else {
                continue;
            };
            let signature = ctx.signatures.fill_inbound(id);
            part.thought_signature = Some(signature.to_string());
        }
    }
}

/// Parses a `data:image/<fmt>;base64,<data>` URL, matching
/// `^data:image/(\w+);base64,(.*)$` (§4.2.4).
pub fn parse_inline_image_data_url(url: &str) -> Option<(String, String)> {
    let rest = url.strip_prefix("data:image/")?;
    let (fmt, rest) = rest.split_once(';')?;
    if fmt.is_empty() || !fmt.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let data = rest.strip_prefix("base64,")?;
    Some((format!("image/{fmt}"), data.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_data_url() {
        let (mime, data) = parse_inline_image_data_url("data:image/png;base64,YWJj").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(data, "YWJj");
    }

    #[test]
    fn rejects_non_image_data_url() {
        assert!(parse_inline_image_data_url("data:text/plain;base64,YWJj").is_none());
    }

    #[test]
    fn rejects_non_base64_encoding() {
        assert!(parse_inline_image_data_url("data:image/png,rawbytes").is_none());
    }
}
