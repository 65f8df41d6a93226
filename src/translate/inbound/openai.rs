//! OpenAI Chat Completions → native (§4.2.4).

use super::common::{build_request_context, fill_missing_thought_signatures, parse_inline_image_data_url};
use crate::error::GatewayError;
use crate::translate::model::{cap_max_output_tokens, reasoning_effort_to_thinking_budget};
use crate::translate::{RequestContext, TranslateContext};
use gateway_schema::gemini::{Content, FunctionDeclaration, GenerationConfig, Part, Tool, ToolConfig};
use gateway_schema::native::{AntigravityRequestBody, AntigravityRequestMeta};
use gateway_schema::openai::{ChatCompletionRequest, ChatMessage, ChatMessageContent, ChatMessageContentPart};
use serde_json::{json, Value};

pub fn translate(
    req: ChatCompletionRequest,
    ctx: &TranslateContext,
) -> Result<(AntigravityRequestBody, RequestContext), GatewayError> {
    let first_user_text = req.messages.iter().find_map(|m| {
        (m.role == "user").then(|| first_text(m)).flatten()
    });
    let rc = build_request_context(&req.model, first_user_text.as_deref());

    let mut system_texts = Vec::new();
    let mut contents = Vec::new();

    for message in &req.messages {
        match message.role.as_str() {
            "system" if contents.is_empty() => {
                if let Some(text) = first_text(message) {
                    system_texts.push(text);
                }
            }
            "user" | "system" => {
                contents.push(Content {
                    role: Some("user".to_string()),
                    parts: message_parts(message),
                    extra: Default::default(),
                });
            }
            "assistant" => {
                let mut parts = message_parts(message);
                for call in message.tool_calls.iter().flatten() {
                    let sanitized = crate::translate::tool_name::sanitize_tool_name(&call.function.name);
                    ctx.tool_names.remember(&rc.session_id, &rc.normalized_model, &call.function.name, &sanitized);
                    let args: Value = serde_json::from_str(&call.function.arguments).unwrap_or(json!({}));
                    parts.push(Part {
                        function_call: Some(json!({
                            "id": call.id,
                            "name": sanitized,
                            "args": args,
                        })),
                        ..Part::default()
                    });
                }
                contents.push(Content {
                    role: Some("model".to_string()),
                    parts,
                    extra: Default::default(),
                });
            }
            "tool" => {
                let output = first_text(message).unwrap_or_default();
                let name = message.name.clone().unwrap_or_else(|| "tool".to_string());
                let id = message.tool_call_id.clone().unwrap_or_default();
                contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![Part {
                        function_response: Some(json!({
                            "id": id,
                            "name": name,
                            "response": { "output": output },
                        })),
                        ..Part::default()
                    }],
                    extra: Default::default(),
                });
            }
            _ => {}
        }
    }

    fill_missing_thought_signatures(&mut contents, ctx, &rc);

    let system_instruction = (!system_texts.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part { text: Some(system_texts.join("\n")), ..Part::default() }],
        extra: Default::default(),
    });

    let thinking_budget = req.reasoning_effort.as_deref().and_then(reasoning_effort_to_thinking_budget);
    let generation_config = GenerationConfig {
        temperature: req.temperature,
        top_p: req.top_p,
        max_output_tokens: cap_max_output_tokens(rc.family, req.max_tokens),
        thinking_config: thinking_budget.map(|budget| json!({ "thinkingBudget": budget })),
        ..GenerationConfig::default()
    };

    let tools = req.tools.map(|decls| {
        vec![Tool {
            function_declarations: Some(
                decls
                    .into_iter()
                    .map(|decl| {
                        let sanitized = crate::translate::tool_name::sanitize_tool_name(&decl.function.name);
                        ctx.tool_names.remember(&rc.session_id, &rc.normalized_model, &decl.function.name, &sanitized);
                        FunctionDeclaration {
                            name: sanitized,
                            description: decl.function.description.unwrap_or_default(),
                            behavior: None,
                            parameters: decl.function.parameters,
                            parameters_json_schema: None,
                            response: None,
                            response_json_schema: None,
                            extra: Default::default(),
                        }
                    })
                    .collect(),
            ),
            extra: Default::default(),
        }]
    });

    let tool_config = tools.is_some().then(|| ToolConfig {
        function_calling_config: Some(json!({ "mode": "VALIDATED" })),
        retrieval_config: None,
        extra: Default::default(),
    });

    let mut gemini_request = gateway_schema::gemini::GeminiGenerateContentRequest {
        contents,
        system_instruction,
        generation_config: Some(generation_config),
        tools,
        tool_config,
        extra: Default::default(),
    };
    gemini_request.extra.insert("sessionId".to_string(), json!(rc.session_id));

    let body = AntigravityRequestMeta {
        project: String::new(),
        request_id: rc.request_id.clone(),
        model: rc.normalized_model.clone(),
    }
    .into_request(gemini_request);

    Ok((body, rc))
}

fn first_text(message: &ChatMessage) -> Option<String> {
    match message.content.as_ref()? {
        ChatMessageContent::Text(text) => Some(text.clone()),
        ChatMessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
            ChatMessageContentPart::Text { text } => Some(text.clone()),
            _ => None,
        }),
    }
}

fn message_parts(message: &ChatMessage) -> Vec<Part> {
    match message.content.as_ref() {
        None => Vec::new(),
        Some(ChatMessageContent::Text(text)) => vec![Part { text: Some(text.clone()), ..Part::default() }],
        Some(ChatMessageContent::Parts(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                ChatMessageContentPart::Text { text } => {
                    Some(Part { text: Some(text.clone()), ..Part::default() })
                }
                ChatMessageContentPart::ImageUrl { image_url } => {
                    let (mime_type, data) = parse_inline_image_data_url(&image_url.url)?;
                    Some(Part {
                        inline_data: Some(json!({ "mimeType": mime_type, "data": data })),
                        ..Part::default()
                    })
                }
                ChatMessageContentPart::Unknown => None,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_schema::openai::ToolCall;
    use serde_json::json;

    fn simple_request() -> ChatCompletionRequest {
        serde_json::from_value(json!({
            "model": "gemini-2.5-pro-thinking",
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap()
    }

    #[test]
    fn builds_session_and_request_ids() {
        let ctx = TranslateContext::new();
        let (body, rc) = translate(simple_request(), &ctx).unwrap();
        assert!(body.request_id.starts_with("agent-"));
        assert_eq!(rc.request_id, body.request_id);
        assert_eq!(rc.normalized_model, "gemini-2.5-pro-thinking");
        assert!(rc.thinking_capable);
    }

    #[test]
    fn leading_system_messages_become_system_instruction() {
        let req: ChatCompletionRequest = serde_json::from_value(json!({
            "model": "gemini-2.5-pro",
            "messages": [
                {"role": "system", "content": "be nice"},
                {"role": "user", "content": "hi"}
            ]
        }))
        .unwrap();
        let ctx = TranslateContext::new();
        let (body, _rc) = translate(req, &ctx).unwrap();
        let si = body.request.system_instruction.unwrap();
        assert_eq!(si.parts[0].text.as_deref(), Some("be nice"));
        assert_eq!(body.request.contents.len(), 1);
    }

    #[test]
    fn tool_calls_become_function_call_parts_with_sanitized_names() {
        let mut req = simple_request();
        req.messages.push(gateway_schema::openai::ChatMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(vec![ToolCall {
                id: "call_1".to_string(),
                r#type: "function".to_string(),
                function: gateway_schema::openai::FunctionCall {
                    name: "my.tool!".to_string(),
                    arguments: "{\"x\":1}".to_string(),
                },
            }]),
            tool_call_id: None,
            name: None,
            extra: Default::default(),
        });
        let ctx = TranslateContext::new();
        let (body, rc) = translate(req, &ctx).unwrap();
        let part = &body.request.contents[1].parts[0];
        let function_call = part.function_call.as_ref().unwrap();
        assert_eq!(function_call["name"], json!("my_tool"));
        assert_eq!(
            ctx.tool_names.resolve(&rc.session_id, &rc.normalized_model, "my_tool"),
            "my.tool!"
        );
    }

    #[test]
    fn reasoning_effort_sets_thinking_budget() {
        let mut req = simple_request();
        req.reasoning_effort = Some("high".to_string());
        let ctx = TranslateContext::new();
        let (body, _rc) = translate(req, &ctx).unwrap();
        let thinking = body.request.generation_config.unwrap().thinking_config.unwrap();
        assert_eq!(thinking["thinkingBudget"], json!(32000));
    }

    #[test]
    fn gemini_max_output_tokens_is_capped() {
        let mut req = simple_request();
        req.max_tokens = Some(100_000);
        let ctx = TranslateContext::new();
        let (body, _rc) = translate(req, &ctx).unwrap();
        assert_eq!(
            body.request.generation_config.unwrap().max_output_tokens,
            Some(crate::translate::model::GEMINI_MAX_OUTPUT_TOKENS)
        );
    }
}
