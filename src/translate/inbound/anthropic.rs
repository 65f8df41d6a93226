//! Anthropic Messages → native (§4.2.4).

use super::common::{build_request_context, fill_missing_thought_signatures};
use crate::error::GatewayError;
use crate::translate::{RequestContext, TranslateContext};
use gateway_schema::anthropic::{AnthropicContentBlock, MessagesRequest, WEB_SEARCH_TOOL_NAME};
use gateway_schema::gemini::{Content, FunctionDeclaration, GenerationConfig, Part, Tool, ToolConfig};
use gateway_schema::native::{AntigravityRequestBody, AntigravityRequestMeta};
use serde_json::{json, Value};

pub fn translate(
    req: MessagesRequest,
    ctx: &TranslateContext,
) -> Result<(AntigravityRequestBody, RequestContext), GatewayError> {
    let first_user_text = req
        .messages
        .iter()
        .find(|m| m.role == "user")
        .and_then(|m| first_text_of(&m.content));
    let rc = build_request_context(&req.model, first_user_text.as_deref());

    let mut contents = Vec::with_capacity(req.messages.len());
    for message in &req.messages {
        let role = if message.role == "assistant" { "model" } else { "user" };
        let parts = blocks_of(&message.content)
            .into_iter()
            .filter_map(|block| translate_block(block, &ctx, &rc))
            .collect();
        contents.push(Content { role: Some(role.to_string()), parts, extra: Default::default() });
    }

    fill_missing_thought_signatures(&mut contents, ctx, &rc);

    let system_instruction = req.system.as_ref().and_then(system_text).map(|text| Content {
        role: None,
        parts: vec![Part { text: Some(text), ..Part::default() }],
        extra: Default::default(),
    });

    let generation_config = GenerationConfig {
        temperature: req.temperature,
        top_p: req.top_p,
        max_output_tokens: crate::translate::model::cap_max_output_tokens(rc.family, Some(req.max_tokens)),
        ..GenerationConfig::default()
    };

    let declared_tools: Vec<FunctionDeclaration> = req
        .tools
        .unwrap_or_default()
        .into_iter()
        .filter(|t| t.name != WEB_SEARCH_TOOL_NAME)
        .map(|tool| {
            let sanitized = crate::translate::tool_name::sanitize_tool_name(&tool.name);
            ctx.tool_names.remember(&rc.session_id, &rc.normalized_model, &tool.name, &sanitized);
            FunctionDeclaration {
                name: sanitized,
                description: tool.description.unwrap_or_default(),
                behavior: None,
                parameters: tool.input_schema,
                parameters_json_schema: None,
                response: None,
                response_json_schema: None,
                extra: Default::default(),
            }
        })
        .collect();
    let tools = (!declared_tools.is_empty())
        .then(|| vec![Tool { function_declarations: Some(declared_tools), extra: Default::default() }]);

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

fn system_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(blocks) => {
            let texts: Vec<String> = blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            (!texts.is_empty()).then(|| texts.join("\n"))
        }
        _ => None,
    }
}

fn blocks_of(content: &Value) -> Vec<AnthropicContentBlock> {
    match content {
        Value::String(text) => vec![AnthropicContentBlock::Text { text: text.clone() }],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn first_text_of(content: &Value) -> Option<String> {
    blocks_of(content).into_iter().find_map(|b| match b {
        AnthropicContentBlock::Text { text } => Some(text),
        _ => None,
    })
}

fn translate_block(
    block: AnthropicContentBlock,
    ctx: &TranslateContext,
    rc: &RequestContext,
) -> Option<Part> {
    match block {
        AnthropicContentBlock::Text { text } => Some(Part { text: Some(text), ..Part::default() }),
        AnthropicContentBlock::Image { source } => {
            Some(Part { inline_data: Some(source), ..Part::default() })
        }
        AnthropicContentBlock::ToolUse { id, name, input } => {
            let sanitized = crate::translate::tool_name::sanitize_tool_name(&name);
            ctx.tool_names.remember(&rc.session_id, &rc.normalized_model, &name, &sanitized);
            Some(Part {
                function_call: Some(json!({ "id": id, "name": sanitized, "args": input })),
                ..Part::default()
            })
        }
        AnthropicContentBlock::ToolResult { tool_use_id, content, is_error } => Some(Part {
            function_response: Some(json!({
                "id": tool_use_id,
                "name": "tool",
                "response": { "output": content, "isError": is_error },
            })),
            ..Part::default()
        }),
        AnthropicContentBlock::Thinking { thinking, signature } => {
            let mut part = Part { text: Some(thinking), thought: Some(true), ..Part::default() };
            *part.thought_signature_mut() = signature;
            Some(part)
        }
        AnthropicContentBlock::Unknown => None,
    }
}
