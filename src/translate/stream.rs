//! SSE translation of the native upstream's `data: <json>` events into each
//! public API family's streaming wire format (§4.2.5).

use crate::error::{DispatchError, GatewayError};
use crate::translate::outbound::{map_finish_reason_anthropic, map_finish_reason_openai};
use crate::translate::{RequestContext, TranslateContext};
use axum::response::sse::Event;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, TryStreamExt};
use gateway_schema::gemini::GeminiResponseBody;
use serde_json::{json, Value};

/// Decodes the upstream byte stream into native response chunks, unwrapping
/// the `{"response": …}` envelope some upstream transports wrap events in.
fn decode_native_events(
    upstream: reqwest::Response,
) -> impl Stream<Item = Result<GeminiResponseBody, GatewayError>> {
    upstream
        .bytes_stream()
        .eventsource()
        .map_err(|e| DispatchError::UpstreamTransient(e.to_string()).into())
        .try_filter_map(|event| async move {
            if event.data.is_empty() {
                return Ok(None);
            }
            let raw: Value = serde_json::from_str(&event.data).map_err(|e| {
                GatewayError::from(DispatchError::UpstreamTransient(format!("invalid SSE payload: {e}")))
            })?;
            let unwrapped = raw.get("response").cloned().unwrap_or(raw);
            let chunk: GeminiResponseBody = serde_json::from_value(unwrapped).map_err(|e| {
                GatewayError::from(DispatchError::UpstreamTransient(format!("invalid response chunk: {e}")))
            })?;
            Ok(Some(chunk))
        })
}

/// Drains the upstream SSE stream into one consolidated response, used for
/// thinking-capable models where upstream always streams even for
/// "non-streaming" requests (§4.2.5 last paragraph).
pub async fn consolidate(upstream: reqwest::Response) -> Result<GeminiResponseBody, GatewayError> {
    let mut merged = GeminiResponseBody {
        candidates: Vec::new(),
        promptFeedback: None,
        usageMetadata: None,
        modelVersion: None,
        responseId: None,
        extra: Default::default(),
    };
    let mut stream = Box::pin(decode_native_events(upstream));

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(usage) = chunk.usageMetadata {
            merged.usageMetadata = Some(usage);
        }
        if chunk.modelVersion.is_some() {
            merged.modelVersion = chunk.modelVersion;
        }
        for (i, candidate) in chunk.candidates.into_iter().enumerate() {
            match merged.candidates.get_mut(i) {
                Some(existing) => {
                    if let Some(content) = candidate.content {
                        match existing.content.as_mut() {
                            Some(target) => target.parts.extend(content.parts),
                            None => existing.content = Some(content),
                        }
                    }
                    if candidate.finish_reason.is_some() {
                        existing.finish_reason = candidate.finish_reason;
                    }
                }
                None => merged.candidates.push(candidate),
            }
        }
    }

    Ok(merged)
}

/// Streams flat OpenAI `chat.completion.chunk` deltas, terminated by
/// `data: [DONE]` (§4.2.5).
pub fn openai_sse(
    upstream: reqwest::Response,
    rc: RequestContext,
    ctx: TranslateContext,
) -> impl Stream<Item = Result<Event, GatewayError>> {
    let request_id = rc.request_id.clone();
    let events = decode_native_events(upstream).map(move |chunk| {
        let chunk = chunk?;
        let parts = crate::translate::outbound::extract_candidate_parts(&chunk, &rc, &ctx);
        let mut delta = json!({});
        if !parts.text.is_empty() {
            delta["content"] = json!(parts.text);
        }
        if !parts.tool_calls.is_empty() {
            delta["tool_calls"] = json!(
                parts
                    .tool_calls
                    .iter()
                    .enumerate()
                    .map(|(i, call)| json!({
                        "index": i,
                        "id": call.id,
                        "type": "function",
                        "function": { "name": call.name, "arguments": call.args.to_string() },
                    }))
                    .collect::<Vec<_>>()
            );
        }
        let finish_reason = parts.finish_reason.as_deref().map(map_finish_reason_openai);
        let body = json!({
            "id": request_id,
            "object": "chat.completion.chunk",
            "model": rc.requested_model.clone(),
            "choices": [{ "index": 0, "delta": delta, "finish_reason": finish_reason }],
        });
        Event::default().json_data(body).map_err(|e| GatewayError::Internal(e.to_string()))
    });

    events.chain(futures::stream::once(async {
        Ok::<_, GatewayError>(Event::default().data("[DONE]"))
    }))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Thinking,
    Text,
    ToolUse,
}

/// Streams Anthropic's block-framed events: `message_start`, then for each
/// content block a `content_block_start` / `content_block_delta`* /
/// `content_block_stop` triple, then `message_delta` + `message_stop`.
pub fn anthropic_sse(
    upstream: reqwest::Response,
    rc: RequestContext,
    ctx: TranslateContext,
) -> impl Stream<Item = Result<Event, GatewayError>> {
    let message_id = rc.request_id.clone();
    let model = rc.requested_model.clone();

    let started: Vec<Result<Value, GatewayError>> = vec![Ok(json!({
        "type": "message_start",
        "message": {
            "id": message_id,
            "type": "message",
            "role": "assistant",
            "model": model,
            "content": [],
            "stop_reason": Value::Null,
            "usage": { "input_tokens": 0, "output_tokens": 0 },
        }
    }))];
    let started = futures::stream::iter(started);

    let body = decode_native_events(upstream).scan(
        (None::<BlockKind>, 0usize),
        move |(open, index), chunk| {
            let values: Vec<Result<Value, GatewayError>> = match chunk {
                Err(e) => vec![Err(e)],
                Ok(chunk) => {
                    let parts = crate::translate::outbound::extract_candidate_parts(&chunk, &rc, &ctx);
                    let mut events = Vec::new();

                    for thought in &parts.thoughts {
                        transition(open, index, BlockKind::Thinking, &mut events);
                        events.push(json!({
                            "type": "content_block_delta",
                            "index": *index - 1,
                            "delta": { "type": "thinking_delta", "thinking": thought.text },
                        }));
                    }
                    if !parts.text.is_empty() {
                        transition(open, index, BlockKind::Text, &mut events);
                        events.push(json!({
                            "type": "content_block_delta",
                            "index": *index - 1,
                            "delta": { "type": "text_delta", "text": parts.text },
                        }));
                    }
                    for call in &parts.tool_calls {
                        if open.take().is_some() {
                            events.push(json!({ "type": "content_block_stop", "index": *index - 1 }));
                        }
                        events.push(json!({
                            "type": "content_block_start",
                            "index": *index,
                            "content_block": { "type": "tool_use", "id": call.id, "name": call.name, "input": {} },
                        }));
                        events.push(json!({
                            "type": "content_block_delta",
                            "index": *index,
                            "delta": { "type": "input_json_delta", "partial_json": call.args.to_string() },
                        }));
                        events.push(json!({ "type": "content_block_stop", "index": *index }));
                        *index += 1;
                    }

                    if let Some(reason) = parts.finish_reason.as_deref() {
                        if open.take().is_some() {
                            events.push(json!({ "type": "content_block_stop", "index": *index - 1 }));
                        }
                        events.push(json!({
                            "type": "message_delta",
                            "delta": { "stop_reason": map_finish_reason_anthropic(Some(reason)), "stop_sequence": Value::Null },
                            "usage": { "output_tokens": 0 },
                        }));
                        events.push(json!({ "type": "message_stop" }));
                    }

                    events.into_iter().map(Ok).collect()
                }
            };
            async move { Some(values) }
        },
    );

    started
        .map(|v| vec![v])
        .chain(body)
        .flat_map(futures::stream::iter)
        .map(|value: Result<Value, GatewayError>| value.and_then(|v| ok_event(&v)))
}

fn transition(open: &mut Option<BlockKind>, index: &mut usize, kind: BlockKind, events: &mut Vec<Value>) {
    if *open == Some(kind) {
        return;
    }
    if open.is_some() {
        events.push(json!({ "type": "content_block_stop", "index": *index - 1 }));
    }
    let content_block = match kind {
        BlockKind::Thinking => json!({ "type": "thinking", "thinking": "" }),
        BlockKind::Text => json!({ "type": "text", "text": "" }),
        BlockKind::ToolUse => json!({ "type": "tool_use" }),
    };
    events.push(json!({ "type": "content_block_start", "index": *index, "content_block": content_block }));
    *open = Some(kind);
    *index += 1;
}

fn ok_event(value: &Value) -> Result<Event, GatewayError> {
    Event::default().json_data(value).map_err(|e| GatewayError::Internal(e.to_string()))
}

/// Streams near-identity Gemini response chunks as bare JSON values, each
/// wire-shaped like a single `GeminiResponseBody`. Used by both the
/// `alt=sse` and newline-delimited-JSON transports (§6).
pub fn gemini_chunks(
    upstream: reqwest::Response,
    rc: RequestContext,
    ctx: TranslateContext,
) -> impl Stream<Item = Result<Value, GatewayError>> {
    decode_native_events(upstream)
        .map(move |chunk| Ok(crate::translate::outbound::gemini::translate(&chunk?, &rc, &ctx)))
}

/// Streams near-identity Gemini response chunks, each wire-shaped like a
/// single `GeminiResponseBody`.
pub fn gemini_sse(
    upstream: reqwest::Response,
    rc: RequestContext,
    ctx: TranslateContext,
) -> impl Stream<Item = Result<Event, GatewayError>> {
    gemini_chunks(upstream, rc, ctx).map(|chunk| ok_event(&chunk?))
}
