//! Gemini `generateContent`/`streamGenerateContent` surface (§6, §4.2).
//!
//! Unlike the other two families, the model name and the action both live in
//! the URL path (`models/{model}:generateContent`), so routing happens in two
//! steps: axum matches the literal prefix, then `split_action` pulls the
//! model and verb out of the trailing path segment the way the upstream CLI
//! extractor this is grounded on does.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use gateway_schema::gemini::{GeminiGenerateContentRequest, GeminiModel, GeminiModelList};
use serde::Deserialize;

use super::{AppState, apply_streaming_headers, sse_util::terminate_on_error};
use crate::error::GatewayError;
use crate::translate;

#[derive(Debug, Deserialize)]
pub struct AltQuery {
    alt: Option<String>,
}

/// Splits a trailing `models/{model}:{action}` path segment into its model
/// name and action/verb.
fn split_action(rest: &str) -> (&str, Option<&str>) {
    let last = rest.rsplit('/').next().unwrap_or(rest);
    match last.split_once(':') {
        Some((model, action)) => (model, Some(action)),
        None => (last, None),
    }
}

pub async fn list_models() -> Json<GeminiModelList> {
    Json(GeminiModelList::from_model_names(crate::translate::model::KNOWN_MODELS.iter().copied()))
}

pub async fn get_model(Path(rest): Path<String>) -> Json<GeminiModel> {
    let (model, _) = split_action(&rest);
    Json(GeminiModel { name: model.to_string(), display_name: model.to_string(), ..GeminiModel::default() })
}

pub async fn dispatch_path(
    State(state): State<AppState>,
    Path(rest): Path<String>,
    Query(alt): Query<AltQuery>,
    Json(req): Json<GeminiGenerateContentRequest>,
) -> Response {
    let (model, action) = split_action(&rest);
    let client_wants_stream = matches!(action, Some(a) if a.starts_with("streamGenerateContent"));
    let as_sse = alt.alt.as_deref() == Some("sse");

    match run(state, model, req, client_wants_stream, as_sse).await {
        Ok(resp) => resp,
        Err(err) => err.into_gemini_response(),
    }
}

async fn run(
    state: AppState,
    model: &str,
    req: GeminiGenerateContentRequest,
    client_wants_stream: bool,
    as_sse: bool,
) -> Result<Response, GatewayError> {
    let (body, rc) = translate::inbound::gemini::translate(model, req, &state.translate)?;
    let effective_stream = client_wants_stream || rc.thinking_capable;

    let upstream = state.dispatcher.dispatch(body, effective_stream).await?;

    if client_wants_stream {
        let mut resp = if as_sse {
            let events = translate::stream::gemini_sse(upstream, rc, state.translate.clone());
            let stream = terminate_on_error(events, render_error_frame);
            Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
        } else {
            let chunks = translate::stream::gemini_chunks(upstream, rc, state.translate.clone());
            ndjson_response(chunks).await?
        };
        apply_streaming_headers(&mut resp);
        Ok(resp)
    } else {
        let native = if rc.thinking_capable {
            translate::stream::consolidate(upstream).await?
        } else {
            upstream.json().await?
        };
        let body = translate::outbound::gemini::translate(&native, &rc, &state.translate);
        Ok(Json(body).into_response())
    }
}

fn render_error_frame(err: GatewayError) -> Event {
    let resp = err.into_gemini_response();
    let status = resp.status();
    Event::default()
        .event("error")
        .data(format!("{{\"error\":{{\"status\":{}}}}}", status.as_u16()))
}

/// Non-`alt=sse` streaming clients expect newline-delimited JSON objects
/// rather than an `event-stream` (§6). Each upstream chunk is rendered as
/// one compact JSON line as soon as it arrives — the response body is a
/// genuinely incremental stream, not a buffer drained to completion before
/// the first byte is sent; the first error renders one error line and
/// closes the body, matching the SSE families' `terminate_on_error` (§7).
async fn ndjson_response(
    chunks: impl futures::Stream<Item = Result<serde_json::Value, GatewayError>> + Send + 'static,
) -> Result<Response, GatewayError> {
    use axum::body::Body;
    use futures::StreamExt;
    use std::convert::Infallible;
    use std::pin::Pin;

    let boxed: Pin<Box<dyn futures::Stream<Item = Result<serde_json::Value, GatewayError>> + Send>> =
        Box::pin(chunks);

    let lines = futures::stream::unfold((boxed, false), move |(mut inner, done)| async move {
        if done {
            return None;
        }
        match inner.next().await {
            None => None,
            Some(Ok(value)) => {
                let line = format!("{value}\n");
                Some((Ok::<_, Infallible>(line), (inner, false)))
            }
            Some(Err(err)) => {
                let line = format!("{}\n", render_error_line(err));
                Some((Ok(line), (inner, true)))
            }
        }
    });

    let mut resp = Response::new(Body::from_stream(lines));
    resp.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("application/x-ndjson"),
    );
    Ok(resp)
}

fn render_error_line(err: GatewayError) -> String {
    let resp = err.into_gemini_response();
    format!("{{\"error\":{{\"status\":{}}}}}", resp.status().as_u16())
}
