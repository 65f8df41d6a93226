//! OpenAI Chat Completions surface (§6, §4.2).

use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use gateway_schema::openai::{ChatCompletionRequest, OpenaiModelList};

use super::{AppState, apply_streaming_headers, sse_util::terminate_on_error};
use crate::error::GatewayError;
use crate::translate;

pub async fn chat_completions(State(state): State<AppState>, Json(req): Json<ChatCompletionRequest>) -> Response {
    match run(state, req).await {
        Ok(resp) => resp,
        Err(err) => err.into_openai_response(),
    }
}

async fn run(state: AppState, req: ChatCompletionRequest) -> Result<Response, GatewayError> {
    let client_wants_stream = req.stream.unwrap_or(false);
    let (body, rc) = translate::inbound::openai::translate(req, &state.translate)?;
    let effective_stream = client_wants_stream || rc.thinking_capable;

    let upstream = state.dispatcher.dispatch(body, effective_stream).await?;

    if client_wants_stream {
        let events = translate::stream::openai_sse(upstream, rc, state.translate.clone());
        let stream = terminate_on_error(events, render_error_frame);
        let mut resp = Sse::new(stream).keep_alive(KeepAlive::default()).into_response();
        apply_streaming_headers(&mut resp);
        Ok(resp)
    } else {
        let native = if rc.thinking_capable {
            translate::stream::consolidate(upstream).await?
        } else {
            upstream.json().await?
        };
        let body = translate::outbound::openai::translate(&native, &rc, &state.translate);
        Ok(Json(body).into_response())
    }
}

fn render_error_frame(err: GatewayError) -> Event {
    let resp = err.into_openai_response();
    let status = resp.status();
    Event::default()
        .event("error")
        .data(format!("{{\"error\":{{\"status\":{}}}}}", status.as_u16()))
}

/// There is no fixed model catalog (every model name is passed through to
/// upstream verbatim); this echoes the handful of names the translator
/// recognizes for thinking-capability detection (§4.2.1).
pub async fn list_models() -> Json<OpenaiModelList> {
    Json(OpenaiModelList::from_model_names(
        crate::translate::model::KNOWN_MODELS.iter().copied(),
        "antigravity".to_string(),
    ))
}
