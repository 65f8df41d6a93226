//! Shared SSE plumbing: every family's stream must emit a terminal error
//! frame in its own shape and close rather than propagate a raw rejection
//! mid-stream (§7 — "SSE streams that fail after first-byte emit a
//! terminal error frame in the active protocol and close").

use crate::error::GatewayError;
use axum::response::sse::Event;
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::pin::Pin;

/// Wraps a fallible event stream so that the first error is rendered
/// through `render_error` and terminates the stream; no further polling of
/// the upstream happens afterward.
pub fn terminate_on_error<S>(
    stream: S,
    render_error: fn(GatewayError) -> Event,
) -> impl Stream<Item = Result<Event, Infallible>>
where
    S: Stream<Item = Result<Event, GatewayError>> + Send + 'static,
{
    let boxed: Pin<Box<dyn Stream<Item = Result<Event, GatewayError>> + Send>> = Box::pin(stream);
    futures::stream::unfold((boxed, false), move |(mut inner, done)| async move {
        if done {
            return None;
        }
        match inner.next().await {
            None => None,
            Some(Ok(event)) => Some((Ok(event), (inner, false))),
            Some(Err(err)) => Some((Ok(render_error(err)), (inner, true))),
        }
    })
}
