use std::convert::Infallible;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::http::header::{CONNECTION, HeaderName};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};

use tripwise_relay::sse::SseEvent;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Create an SSE Event from a client event.
pub fn sse_event(event: &SseEvent) -> Result<Event, Infallible> {
    Ok(Event::default()
        .event(event.event_type())
        .data(event.data_json()))
}

/// Stream client events as `text/event-stream`.
///
/// Keep-alive comments go out every 15 seconds while agents are thinking.
/// Proxy buffering is disabled so each frame is flushed as it is produced.
pub fn sse_response<S>(events: S) -> Response
where
    S: Stream<Item = SseEvent> + Send + 'static,
{
    let stream = events.map(|event| sse_event(&event));
    let sse = Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    );
    (
        [
            (CONNECTION, HeaderValue::from_static("keep-alive")),
            (X_ACCEL_BUFFERING, HeaderValue::from_static("no")),
        ],
        sse,
    )
        .into_response()
}
