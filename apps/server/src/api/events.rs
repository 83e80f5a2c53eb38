//! Server-sent event stream of domain events.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::main_lib::AppState;

/// Lagged receivers skip what they missed rather than closing the stream.
async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.event_bus.subscribe()).filter_map(|message| {
        let event = message.ok()?;
        let sse = Event::default().event(event.name.as_str());
        let sse = match &event.payload {
            Some(payload) => sse.json_data(payload).ok()?,
            None => sse,
        };
        Some(Ok::<_, Infallible>(sse))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(stream_events))
}
