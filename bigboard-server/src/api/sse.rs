//! Server-Sent Events: the live board feed
//!
//! Each stream is one viewer connection. The stream owns the hub
//! subscription, so when the client goes away axum drops the stream and the
//! connection is removed from the hub.

use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tracing::{debug, warn};

use super::error::ApiResult;
use crate::AppState;

/// GET /api/events
///
/// Streams one `init` event, then an `update` after every change. The SSE
/// `id` is the snapshot revision.
pub async fn event_stream(
    State(state): State<AppState>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let mut subscription = state.board.subscribe().await?;
    debug!("SSE stream opened for viewer {}", subscription.id());

    let stream = stream! {
        while let Some(event) = subscription.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    yield Ok(Event::default()
                        .event(event.kind.as_str())
                        .id(event.revision.to_string())
                        .data(json));
                }
                Err(e) => warn!("Failed to serialize board event: {}", e),
            }
        }
        debug!("SSE stream closed for viewer {}", subscription.id());
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
