//! Server-Sent Events (SSE) streaming for real-time UI updates.

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_core::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::state::SharedState;

#[derive(Debug, Deserialize, Default)]
pub struct EventFilter {
    /// Only forward events for this page session or viewer.
    pub scope: Option<Uuid>,
}

/// SSE endpoint; clients subscribe here for real-time updates.
pub async fn sse_handler(
    State(state): State<SharedState>,
    Query(filter): Query<EventFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let stream = BroadcastStream::new(rx)
        .filter_map(move |result| {
            result
                .ok()
                .filter(|event| filter.scope.map_or(true, |scope| event.scope() == scope))
                .and_then(|event| {
                    serde_json::to_string(&event).ok().map(|data| {
                        Ok(Event::default().event(event.kind()).data(data))
                    })
                })
        });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

