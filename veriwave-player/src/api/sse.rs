//! SSE event stream
//!
//! Streams every `PlayerEvent` from the coordinator's broadcast channel to
//! connected host views.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::api::server::AppContext;

/// GET /events - Subscribe to the playback event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("new SSE client connected");

    let rx = ctx.coordinator.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => Event::default()
                .event(event.kind())
                .json_data(&event)
                .ok()
                .map(Ok),
            Err(e) => {
                // Slow client fell behind the broadcast buffer; skip and go on
                warn!("SSE client lagged: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}
