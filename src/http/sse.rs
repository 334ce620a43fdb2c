//! Server-sent ranking updates
//!
//! Each connection gets its own broadcaster subscription. The subscription is
//! owned by the response stream, so it is released when the client goes away.

use crate::service::AppState;
use crate::types::RankingEvent;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

/// `GET /api/ranking/events`
pub async fn ranking_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.store().broadcaster().subscribe();
    debug!("Event stream opened for subscriber {}", subscription.id());

    let stream = subscription.map(|player| Event::default().json_data(RankingEvent::from(player)));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.config().sse_keep_alive()))
}
