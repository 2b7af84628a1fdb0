//! # Progress Stream Handler
//!
//! Long-lived SSE endpoint relaying import progress to an observing
//! administrator. The subscriber gets a `connected` acknowledgement
//! immediately, then every published event in publish order, with periodic
//! comment-only keep-alive lines in between. Disconnecting tears down only
//! the subscription; a running import is unaffected.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};

use crate::auth::OperatorAuth;
use crate::progress::ProgressEvent;
use crate::server::AppState;

/// Subscribe to live progress for an import session
#[utoipa::path(
    get,
    path = "/api/import/progress/{session_id}",
    security(("bearer_auth" = [])),
    params(
        ("session_id" = String, Path, description = "Progress session identifier, chosen by the import caller")
    ),
    responses(
        (status = 200, description = "SSE stream of progress events", content_type = "text/event-stream"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    tag = "import"
)]
pub async fn progress_stream(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.progress.subscribe(&session_id);

    // The acknowledgement goes through the channel so it is ordered ahead
    // of everything the orchestrator publishes afterwards.
    state
        .progress
        .publish(&session_id, ProgressEvent::connected());

    let stream = subscription.map(|event| {
        let name = event.kind.clone();
        Event::default().event(name).json_data(&event)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new().interval(Duration::from_secs(state.config.progress_heartbeat_seconds)),
    )
}
