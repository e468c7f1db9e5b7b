use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::scoreboard::ScoreboardResponse,
    error::AppError,
    services::{scoreboard_push, scoreboard_service, sse_service},
    state::SharedState,
};

/// Configure the scoreboard endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/events/{id}/scoreboard", get(get_scoreboard))
        .route("/events/{id}/scoreboard/sse", get(scoreboard_stream))
}

/// Pull the current ranked scoreboard for an event.
#[utoipa::path(
    get,
    path = "/events/{id}/scoreboard",
    tag = "scoreboard",
    params(("id" = Uuid, Path, description = "Identifier of the event")),
    responses(
        (status = 200, description = "Ranked scoreboard", body = ScoreboardResponse)
    )
)]
pub async fn get_scoreboard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreboardResponse>, AppError> {
    let scoreboard = scoreboard_service::get_scoreboard(&state, id).await?;
    Ok(Json(scoreboard))
}

/// Stream scoreboard snapshots for an event over SSE.
///
/// The subscriber is registered before the initial push so the fresh
/// snapshot is the first thing it receives.
#[utoipa::path(
    get,
    path = "/events/{id}/scoreboard/sse",
    tag = "scoreboard",
    params(("id" = Uuid, Path, description = "Identifier of the event")),
    responses((status = 200, description = "Scoreboard SSE stream", content_type = "text/event-stream", body = String))
)]
pub async fn scoreboard_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let receiver = sse_service::subscribe_scoreboard(&state, id);
    scoreboard_push::push_scoreboard(&state, id).await?;
    info!(event_id = %id, "new scoreboard SSE connection");
    Ok(sse_service::to_sse_stream(receiver, id))
}
