//! Push discipline for scoreboard snapshots: on-solve pushes plus a periodic
//! re-push that papers over any dropped message.

use tokio::time::{MissedTickBehavior, interval};
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::sse::ServerEvent, error::ServiceError, services::scoreboard_service, state::SharedState,
};

/// SSE event name carried by every scoreboard snapshot.
pub const SCOREBOARD_EVENT: &str = "scoreboard";

/// Recompute an event's scoreboard and broadcast it to all subscribers.
pub async fn push_scoreboard(state: &SharedState, event_id: Uuid) -> Result<(), ServiceError> {
    let scoreboard = scoreboard_service::get_scoreboard(state, event_id).await?;
    match ServerEvent::json(Some(SCOREBOARD_EVENT.to_string()), &scoreboard) {
        Ok(event) => state.scoreboard().broadcast(event_id, event),
        Err(err) => warn!(%event_id, error = %err, "failed to serialise scoreboard snapshot"),
    }
    Ok(())
}

/// Push after a successful answer, never failing the answer that triggered it.
///
/// The row mutation already committed; subscribers who miss this snapshot
/// catch up on the next periodic re-push.
pub async fn push_after_solve(state: &SharedState, event_id: Uuid) {
    if let Err(err) = push_scoreboard(state, event_id).await {
        warn!(%event_id, error = %err, "scoreboard push after solve failed");
    }
}

/// Periodically re-push the scoreboard of every event with live subscribers.
pub async fn run(state: SharedState) {
    let mut ticker = interval(state.config().push_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        state.scoreboard().prune();
        if state.is_degraded() {
            continue;
        }

        for event_id in state.scoreboard().active_events() {
            if let Err(err) = push_scoreboard(&state, event_id).await {
                warn!(%event_id, error = %err, "periodic scoreboard push failed");
            }
        }
    }
}
