//! Read-only aggregation producing the ranked scoreboard for one event.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::{
    dao::models::TeamStandingEntity,
    dto::scoreboard::{ScoreboardResponse, TeamStanding},
    error::ServiceError,
    state::SharedState,
};

/// Compute the ranked scoreboard for an event.
///
/// The store returns unordered per-team aggregates (teams without progress
/// included, zero-valued); the single ranking rule lives here so every
/// backend ranks identically.
pub async fn get_scoreboard(
    state: &SharedState,
    event_id: Uuid,
) -> Result<ScoreboardResponse, ServiceError> {
    let store = state.require_progress_store().await?;

    let event = store
        .find_event(event_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("event `{event_id}` not found")))?;

    let mut standings = store.event_standings(event_id).await?;
    rank_standings(&mut standings);

    let standings = standings
        .into_iter()
        .enumerate()
        .map(|(index, entity)| TeamStanding::from_entity(index as u32 + 1, entity))
        .collect();

    Ok(ScoreboardResponse {
        event_id,
        event_name: event.name,
        standings,
    })
}

/// Order standings best-first: points, then solved count, then who got there
/// first. A team that solved the same amount for the same points ranks above
/// a slower team; teams that never answered sort after any answering team.
/// Name is the final tie-break so the ordering is total.
fn rank_standings(standings: &mut [TeamStandingEntity]) {
    standings.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then(b.questions_solved.cmp(&a.questions_solved))
            .then_with(|| compare_last_answer(a, b))
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn compare_last_answer(a: &TeamStandingEntity, b: &TeamStandingEntity) -> Ordering {
    match (a.last_answer_time, b.last_answer_time) {
        (Some(a_time), Some(b_time)) => a_time.cmp(&b_time),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use super::*;

    fn standing(
        name: &str,
        total_points: i64,
        questions_solved: i64,
        last_answer_secs: Option<i64>,
    ) -> TeamStandingEntity {
        TeamStandingEntity {
            team_id: Uuid::new_v4(),
            name: name.into(),
            total_points,
            questions_solved,
            questions_completed: questions_solved,
            last_answer_time: last_answer_secs
                .map(|secs| OffsetDateTime::UNIX_EPOCH + Duration::seconds(secs)),
        }
    }

    fn names(standings: &[TeamStandingEntity]) -> Vec<&str> {
        standings.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn ranks_points_then_solved_then_speed() {
        let mut standings = vec![
            standing("slow", 300, 2, Some(20)),
            standing("fast", 300, 2, Some(10)),
            standing("prolific", 300, 3, Some(30)),
        ];

        rank_standings(&mut standings);

        assert_eq!(names(&standings), vec!["prolific", "fast", "slow"]);
    }

    #[test]
    fn teams_without_answers_rank_after_answering_teams() {
        let mut standings = vec![
            standing("idle", 0, 0, None),
            standing("tried", 0, 0, Some(5)),
        ];

        rank_standings(&mut standings);

        assert_eq!(names(&standings), vec!["tried", "idle"]);
    }

    #[test]
    fn name_breaks_full_ties_deterministically() {
        let mut standings = vec![
            standing("zebra", 100, 1, Some(10)),
            standing("aardvark", 100, 1, Some(10)),
        ];

        rank_standings(&mut standings);

        assert_eq!(names(&standings), vec!["aardvark", "zebra"]);
    }
}
