//! DTO definitions for the ranked per-event scoreboard.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::TeamStandingEntity;
use crate::dto::format_offset_time;

/// One ranked line of the scoreboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamStanding {
    /// 1-based position after applying the ranking rule.
    pub rank: u32,
    /// Team the line belongs to.
    pub team_id: Uuid,
    /// Display name of the team.
    pub name: String,
    /// Sum of points awarded across the team's questions.
    pub total_points: i64,
    /// Questions answered correctly.
    pub questions_solved: i64,
    /// Questions in a terminal state, solved or not.
    pub questions_completed: i64,
    /// Most recent correct answer, RFC 3339; absent when nothing was solved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_answer_time: Option<String>,
}

impl TeamStanding {
    /// Attach a rank to an aggregate row.
    pub fn from_entity(rank: u32, entity: TeamStandingEntity) -> Self {
        Self {
            rank,
            team_id: entity.team_id,
            name: entity.name,
            total_points: entity.total_points,
            questions_solved: entity.questions_solved,
            questions_completed: entity.questions_completed,
            last_answer_time: entity.last_answer_time.map(format_offset_time),
        }
    }
}

/// Full ranked scoreboard for one event; always pushed whole, never as a diff.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreboardResponse {
    /// Event the scoreboard belongs to.
    pub event_id: Uuid,
    /// Display name of the event.
    pub event_name: String,
    /// Ranked standings, best team first.
    pub standings: Vec<TeamStanding>,
}
