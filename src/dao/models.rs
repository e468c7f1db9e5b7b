use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Difficulty tier assigned to a question by the content layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Entry-level question worth 100 base points.
    Easy,
    /// Mid-tier question worth 200 base points.
    Medium,
    /// Hardest tier worth 300 base points.
    Hard,
}

impl Difficulty {
    /// Base points awarded for a correct answer before bonus and penalty.
    pub fn base_points(self) -> i32 {
        match self {
            Difficulty::Easy => 100,
            Difficulty::Medium => 200,
            Difficulty::Hard => 300,
        }
    }

    /// Canonical lowercase name used in persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Parse the persisted representation back into the enum.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Event record owned by the external CRUD layer; the core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEntity {
    /// Stable identifier for the event.
    pub id: Uuid,
    /// Display name of the event.
    pub name: String,
    /// Whether the event has been opened for play.
    pub started: bool,
}

/// Team record owned by the external CRUD layer; the core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Event the team is registered in.
    pub event_id: Uuid,
    /// Display name chosen for the team.
    pub name: String,
}

/// Question record owned by the external CRUD layer; the core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Event the question belongs to.
    pub event_id: Uuid,
    /// Difficulty tier used to derive base points.
    pub difficulty: Difficulty,
    /// Expected solution text; matching is trimmed and case-insensitive.
    pub solution: String,
    /// Time budget in seconds; the question schema guarantees this is positive.
    pub time_limit_seconds: i32,
    /// First hint, cheapest penalty.
    pub tip_1: String,
    /// Second hint.
    pub tip_2: String,
    /// Third hint revealing the full solution; zeroes the score.
    pub tip_3: String,
}

impl QuestionEntity {
    /// Tip text for a level in 1..=3, `None` outside that range.
    pub fn tip_text(&self, tip_number: u8) -> Option<&str> {
        match tip_number {
            1 => Some(&self.tip_1),
            2 => Some(&self.tip_2),
            3 => Some(&self.tip_3),
            _ => None,
        }
    }
}

/// Progress row for one (team, question) pair; the single source of truth
/// mutated exclusively by the lifecycle controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEntity {
    /// Team half of the composite key.
    pub team_id: Uuid,
    /// Question half of the composite key.
    pub question_id: Uuid,
    /// First submitted answer, if any.
    pub attempt_1: Option<String>,
    /// Second submitted answer, if any.
    pub attempt_2: Option<String>,
    /// Third and last submitted answer, if any.
    pub attempt_3: Option<String>,
    /// Highest tip level revealed so far (0 = none, 3 = solution).
    pub used_tip: u8,
    /// True once a matching answer was recorded.
    pub correct: bool,
    /// Terminal flag; a completed row never changes again.
    pub completed: bool,
    /// Set once, at the first interaction with the pair.
    pub time_started: OffsetDateTime,
    /// Set only when `correct` becomes true.
    pub time_answered: Option<OffsetDateTime>,
    /// Points stored once when `correct` becomes true; never recomputed.
    pub points_awarded: i32,
    /// Optimistic-concurrency counter bumped on every update.
    pub revision: i64,
}

impl ProgressEntity {
    /// Fresh row for a pair that was just touched for the first time.
    pub fn new(team_id: Uuid, question_id: Uuid, now: OffsetDateTime) -> Self {
        Self {
            team_id,
            question_id,
            attempt_1: None,
            attempt_2: None,
            attempt_3: None,
            used_tip: 0,
            correct: false,
            completed: false,
            time_started: now,
            time_answered: None,
            points_awarded: 0,
            revision: 0,
        }
    }

    /// Number of attempt slots already filled.
    pub fn attempts_used(&self) -> u8 {
        [&self.attempt_1, &self.attempt_2, &self.attempt_3]
            .into_iter()
            .filter(|slot| slot.is_some())
            .count() as u8
    }

    /// Append to the first empty slot, returning the new attempt count.
    /// Slots fill strictly left to right; `None` when all three are taken.
    pub fn push_attempt(&mut self, text: String) -> Option<u8> {
        let slot = if self.attempt_1.is_none() {
            &mut self.attempt_1
        } else if self.attempt_2.is_none() {
            &mut self.attempt_2
        } else if self.attempt_3.is_none() {
            &mut self.attempt_3
        } else {
            return None;
        };
        *slot = Some(text);
        Some(self.attempts_used())
    }
}

/// Per-team aggregate produced by the standings query, unranked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamStandingEntity {
    /// Team the aggregate belongs to.
    pub team_id: Uuid,
    /// Display name carried along for presentation.
    pub name: String,
    /// Sum of `points_awarded` over the team's progress rows.
    pub total_points: i64,
    /// Number of rows with `correct = true`.
    pub questions_solved: i64,
    /// Number of rows with `completed = true`.
    pub questions_completed: i64,
    /// Most recent `time_answered`, when the team has solved anything.
    pub last_answer_time: Option<OffsetDateTime>,
}

/// Result of inserting a fresh progress row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was created; the caller's timestamps won the race.
    Inserted,
    /// A row for the pair already exists; the caller must re-read it.
    Conflict,
}

/// Result of a revision-guarded progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update matched the expected revision and was applied.
    Applied,
    /// The stored revision moved on; the caller must re-read and retry.
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_fill_left_to_right() {
        let mut row = ProgressEntity::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            OffsetDateTime::UNIX_EPOCH,
        );

        assert_eq!(row.push_attempt("a".into()), Some(1));
        assert_eq!(row.push_attempt("b".into()), Some(2));
        assert_eq!(row.push_attempt("c".into()), Some(3));
        assert_eq!(row.push_attempt("d".into()), None);

        assert_eq!(row.attempt_1.as_deref(), Some("a"));
        assert_eq!(row.attempt_2.as_deref(), Some("b"));
        assert_eq!(row.attempt_3.as_deref(), Some("c"));
    }

    #[test]
    fn difficulty_round_trips_through_persistence() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(Difficulty::parse(difficulty.as_str()), Some(difficulty));
        }
        assert_eq!(Difficulty::parse("impossible"), None);
    }
}
