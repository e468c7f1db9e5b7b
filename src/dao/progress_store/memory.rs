//! In-memory progress store used for development without a database and as
//! the backend for the test suites.

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use std::sync::Arc;
use uuid::Uuid;

use crate::dao::{
    models::{
        EventEntity, InsertOutcome, ProgressEntity, QuestionEntity, TeamEntity,
        TeamStandingEntity, UpdateOutcome,
    },
    progress_store::ProgressStore,
    storage::StorageResult,
};

/// Map-backed store with the same atomicity semantics as the SQL backend:
/// inserts race through the map entry, updates are revision-guarded.
#[derive(Clone, Default)]
pub struct MemoryProgressStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    events: DashMap<Uuid, EventEntity>,
    teams: DashMap<Uuid, TeamEntity>,
    questions: DashMap<Uuid, QuestionEntity>,
    progress: DashMap<(Uuid, Uuid), ProgressEntity>,
}

impl MemoryProgressStore {
    /// Fresh store with no records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event record; stands in for the external CRUD layer.
    pub fn put_event(&self, event: EventEntity) {
        self.inner.events.insert(event.id, event);
    }

    /// Seed a team record; stands in for the external CRUD layer.
    pub fn put_team(&self, team: TeamEntity) {
        self.inner.teams.insert(team.id, team);
    }

    /// Seed a question record; stands in for the external CRUD layer.
    pub fn put_question(&self, question: QuestionEntity) {
        self.inner.questions.insert(question.id, question);
    }

    fn standings(&self, event_id: Uuid) -> Vec<TeamStandingEntity> {
        let mut standings = Vec::new();

        for team in self
            .inner
            .teams
            .iter()
            .filter(|team| team.event_id == event_id)
        {
            let mut standing = TeamStandingEntity {
                team_id: team.id,
                name: team.name.clone(),
                total_points: 0,
                questions_solved: 0,
                questions_completed: 0,
                last_answer_time: None,
            };

            for row in self
                .inner
                .progress
                .iter()
                .filter(|row| row.team_id == team.id)
            {
                standing.total_points += i64::from(row.points_awarded);
                if row.correct {
                    standing.questions_solved += 1;
                }
                if row.completed {
                    standing.questions_completed += 1;
                }
                if let Some(answered) = row.time_answered {
                    standing.last_answer_time = Some(match standing.last_answer_time {
                        Some(current) if current >= answered => current,
                        _ => answered,
                    });
                }
            }

            standings.push(standing);
        }

        standings
    }
}

impl ProgressStore for MemoryProgressStore {
    fn insert_progress(
        &self,
        row: ProgressEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            let outcome = match store.inner.progress.entry((row.team_id, row.question_id)) {
                Entry::Occupied(_) => InsertOutcome::Conflict,
                Entry::Vacant(slot) => {
                    slot.insert(row);
                    InsertOutcome::Inserted
                }
            };
            Ok(outcome)
        })
    }

    fn find_progress(
        &self,
        team_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .progress
                .get(&(team_id, question_id))
                .map(|row| row.clone()))
        })
    }

    fn update_progress(
        &self,
        mut row: ProgressEntity,
    ) -> BoxFuture<'static, StorageResult<UpdateOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(mut stored) = store.inner.progress.get_mut(&(row.team_id, row.question_id))
            else {
                return Ok(UpdateOutcome::Stale);
            };

            if stored.revision != row.revision {
                return Ok(UpdateOutcome::Stale);
            }

            row.revision += 1;
            *stored = row;
            Ok(UpdateOutcome::Applied)
        })
    }

    fn find_event(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.events.get(&id).map(|event| event.clone())) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.teams.get(&id).map(|team| team.clone())) })
    }

    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .questions
                .get(&id)
                .map(|question| question.clone()))
        })
    }

    fn event_standings(
        &self,
        event_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamStandingEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.standings(event_id)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn row(team_id: Uuid, question_id: Uuid) -> ProgressEntity {
        ProgressEntity::new(team_id, question_id, OffsetDateTime::UNIX_EPOCH)
    }

    #[tokio::test]
    async fn second_insert_for_a_pair_reports_conflict() {
        let store = MemoryProgressStore::new();
        let (team_id, question_id) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store.insert_progress(row(team_id, question_id)).await.unwrap();
        let second = store.insert_progress(row(team_id, question_id)).await.unwrap();

        assert_eq!(first, InsertOutcome::Inserted);
        assert_eq!(second, InsertOutcome::Conflict);
    }

    #[tokio::test]
    async fn stale_revision_update_is_rejected() {
        let store = MemoryProgressStore::new();
        let (team_id, question_id) = (Uuid::new_v4(), Uuid::new_v4());
        store.insert_progress(row(team_id, question_id)).await.unwrap();

        let mut fresh = store
            .find_progress(team_id, question_id)
            .await
            .unwrap()
            .unwrap();
        fresh.used_tip = 1;
        assert_eq!(
            store.update_progress(fresh.clone()).await.unwrap(),
            UpdateOutcome::Applied
        );

        // Same revision again: the stored row has moved on.
        assert_eq!(
            store.update_progress(fresh).await.unwrap(),
            UpdateOutcome::Stale
        );

        let stored = store
            .find_progress(team_id, question_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.used_tip, 1);
        assert_eq!(stored.revision, 1);
    }

    #[tokio::test]
    async fn standings_cover_teams_without_progress() {
        let store = MemoryProgressStore::new();
        let event_id = Uuid::new_v4();
        store.put_team(TeamEntity {
            id: Uuid::new_v4(),
            event_id,
            name: "idle team".into(),
        });

        let standings = store.event_standings(event_id).await.unwrap();
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].total_points, 0);
        assert_eq!(standings[0].questions_solved, 0);
        assert!(standings[0].last_answer_time.is_none());
    }
}
