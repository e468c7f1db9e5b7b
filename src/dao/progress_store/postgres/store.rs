use std::sync::Arc;

use futures::future::BoxFuture;
use sqlx::{
    Row,
    postgres::{PgPool, PgPoolOptions, PgRow},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::PgConfig,
    error::{PgDaoError, PgResult},
    schema,
};
use crate::dao::{
    models::{
        Difficulty, EventEntity, InsertOutcome, ProgressEntity, QuestionEntity, TeamEntity,
        TeamStandingEntity, UpdateOutcome,
    },
    progress_store::ProgressStore,
    storage::StorageResult,
};

/// Progress store backed by a PostgreSQL connection pool.
///
/// The pool sits behind an `RwLock` so `try_reconnect` can swap in a fresh
/// pool without interrupting readers holding clones of the old one.
#[derive(Clone)]
pub struct PgProgressStore {
    inner: Arc<PgInner>,
}

struct PgInner {
    pool: RwLock<PgPool>,
    config: PgConfig,
}

impl PgProgressStore {
    /// Establish a connection pool and ensure the schema is present.
    pub async fn connect(config: PgConfig) -> PgResult<Self> {
        let pool = build_pool(&config).await?;
        ensure_schema(&pool).await?;

        Ok(Self {
            inner: Arc::new(PgInner {
                pool: RwLock::new(pool),
                config,
            }),
        })
    }

    async fn pool(&self) -> PgPool {
        self.inner.pool.read().await.clone()
    }

    async fn reconnect(&self) -> PgResult<()> {
        let pool = build_pool(&self.inner.config).await?;
        ensure_schema(&pool).await?;
        let mut guard = self.inner.pool.write().await;
        *guard = pool;
        Ok(())
    }

    async fn ping(&self) -> PgResult<()> {
        let pool = self.pool().await;
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|source| PgDaoError::Query {
                operation: "health ping",
                source,
            })?;
        Ok(())
    }

    async fn insert_progress(&self, row: ProgressEntity) -> PgResult<InsertOutcome> {
        let pool = self.pool().await;
        let result = sqlx::query(
            r"INSERT INTO team_progress
                  (team_id, question_id, attempt_1, attempt_2, attempt_3, used_tip,
                   correct, completed, time_started, time_answered, points_awarded, revision)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
              ON CONFLICT (team_id, question_id) DO NOTHING",
        )
        .bind(row.team_id)
        .bind(row.question_id)
        .bind(&row.attempt_1)
        .bind(&row.attempt_2)
        .bind(&row.attempt_3)
        .bind(i16::from(row.used_tip))
        .bind(row.correct)
        .bind(row.completed)
        .bind(row.time_started)
        .bind(row.time_answered)
        .bind(row.points_awarded)
        .bind(row.revision)
        .execute(&pool)
        .await
        .map_err(|source| PgDaoError::Query {
            operation: "insert progress",
            source,
        })?;

        if result.rows_affected() == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::Conflict)
        }
    }

    async fn find_progress(
        &self,
        team_id: Uuid,
        question_id: Uuid,
    ) -> PgResult<Option<ProgressEntity>> {
        let pool = self.pool().await;
        let row = sqlx::query(
            r"SELECT team_id, question_id, attempt_1, attempt_2, attempt_3, used_tip,
                     correct, completed, time_started, time_answered, points_awarded, revision
              FROM team_progress
              WHERE team_id = $1 AND question_id = $2",
        )
        .bind(team_id)
        .bind(question_id)
        .fetch_optional(&pool)
        .await
        .map_err(|source| PgDaoError::Query {
            operation: "find progress",
            source,
        })?;

        row.map(|row| progress_from_row(&row)).transpose()
    }

    async fn update_progress(&self, row: ProgressEntity) -> PgResult<UpdateOutcome> {
        let pool = self.pool().await;
        let result = sqlx::query(
            r"UPDATE team_progress
              SET attempt_1 = $3, attempt_2 = $4, attempt_3 = $5, used_tip = $6,
                  correct = $7, completed = $8, time_started = $9, time_answered = $10,
                  points_awarded = $11, revision = revision + 1
              WHERE team_id = $1 AND question_id = $2 AND revision = $12",
        )
        .bind(row.team_id)
        .bind(row.question_id)
        .bind(&row.attempt_1)
        .bind(&row.attempt_2)
        .bind(&row.attempt_3)
        .bind(i16::from(row.used_tip))
        .bind(row.correct)
        .bind(row.completed)
        .bind(row.time_started)
        .bind(row.time_answered)
        .bind(row.points_awarded)
        .bind(row.revision)
        .execute(&pool)
        .await
        .map_err(|source| PgDaoError::Query {
            operation: "update progress",
            source,
        })?;

        if result.rows_affected() == 1 {
            Ok(UpdateOutcome::Applied)
        } else {
            Ok(UpdateOutcome::Stale)
        }
    }

    async fn find_event(&self, id: Uuid) -> PgResult<Option<EventEntity>> {
        let pool = self.pool().await;
        let row = sqlx::query("SELECT id, name, started FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(|source| PgDaoError::Query {
                operation: "find event",
                source,
            })?;

        row.map(|row| {
            Ok(EventEntity {
                id: try_get(&row, "id")?,
                name: try_get(&row, "name")?,
                started: try_get(&row, "started")?,
            })
        })
        .transpose()
    }

    async fn find_team(&self, id: Uuid) -> PgResult<Option<TeamEntity>> {
        let pool = self.pool().await;
        let row = sqlx::query("SELECT id, event_id, name FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(|source| PgDaoError::Query {
                operation: "find team",
                source,
            })?;

        row.map(|row| {
            Ok(TeamEntity {
                id: try_get(&row, "id")?,
                event_id: try_get(&row, "event_id")?,
                name: try_get(&row, "name")?,
            })
        })
        .transpose()
    }

    async fn find_question(&self, id: Uuid) -> PgResult<Option<QuestionEntity>> {
        let pool = self.pool().await;
        let row = sqlx::query(
            r"SELECT id, event_id, difficulty, solution, time_limit_seconds, tip_1, tip_2, tip_3
              FROM questions
              WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(|source| PgDaoError::Query {
            operation: "find question",
            source,
        })?;

        row.map(|row| question_from_row(&row)).transpose()
    }

    async fn event_standings(&self, event_id: Uuid) -> PgResult<Vec<TeamStandingEntity>> {
        let pool = self.pool().await;
        let rows = sqlx::query(
            r"SELECT t.id AS team_id, t.name,
                     COALESCE(SUM(p.points_awarded), 0) AS total_points,
                     COUNT(*) FILTER (WHERE p.correct) AS questions_solved,
                     COUNT(*) FILTER (WHERE p.completed) AS questions_completed,
                     MAX(p.time_answered) AS last_answer_time
              FROM teams t
              LEFT JOIN team_progress p ON p.team_id = t.id
              WHERE t.event_id = $1
              GROUP BY t.id, t.name",
        )
        .bind(event_id)
        .fetch_all(&pool)
        .await
        .map_err(|source| PgDaoError::Query {
            operation: "event standings",
            source,
        })?;

        rows.iter()
            .map(|row| {
                Ok(TeamStandingEntity {
                    team_id: try_get(row, "team_id")?,
                    name: try_get(row, "name")?,
                    total_points: try_get(row, "total_points")?,
                    questions_solved: try_get(row, "questions_solved")?,
                    questions_completed: try_get(row, "questions_completed")?,
                    last_answer_time: try_get(row, "last_answer_time")?,
                })
            })
            .collect()
    }
}

/// Build the pool from the configuration.
async fn build_pool(config: &PgConfig) -> PgResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .map_err(|source| PgDaoError::Connect { source })
}

/// Apply the schema statements in dependency order.
async fn ensure_schema(pool: &PgPool) -> PgResult<()> {
    for statement in schema::ALL_TABLES {
        sqlx::raw_sql(statement)
            .execute(pool)
            .await
            .map_err(|source| PgDaoError::EnsureSchema { source })?;
    }
    Ok(())
}

fn try_get<'r, T>(row: &'r PgRow, column: &'static str) -> PgResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|source| PgDaoError::Query {
        operation: "decode column",
        source,
    })
}

fn progress_from_row(row: &PgRow) -> PgResult<ProgressEntity> {
    let used_tip: i16 = try_get(row, "used_tip")?;
    let used_tip = u8::try_from(used_tip).map_err(|_| PgDaoError::Decode {
        column: "used_tip",
        value: used_tip.to_string(),
    })?;

    Ok(ProgressEntity {
        team_id: try_get(row, "team_id")?,
        question_id: try_get(row, "question_id")?,
        attempt_1: try_get(row, "attempt_1")?,
        attempt_2: try_get(row, "attempt_2")?,
        attempt_3: try_get(row, "attempt_3")?,
        used_tip,
        correct: try_get(row, "correct")?,
        completed: try_get(row, "completed")?,
        time_started: try_get(row, "time_started")?,
        time_answered: try_get(row, "time_answered")?,
        points_awarded: try_get(row, "points_awarded")?,
        revision: try_get(row, "revision")?,
    })
}

fn question_from_row(row: &PgRow) -> PgResult<QuestionEntity> {
    let difficulty: String = try_get(row, "difficulty")?;
    let difficulty = Difficulty::parse(&difficulty).ok_or_else(|| PgDaoError::Decode {
        column: "difficulty",
        value: difficulty.clone(),
    })?;

    Ok(QuestionEntity {
        id: try_get(row, "id")?,
        event_id: try_get(row, "event_id")?,
        difficulty,
        solution: try_get(row, "solution")?,
        time_limit_seconds: try_get(row, "time_limit_seconds")?,
        tip_1: try_get(row, "tip_1")?,
        tip_2: try_get(row, "tip_2")?,
        tip_3: try_get(row, "tip_3")?,
    })
}

impl ProgressStore for PgProgressStore {
    fn insert_progress(
        &self,
        row: ProgressEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.insert_progress(row).await.map_err(Into::into) })
    }

    fn find_progress(
        &self,
        team_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_progress(team_id, question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn update_progress(
        &self,
        row: ProgressEntity,
    ) -> BoxFuture<'static, StorageResult<UpdateOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.update_progress(row).await.map_err(Into::into) })
    }

    fn find_event(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_event(id).await.map_err(Into::into) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(id).await.map_err(Into::into) })
    }

    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_question(id).await.map_err(Into::into) })
    }

    fn event_standings(
        &self,
        event_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamStandingEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.event_standings(event_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reconnect().await.map_err(Into::into) })
    }
}
