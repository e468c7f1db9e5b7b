pub mod memory;
#[cfg(feature = "pg-store")]
pub mod postgres;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    EventEntity, InsertOutcome, ProgressEntity, QuestionEntity, TeamEntity, TeamStandingEntity,
    UpdateOutcome,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for progress rows and the
/// read-only event/question/team records owned by the CRUD collaborators.
///
/// Insert and update carry the concurrency contract: `insert_progress`
/// reports a uniqueness conflict instead of failing so callers can re-read
/// the winning row, and `update_progress` only applies when the stored
/// revision matches the one carried by the entity.
pub trait ProgressStore: Send + Sync {
    fn insert_progress(&self, row: ProgressEntity)
    -> BoxFuture<'static, StorageResult<InsertOutcome>>;
    fn find_progress(
        &self,
        team_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>>;
    fn update_progress(&self, row: ProgressEntity)
    -> BoxFuture<'static, StorageResult<UpdateOutcome>>;
    fn find_event(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<EventEntity>>>;
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    fn find_question(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    fn event_standings(
        &self,
        event_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamStandingEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
