//! Lifecycle controller for the per-team-per-question progress rows.
//!
//! Rows are created lazily on the first touch, races on creation resolve
//! through the store's uniqueness contract (insert, and on conflict re-read),
//! and every mutation is a revision-guarded read-modify-write that re-reads
//! and replays when a concurrent writer got there first.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            EventEntity, InsertOutcome, ProgressEntity, QuestionEntity, TeamEntity, UpdateOutcome,
        },
        progress_store::ProgressStore,
    },
    dto::progress::{
        AnswerRequest, AnswerResponse, CompleteRequest, CompleteResponse, StartRequest,
        StartResponse, TipRequest, TipResponse,
    },
    error::ServiceError,
    services::scoreboard_push,
    state::{
        SharedState,
        progress::{self, AnswerRecord, CompletionReason},
    },
};

/// How many times a revision-guarded write is replayed before giving up.
/// Interleavings from a single team are rare and short; this bound only
/// exists so a pathological client cannot loop the server.
const REVISION_RETRY_LIMIT: u32 = 4;

/// The question being acted on plus the records gating the operation.
struct OperationContext {
    question: QuestionEntity,
    event: EventEntity,
    team: TeamEntity,
}

/// Start the clock for a (team, question) pair; idempotent.
///
/// The insert is retried once on a storage failure: start is the one
/// operation whose idempotent contract makes a blind retry safe.
pub async fn start(
    state: &SharedState,
    request: StartRequest,
) -> Result<StartResponse, ServiceError> {
    let store = state.require_progress_store().await?;
    let context = load_context(&store, request.team_id, request.question_id).await?;
    ensure_event_started(&context.event)?;

    let fresh = ProgressEntity::new(
        context.team.id,
        context.question.id,
        OffsetDateTime::now_utc(),
    );

    let outcome = match store.insert_progress(fresh.clone()).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(
                team_id = %fresh.team_id,
                question_id = %fresh.question_id,
                error = %err,
                "start insert failed; retrying once"
            );
            store.insert_progress(fresh.clone()).await?
        }
    };

    match outcome {
        InsertOutcome::Inserted => Ok(StartResponse::new(fresh.time_started, false)),
        InsertOutcome::Conflict => {
            let existing = reread_after_conflict(&store, fresh.team_id, fresh.question_id).await?;
            Ok(StartResponse::new(existing.time_started, true))
        }
    }
}

/// Reveal a tip for the pair, creating the row lazily when absent.
pub async fn tip(state: &SharedState, request: TipRequest) -> Result<TipResponse, ServiceError> {
    let store = state.require_progress_store().await?;
    let context = load_context(&store, request.team_id, request.question_id).await?;

    for _ in 0..REVISION_RETRY_LIMIT {
        let mut row = ensure_row(&store, request.team_id, request.question_id).await?;
        let now = OffsetDateTime::now_utc();

        if enforce_deadline(&store, &mut row, &context.question, now).await? {
            continue;
        }

        let record = progress::record_tip(&mut row, request.tip_number)?;
        let tip_text = context
            .question
            .tip_text(record.tip_number)
            .ok_or(ServiceError::InvalidTipNumber {
                requested: record.tip_number,
                revealed: row.used_tip,
            })?
            .to_owned();

        if !record.revealed {
            // Repeat of an already revealed level: nothing to persist.
            return Ok(TipResponse {
                tip_number: record.tip_number,
                tip_text,
                completed: false,
            });
        }

        match store.update_progress(row).await? {
            UpdateOutcome::Applied => {
                return Ok(TipResponse {
                    tip_number: record.tip_number,
                    tip_text,
                    completed: record.completed,
                });
            }
            UpdateOutcome::Stale => continue,
        }
    }

    Err(retries_exhausted(request.team_id, request.question_id))
}

/// Record an answer submission, creating the row lazily when absent.
///
/// A matching answer freezes the score and triggers a scoreboard push for
/// the question's event.
pub async fn answer(
    state: &SharedState,
    request: AnswerRequest,
) -> Result<AnswerResponse, ServiceError> {
    let store = state.require_progress_store().await?;
    let context = load_context(&store, request.team_id, request.question_id).await?;
    ensure_event_started(&context.event)?;

    for _ in 0..REVISION_RETRY_LIMIT {
        let mut row = ensure_row(&store, request.team_id, request.question_id).await?;
        let now = OffsetDateTime::now_utc();

        if enforce_deadline(&store, &mut row, &context.question, now).await? {
            continue;
        }

        let record = progress::record_answer(&mut row, &context.question, &request.text, now)?;

        match store.update_progress(row).await? {
            UpdateOutcome::Applied => {
                return Ok(match record {
                    AnswerRecord::Correct { points } => {
                        scoreboard_push::push_after_solve(state, context.question.event_id).await;
                        AnswerResponse::correct(points)
                    }
                    AnswerRecord::Incorrect { attempts_remaining } => {
                        AnswerResponse::incorrect(attempts_remaining)
                    }
                });
            }
            UpdateOutcome::Stale => continue,
        }
    }

    Err(retries_exhausted(request.team_id, request.question_id))
}

/// Close the pair without a matching answer; idempotent.
pub async fn complete(
    state: &SharedState,
    request: CompleteRequest,
) -> Result<CompleteResponse, ServiceError> {
    let store = state.require_progress_store().await?;
    load_context(&store, request.team_id, request.question_id).await?;
    let reason: CompletionReason = request.reason.into();

    for _ in 0..REVISION_RETRY_LIMIT {
        let Some(mut row) = store
            .find_progress(request.team_id, request.question_id)
            .await?
        else {
            return Err(ServiceError::NotFound(format!(
                "no progress for team `{}` on question `{}`",
                request.team_id, request.question_id
            )));
        };

        if !progress::record_completion(&mut row, reason) {
            // Already terminal: acknowledge without touching the row.
            return Ok(CompleteResponse { completed: true });
        }

        match store.update_progress(row).await? {
            UpdateOutcome::Applied => return Ok(CompleteResponse { completed: true }),
            UpdateOutcome::Stale => continue,
        }
    }

    Err(retries_exhausted(request.team_id, request.question_id))
}

/// Load the question, its event, and the acting team, verifying they belong
/// together.
async fn load_context(
    store: &Arc<dyn ProgressStore>,
    team_id: Uuid,
    question_id: Uuid,
) -> Result<OperationContext, ServiceError> {
    let question = store
        .find_question(question_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("question `{question_id}` not found")))?;

    let team = store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))?;

    if team.event_id != question.event_id {
        return Err(ServiceError::NotFound(format!(
            "question `{question_id}` does not belong to team `{team_id}`'s event"
        )));
    }

    let event = store.find_event(question.event_id).await?.ok_or_else(|| {
        ServiceError::NotFound(format!("event `{}` not found", question.event_id))
    })?;

    Ok(OperationContext {
        question,
        event,
        team,
    })
}

fn ensure_event_started(event: &EventEntity) -> Result<(), ServiceError> {
    if event.started {
        Ok(())
    } else {
        Err(ServiceError::EventNotStarted(event.name.clone()))
    }
}

/// Fetch the pair's row, creating it on first touch.
async fn ensure_row(
    store: &Arc<dyn ProgressStore>,
    team_id: Uuid,
    question_id: Uuid,
) -> Result<ProgressEntity, ServiceError> {
    if let Some(row) = store.find_progress(team_id, question_id).await? {
        return Ok(row);
    }

    let fresh = ProgressEntity::new(team_id, question_id, OffsetDateTime::now_utc());
    match store.insert_progress(fresh.clone()).await? {
        InsertOutcome::Inserted => Ok(fresh),
        InsertOutcome::Conflict => reread_after_conflict(store, team_id, question_id).await,
    }
}

/// Re-read the row after losing an insert race; the winner's row must exist.
async fn reread_after_conflict(
    store: &Arc<dyn ProgressStore>,
    team_id: Uuid,
    question_id: Uuid,
) -> Result<ProgressEntity, ServiceError> {
    store
        .find_progress(team_id, question_id)
        .await?
        .ok_or_else(|| {
            ServiceError::Conflict(format!(
                "progress row for team `{team_id}` on question `{question_id}` \
                 vanished between insert and re-read"
            ))
        })
}

/// Auto-complete an overdue row before acting on it.
///
/// Returns true when the row changed underneath us and the caller should
/// re-read; returns the `AlreadyCompleted` rejection once the timeout is
/// recorded. Client-reported timeouts remain the normal path; this check
/// only stops a client whose countdown never fires from playing forever.
async fn enforce_deadline(
    store: &Arc<dyn ProgressStore>,
    row: &mut ProgressEntity,
    question: &QuestionEntity,
    now: OffsetDateTime,
) -> Result<bool, ServiceError> {
    if !progress::deadline_passed(row, question, now) {
        return Ok(false);
    }

    progress::record_completion(row, CompletionReason::Timeout);
    match store.update_progress(row.clone()).await? {
        UpdateOutcome::Applied => Err(ServiceError::AlreadyCompleted),
        UpdateOutcome::Stale => Ok(true),
    }
}

fn retries_exhausted(team_id: Uuid, question_id: Uuid) -> ServiceError {
    ServiceError::Conflict(format!(
        "progress for team `{team_id}` on question `{question_id}` \
         kept changing under concurrent updates"
    ))
}
