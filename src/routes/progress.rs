use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::progress::{
        AnswerRequest, AnswerResponse, CompleteRequest, CompleteResponse, StartRequest,
        StartResponse, TipRequest, TipResponse,
    },
    error::AppError,
    services::progress_service,
    state::SharedState,
};

/// Routes handling the question-progress lifecycle operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/progress/start", post(start))
        .route("/progress/tip", post(tip))
        .route("/progress/answer", post(answer))
        .route("/progress/complete", post(complete))
}

/// Start the clock for a team on a question.
#[utoipa::path(
    post,
    path = "/progress/start",
    tag = "progress",
    request_body = StartRequest,
    responses(
        (status = 200, description = "Clock started or already running", body = StartResponse)
    )
)]
pub async fn start(
    State(state): State<SharedState>,
    Json(payload): Json<StartRequest>,
) -> Result<Json<StartResponse>, AppError> {
    let response = progress_service::start(&state, payload).await?;
    Ok(Json(response))
}

/// Reveal a tip, trading points for help.
#[utoipa::path(
    post,
    path = "/progress/tip",
    tag = "progress",
    request_body = TipRequest,
    responses(
        (status = 200, description = "Tip text for the requested level", body = TipResponse)
    )
)]
pub async fn tip(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<TipRequest>>,
) -> Result<Json<TipResponse>, AppError> {
    let response = progress_service::tip(&state, payload).await?;
    Ok(Json(response))
}

/// Submit an answer for a question.
#[utoipa::path(
    post,
    path = "/progress/answer",
    tag = "progress",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer verdict", body = AnswerResponse)
    )
)]
pub async fn answer(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Result<Json<AnswerResponse>, AppError> {
    let response = progress_service::answer(&state, payload).await?;
    Ok(Json(response))
}

/// Close a question without a matching answer.
#[utoipa::path(
    post,
    path = "/progress/complete",
    tag = "progress",
    request_body = CompleteRequest,
    responses(
        (status = 200, description = "Completion acknowledged", body = CompleteResponse)
    )
)]
pub async fn complete(
    State(state): State<SharedState>,
    Json(payload): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, AppError> {
    let response = progress_service::complete(&state, payload).await?;
    Ok(Json(response))
}
