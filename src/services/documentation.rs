use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Puzzle Rally Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::progress::start,
        crate::routes::progress::tip,
        crate::routes::progress::answer,
        crate::routes::progress::complete,
        crate::routes::scoreboard::get_scoreboard,
        crate::routes::scoreboard::scoreboard_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::progress::StartRequest,
            crate::dto::progress::StartResponse,
            crate::dto::progress::TipRequest,
            crate::dto::progress::TipResponse,
            crate::dto::progress::AnswerRequest,
            crate::dto::progress::AnswerResponse,
            crate::dto::progress::CompleteRequest,
            crate::dto::progress::CompleteResponse,
            crate::dto::progress::CompletionReasonDto,
            crate::dto::scoreboard::ScoreboardResponse,
            crate::dto::scoreboard::TeamStanding,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "progress", description = "Question progress lifecycle operations"),
        (name = "scoreboard", description = "Ranked scoreboard pull and SSE streams"),
    )
)]
pub struct ApiDoc;
