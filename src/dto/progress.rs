//! DTO definitions for the question-progress lifecycle operations.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::{format_offset_time, validation::validate_answer_text};
use crate::state::progress::CompletionReason;

/// Identify the (team, question) pair a question is being started for.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartRequest {
    /// Team acting on the question.
    pub team_id: Uuid,
    /// Question being started.
    pub question_id: Uuid,
}

/// Result of a start call; idempotent across duplicates and races.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartResponse {
    /// When the pair's clock started, RFC 3339.
    pub time_started: String,
    /// True when the pair had already been started earlier.
    pub existing: bool,
}

impl StartResponse {
    /// Build the response from the stored timestamp.
    pub fn new(time_started: OffsetDateTime, existing: bool) -> Self {
        Self {
            time_started: format_offset_time(time_started),
            existing,
        }
    }
}

/// Request one of the three progressively revealing tips.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TipRequest {
    /// Team acting on the question.
    pub team_id: Uuid,
    /// Question the tip belongs to.
    pub question_id: Uuid,
    /// Tip level; 3 reveals the solution and forfeits all points.
    #[validate(range(min = 1, max = 3, message = "tip number must be between 1 and 3"))]
    pub tip_number: u8,
}

/// Tip text for the requested level.
#[derive(Debug, Serialize, ToSchema)]
pub struct TipResponse {
    /// Level the text belongs to.
    pub tip_number: u8,
    /// The hint itself.
    pub tip_text: String,
    /// True when this call revealed the solution and closed the question.
    pub completed: bool,
}

/// Submit an answer for a question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerRequest {
    /// Team acting on the question.
    pub team_id: Uuid,
    /// Question being answered.
    pub question_id: Uuid,
    /// Submitted answer; compared trimmed and case-insensitive.
    pub text: String,
}

impl Validate for AnswerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_answer_text(&self.text) {
            errors.add("text", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Verdict for an answer submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    /// Whether the submission matched the solution.
    pub correct: bool,
    /// Points awarded, present only on a correct answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i32>,
    /// Attempts left, present only on an incorrect answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u8>,
}

impl AnswerResponse {
    /// Response for a matching answer.
    pub fn correct(points: i32) -> Self {
        Self {
            correct: true,
            points: Some(points),
            attempts_remaining: None,
        }
    }

    /// Response for a mismatch, with the slots still open.
    pub fn incorrect(attempts_remaining: u8) -> Self {
        Self {
            correct: false,
            points: None,
            attempts_remaining: Some(attempts_remaining),
        }
    }
}

/// Why the caller is closing the question without a matching answer.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReasonDto {
    /// The client-side countdown reached zero.
    Timeout,
    /// All attempts were spent.
    MaxAttempts,
    /// The solution was shown to the team.
    Solution,
}

impl From<CompletionReasonDto> for CompletionReason {
    fn from(value: CompletionReasonDto) -> Self {
        match value {
            CompletionReasonDto::Timeout => CompletionReason::Timeout,
            CompletionReasonDto::MaxAttempts => CompletionReason::MaxAttempts,
            CompletionReasonDto::Solution => CompletionReason::Solution,
        }
    }
}

/// Close a question without a matching answer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteRequest {
    /// Team acting on the question.
    pub team_id: Uuid,
    /// Question being closed.
    pub question_id: Uuid,
    /// Reason for the transition.
    pub reason: CompletionReasonDto,
}

/// Acknowledgement of a completion; repeated calls acknowledge again.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteResponse {
    /// Always true after the call returns.
    pub completed: bool,
}
