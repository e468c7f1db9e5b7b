//! Pure lifecycle rules for a single progress row.
//!
//! Everything here mutates an in-memory [`ProgressEntity`] and decides
//! nothing about persistence; the service layer wraps these rules in the
//! insert-or-read and revision-retry machinery.

use thiserror::Error;
use time::OffsetDateTime;

use crate::dao::models::{ProgressEntity, QuestionEntity};
use crate::state::scoring;

/// Highest tip level; revealing it shows the solution and ends the question.
pub const SOLUTION_TIP: u8 = 3;
/// A team gets this many answer attempts per question.
pub const MAX_ATTEMPTS: u8 = 3;

/// Lifecycle state of a (team, question) pair, derived from the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// The row exists and can still be acted on.
    InProgress,
    /// A matching answer was recorded.
    Solved,
    /// The time budget ran out before a matching answer.
    TimedOut,
    /// All three attempts were spent without a match.
    MaxAttemptsReached,
    /// The solution tip was revealed; no points were or will be awarded.
    SolutionRevealed,
}

/// Rejected lifecycle transitions, surfaced to callers as typed failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProgressError {
    /// The row is terminal; tips and answers are no longer accepted.
    #[error("question already completed")]
    AlreadyCompleted,
    /// A matching answer was already recorded for this pair.
    #[error("question already answered")]
    AlreadyAnswered,
    /// All three attempt slots are spent.
    #[error("maximum number of attempts reached")]
    MaxAttemptsReached,
    /// Tip number outside 1..=3 or skipping ahead of the next unrevealed tip.
    #[error("invalid tip number {requested} (revealed so far: {revealed})")]
    InvalidTipNumber {
        /// The level the caller asked for.
        requested: u8,
        /// The highest level revealed before the call.
        revealed: u8,
    },
}

/// Outcome of recording a tip request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipRecord {
    /// Level the caller asked for; its text should be returned either way.
    pub tip_number: u8,
    /// False when the request was a repeat or lower level (no-op).
    pub revealed: bool,
    /// True when this call revealed the solution and closed the row.
    pub completed: bool,
}

/// Outcome of recording an answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerRecord {
    /// The answer matched; points were computed and stored on the row.
    Correct {
        /// Points awarded by the scoring rules.
        points: i32,
    },
    /// The answer did not match.
    Incorrect {
        /// Attempts left; zero means the row just became terminal.
        attempts_remaining: u8,
    },
}

/// Why a caller reports a question as finished without a matching answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The question's time budget elapsed.
    Timeout,
    /// All attempts were spent (normally recorded by `answer` itself).
    MaxAttempts,
    /// The solution was shown to the team.
    Solution,
}

/// Derive the lifecycle phase from the row's flags.
pub fn phase(row: &ProgressEntity) -> ProgressPhase {
    if row.correct {
        ProgressPhase::Solved
    } else if !row.completed {
        ProgressPhase::InProgress
    } else if row.used_tip >= SOLUTION_TIP {
        ProgressPhase::SolutionRevealed
    } else if row.attempts_used() >= MAX_ATTEMPTS {
        ProgressPhase::MaxAttemptsReached
    } else {
        ProgressPhase::TimedOut
    }
}

/// Raise the revealed-tip level, monotonically.
///
/// Repeated or lower requests are no-ops so duplicate deliveries stay safe.
/// Requests may not skip past the next unrevealed level, and level 3 closes
/// the row: the solution is out, nothing is left to play for.
pub fn record_tip(row: &mut ProgressEntity, tip_number: u8) -> Result<TipRecord, ProgressError> {
    if row.completed {
        return Err(ProgressError::AlreadyCompleted);
    }

    if tip_number == 0 || tip_number > SOLUTION_TIP || tip_number > row.used_tip + 1 {
        return Err(ProgressError::InvalidTipNumber {
            requested: tip_number,
            revealed: row.used_tip,
        });
    }

    if tip_number <= row.used_tip {
        return Ok(TipRecord {
            tip_number,
            revealed: false,
            completed: false,
        });
    }

    row.used_tip = tip_number;
    let completed = tip_number == SOLUTION_TIP;
    if completed {
        row.completed = true;
    }

    Ok(TipRecord {
        tip_number,
        revealed: true,
        completed,
    })
}

/// Record an answer submission against the question's solution.
///
/// The submitted text lands in the first empty attempt slot either way.
/// Matching trims surrounding whitespace and ignores case. A match freezes
/// the score computed from the elapsed time and revealed tips; a third
/// mismatch closes the row with zero points.
pub fn record_answer(
    row: &mut ProgressEntity,
    question: &QuestionEntity,
    text: &str,
    now: OffsetDateTime,
) -> Result<AnswerRecord, ProgressError> {
    if row.correct {
        return Err(ProgressError::AlreadyAnswered);
    }
    if row.completed {
        // Distinguish the exhausted-attempts terminal state so the caller
        // can tell the team why the door is closed.
        return Err(if row.attempts_used() >= MAX_ATTEMPTS {
            ProgressError::MaxAttemptsReached
        } else {
            ProgressError::AlreadyCompleted
        });
    }

    let Some(attempts_used) = row.push_attempt(text.to_owned()) else {
        return Err(ProgressError::MaxAttemptsReached);
    };

    if answers_match(text, &question.solution) {
        let elapsed = (now - row.time_started).as_seconds_f64();
        let points = scoring::score(
            question.difficulty,
            question.time_limit_seconds,
            elapsed,
            row.used_tip,
        );

        row.correct = true;
        row.completed = true;
        row.time_answered = Some(now);
        row.points_awarded = points;

        return Ok(AnswerRecord::Correct { points });
    }

    if attempts_used >= MAX_ATTEMPTS {
        row.completed = true;
        return Ok(AnswerRecord::Incorrect {
            attempts_remaining: 0,
        });
    }

    Ok(AnswerRecord::Incorrect {
        attempts_remaining: MAX_ATTEMPTS - attempts_used,
    })
}

/// Move the row to a terminal state without a matching answer.
///
/// Idempotent: returns false when the row was already terminal. Reporting a
/// solution reveal also raises the tip level so the derived phase reads as
/// [`ProgressPhase::SolutionRevealed`].
pub fn record_completion(row: &mut ProgressEntity, reason: CompletionReason) -> bool {
    if row.completed {
        return false;
    }

    if reason == CompletionReason::Solution {
        row.used_tip = SOLUTION_TIP;
    }

    row.completed = true;
    true
}

/// Whether the question's time budget has run out for this row.
pub fn deadline_passed(
    row: &ProgressEntity,
    question: &QuestionEntity,
    now: OffsetDateTime,
) -> bool {
    !row.completed
        && (now - row.time_started).as_seconds_f64() > f64::from(question.time_limit_seconds)
}

/// Trimmed, case-insensitive answer comparison.
fn answers_match(submitted: &str, solution: &str) -> bool {
    submitted.trim().to_lowercase() == solution.trim().to_lowercase()
}
