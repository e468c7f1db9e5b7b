//! Scoring rules applied when a team answers a question correctly.

use crate::dao::models::Difficulty;

/// Half of the base is on the line for answering fast.
const TIME_BONUS_WEIGHT: f64 = 0.5;
/// Each revealed tip costs 20% of the time-adjusted score.
const TIP_PENALTY_STEP: f64 = 0.2;
/// A correct answer never pays less than this, unless the solution was shown.
const MINIMUM_POINTS: i32 = 10;

/// Compute the points for a correct answer.
///
/// The time bonus scales linearly with the share of the time budget left;
/// answering at or past the limit earns the bare base. Rounding happens
/// twice: after the time bonus, and again after the tip penalty. Revealing
/// the solution (tip 3) always yields zero.
pub fn score(
    difficulty: Difficulty,
    time_limit_seconds: i32,
    elapsed_seconds: f64,
    used_tip: u8,
) -> i32 {
    if used_tip >= 3 {
        return 0;
    }

    let base = f64::from(difficulty.base_points());
    let time_bonus = time_bonus_fraction(time_limit_seconds, elapsed_seconds);
    let with_bonus = (base * (1.0 + time_bonus * TIME_BONUS_WEIGHT)).round();

    let penalty = f64::from(used_tip) * TIP_PENALTY_STEP;
    let points = (with_bonus * (1.0 - penalty)).round() as i32;

    points.max(MINIMUM_POINTS)
}

/// Share of the time budget still remaining, in `[0, 1]`.
///
/// A non-positive limit would violate the question schema; it degrades to a
/// zero bonus instead of dividing by zero. Negative elapsed times from clock
/// skew clamp to zero.
fn time_bonus_fraction(time_limit_seconds: i32, elapsed_seconds: f64) -> f64 {
    if time_limit_seconds <= 0 {
        return 0.0;
    }

    let limit = f64::from(time_limit_seconds);
    let elapsed = elapsed_seconds.max(0.0);
    ((limit - elapsed).max(0.0) / limit).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medium_question_with_one_tip_worked_example() {
        // limit 60s, answered at 20s: bonus fraction 40/60, one tip revealed.
        assert_eq!(score(Difficulty::Medium, 60, 20.0, 1), 214);
    }

    #[test]
    fn full_speed_no_tips_pays_out_the_maximum() {
        assert_eq!(score(Difficulty::Easy, 60, 0.0, 0), 150);
        assert_eq!(score(Difficulty::Medium, 60, 0.0, 0), 300);
        assert_eq!(score(Difficulty::Hard, 60, 0.0, 0), 450);
    }

    #[test]
    fn answering_past_the_limit_earns_the_bare_base() {
        assert_eq!(score(Difficulty::Medium, 60, 90.0, 0), 200);
        assert_eq!(score(Difficulty::Hard, 30, 30.0, 0), 300);
    }

    #[test]
    fn tips_scale_the_penalty() {
        assert_eq!(score(Difficulty::Hard, 60, 60.0, 1), 240);
        assert_eq!(score(Difficulty::Hard, 60, 60.0, 2), 180);
    }

    #[test]
    fn solution_reveal_overrides_everything() {
        assert_eq!(score(Difficulty::Hard, 60, 0.0, 3), 0);
        assert_eq!(score(Difficulty::Easy, 60, 59.0, 3), 0);
    }

    #[test]
    fn floor_applies_below_ten_points() {
        // Contrived low scores still pay the floor as long as no solution
        // reveal happened.
        assert!(score(Difficulty::Easy, 60, 60.0, 2) >= 10);
        assert!(score(Difficulty::Easy, 1, 1000.0, 2) >= 10);
    }

    #[test]
    fn zero_time_limit_degrades_to_no_bonus() {
        assert_eq!(score(Difficulty::Medium, 0, 10.0, 0), 200);
    }

    #[test]
    fn negative_elapsed_clamps_to_full_bonus() {
        assert_eq!(score(Difficulty::Medium, 60, -5.0, 0), 300);
    }
}
