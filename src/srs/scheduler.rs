use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{
  format_timestamp, normalize_progress_state, parse_timestamp, ProgressRecord, ReviewState,
  MIN_EASE_FACTOR,
};

/// Quality recorded for a correct answer on the SM-2 0-5 scale
pub const QUALITY_CORRECT: u8 = 4;

/// Quality recorded for an incorrect answer
pub const QUALITY_INCORRECT: u8 = 2;

/// Grade fed to the ease formula for a correct answer; at 5 the formula adds 0.1
const EASE_GRADE_CORRECT: u8 = 5;

/// Interval after the first successful repetition
const FIRST_INTERVAL_DAYS: i64 = 1;

/// Interval after the second successful repetition
const SECOND_INTERVAL_DAYS: i64 = 6;

/// Longest interval ever scheduled, roughly a century
pub const MAX_INTERVAL_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
  #[serde(flatten)]
  pub state: ReviewState,
  pub is_correct: bool,
}

/// Map answer correctness onto the two-point quality scale
pub fn quality_for(is_correct: bool) -> u8 {
  if is_correct {
    QUALITY_CORRECT
  } else {
    QUALITY_INCORRECT
  }
}

/// Grade used for the ease update. Correct answers grow the ease by 0.1,
/// misses use the recorded quality and shrink it by 0.32.
fn ease_grade(is_correct: bool) -> u8 {
  if is_correct {
    EASE_GRADE_CORRECT
  } else {
    QUALITY_INCORRECT
  }
}

/// SM-2 ease update: EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
pub fn next_ease_factor(ease_factor: f64, quality: u8) -> f64 {
  let q = quality as f64;
  let ease_delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
  (ease_factor + ease_delta).max(MIN_EASE_FACTOR)
}

/// Compute the review state that follows one answer.
///
/// Missing or out-of-range fields in `state` are defaulted, so this never fails.
/// Intervals past the second repetition grow by the ease factor the card had
/// before this answer.
pub fn compute_next_review(
  state: Option<&ProgressRecord>,
  is_correct: bool,
  now: DateTime<Utc>,
) -> ReviewOutcome {
  let current = normalize_progress_state(state);

  let (repetitions, interval_days) = if is_correct {
    let repetitions = current.repetitions + 1;
    let interval = match repetitions {
      1 => FIRST_INTERVAL_DAYS,
      2 => SECOND_INTERVAL_DAYS,
      _ => ((current.interval_days as f64) * current.ease_factor)
        .round()
        .clamp(1.0, MAX_INTERVAL_DAYS as f64) as i64,
    };
    (repetitions, interval)
  } else {
    // Lapse: start over
    (0, FIRST_INTERVAL_DAYS)
  };

  let ease_factor = next_ease_factor(current.ease_factor, ease_grade(is_correct));

  let (correct_count, incorrect_count) = if is_correct {
    (current.correct_count + 1, current.incorrect_count)
  } else {
    (current.correct_count, current.incorrect_count + 1)
  };

  let next_review = now
    .checked_add_signed(Duration::days(interval_days))
    .unwrap_or(DateTime::<Utc>::MAX_UTC);

  ReviewOutcome {
    state: ReviewState {
      repetitions,
      interval_days,
      ease_factor,
      correct_count,
      incorrect_count,
      last_reviewed_at: Some(format_timestamp(now)),
      next_review_at: Some(format_timestamp(next_review)),
    },
    is_correct,
  }
}

/// True when the card has never been scheduled or its review time has passed.
/// A malformed `next_review_at` counts as due.
pub fn is_due(state: Option<&ProgressRecord>, now: DateTime<Utc>) -> bool {
  let Some(next) = state.and_then(|s| s.next_review_at.as_deref()) else {
    return true;
  };
  match parse_timestamp(next) {
    Some(at) => at <= now,
    None => true,
  }
}
