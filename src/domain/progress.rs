use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Ease factor assigned to a card that has never been reviewed
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Floor for the ease factor; keeps intervals from shrinking without bound
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Review state for one (user, card) pair, as it may arrive from storage or JSON.
///
/// Every field is optional; [`normalize_progress_state`] fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
  pub repetitions: Option<i64>,
  pub interval_days: Option<i64>,
  pub ease_factor: Option<f64>,
  pub correct_count: Option<i64>,
  pub incorrect_count: Option<i64>,
  pub last_reviewed_at: Option<String>,
  pub next_review_at: Option<String>,
}

/// Fully populated review state for one (user, card) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
  pub repetitions: i64,
  pub interval_days: i64,
  pub ease_factor: f64,
  pub correct_count: i64,
  pub incorrect_count: i64,
  pub last_reviewed_at: Option<String>,
  pub next_review_at: Option<String>,
}

impl Default for ReviewState {
  fn default() -> Self {
    Self {
      repetitions: 0,
      interval_days: 0,
      ease_factor: DEFAULT_EASE_FACTOR,
      correct_count: 0,
      incorrect_count: 0,
      last_reviewed_at: None,
      next_review_at: None,
    }
  }
}

impl From<ReviewState> for ProgressRecord {
  fn from(state: ReviewState) -> Self {
    Self {
      repetitions: Some(state.repetitions),
      interval_days: Some(state.interval_days),
      ease_factor: Some(state.ease_factor),
      correct_count: Some(state.correct_count),
      incorrect_count: Some(state.incorrect_count),
      last_reviewed_at: state.last_reviewed_at,
      next_review_at: state.next_review_at,
    }
  }
}

/// Fill absent fields with defaults and clamp out-of-range values.
///
/// Never rejects input: negative counters become 0, a non-finite ease factor
/// becomes the default and anything under the floor is raised to it.
pub fn normalize_progress_state(record: Option<&ProgressRecord>) -> ReviewState {
  let Some(record) = record else {
    return ReviewState::default();
  };

  let ease_factor = match record.ease_factor {
    Some(ef) if ef.is_finite() => ef.max(MIN_EASE_FACTOR),
    _ => DEFAULT_EASE_FACTOR,
  };

  ReviewState {
    repetitions: record.repetitions.unwrap_or(0).max(0),
    interval_days: record.interval_days.unwrap_or(0).max(0),
    ease_factor,
    correct_count: record.correct_count.unwrap_or(0).max(0),
    incorrect_count: record.incorrect_count.unwrap_or(0).max(0),
    last_reviewed_at: record.last_reviewed_at.clone(),
    next_review_at: record.next_review_at.clone(),
  }
}

/// Parse an RFC 3339 / ISO-8601 timestamp into UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}

/// Format as ISO-8601 UTC with millisecond precision, e.g. `2024-03-01T09:30:00.000Z`
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_normalize_absent_gives_defaults() {
    let state = normalize_progress_state(None);
    assert_eq!(state, ReviewState::default());
    assert_eq!(state.ease_factor, DEFAULT_EASE_FACTOR);
    assert!(state.next_review_at.is_none());
  }

  #[test]
  fn test_normalize_partial_record() {
    let record = ProgressRecord {
      repetitions: Some(3),
      interval_days: Some(15),
      ..Default::default()
    };
    let state = normalize_progress_state(Some(&record));
    assert_eq!(state.repetitions, 3);
    assert_eq!(state.interval_days, 15);
    assert_eq!(state.ease_factor, DEFAULT_EASE_FACTOR);
    assert_eq!(state.correct_count, 0);
  }

  #[test]
  fn test_normalize_clamps_out_of_range() {
    let record = ProgressRecord {
      repetitions: Some(-2),
      ease_factor: Some(0.4),
      incorrect_count: Some(-1),
      ..Default::default()
    };
    let state = normalize_progress_state(Some(&record));
    assert_eq!(state.repetitions, 0);
    assert_eq!(state.incorrect_count, 0);
    assert_eq!(state.ease_factor, MIN_EASE_FACTOR);

    let nan = ProgressRecord {
      ease_factor: Some(f64::NAN),
      ..Default::default()
    };
    assert_eq!(normalize_progress_state(Some(&nan)).ease_factor, DEFAULT_EASE_FACTOR);
  }

  #[test]
  fn test_record_deserializes_camel_case() {
    let record: ProgressRecord =
      serde_json::from_str(r#"{"intervalDays":6,"nextReviewAt":"2024-01-07T00:00:00.000Z"}"#)
        .unwrap();
    assert_eq!(record.interval_days, Some(6));
    assert_eq!(record.repetitions, None);
    assert_eq!(record.next_review_at.as_deref(), Some("2024-01-07T00:00:00.000Z"));
  }

  #[test]
  fn test_timestamp_format_roundtrip() {
    let t = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    let s = format_timestamp(t);
    assert_eq!(s, "2024-03-01T09:30:00.000Z");
    assert_eq!(parse_timestamp(&s), Some(t));
    assert_eq!(parse_timestamp("not a date"), None);
  }
}
