//! Initial presentation order for a study session.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::scheduler::is_due;
use crate::domain::{parse_timestamp, ProgressRecord};

/// Sort key for `next_review_at`: epoch millis, with absent or malformed values at 0
fn review_sort_key(record: Option<&ProgressRecord>) -> i64 {
  record
    .and_then(|r| r.next_review_at.as_deref())
    .and_then(parse_timestamp)
    .map(|dt| dt.timestamp_millis())
    .unwrap_or(0)
}

/// Order card indices `0..total` for a new session.
///
/// Due cards come first, then the rest; within each group cards are ordered by
/// ascending `next_review_at`. The sort is stable, so ties keep index order.
pub fn build_initial_queue(
  total: usize,
  progress_map: &HashMap<usize, ProgressRecord>,
  now: DateTime<Utc>,
) -> Vec<usize> {
  let mut keyed: Vec<(bool, i64, usize)> = (0..total)
    .map(|idx| {
      let record = progress_map.get(&idx);
      (!is_due(record, now), review_sort_key(record), idx)
    })
    .collect();

  // false (due) sorts before true (not due)
  keyed.sort_by_key(|&(not_due, at, _)| (not_due, at));
  keyed.into_iter().map(|(_, _, idx)| idx).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::format_timestamp;
  use chrono::{Duration, TimeZone};

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
  }

  fn scheduled(at: DateTime<Utc>) -> ProgressRecord {
    ProgressRecord {
      next_review_at: Some(format_timestamp(at)),
      ..Default::default()
    }
  }

  #[test]
  fn test_no_progress_keeps_index_order() {
    let queue = build_initial_queue(5, &HashMap::new(), now());
    assert_eq!(queue, vec![0, 1, 2, 3, 4]);
  }

  #[test]
  fn test_empty_deck() {
    assert!(build_initial_queue(0, &HashMap::new(), now()).is_empty());
  }

  #[test]
  fn test_due_before_not_due() {
    let mut map = HashMap::new();
    map.insert(0, scheduled(now() + Duration::days(3)));
    map.insert(1, scheduled(now() - Duration::hours(1)));
    map.insert(2, scheduled(now() + Duration::days(1)));
    // 3 has no progress: due, sorts as epoch

    let queue = build_initial_queue(4, &map, now());
    assert_eq!(queue, vec![3, 1, 2, 0]);
  }

  #[test]
  fn test_due_cards_ordered_by_oldest_review() {
    let mut map = HashMap::new();
    map.insert(0, scheduled(now() - Duration::hours(1)));
    map.insert(1, scheduled(now() - Duration::days(5)));
    map.insert(2, scheduled(now() - Duration::days(2)));

    let queue = build_initial_queue(3, &map, now());
    assert_eq!(queue, vec![1, 2, 0]);
  }

  #[test]
  fn test_unparsable_timestamp_is_due_and_first() {
    let mut map = HashMap::new();
    map.insert(0, scheduled(now() - Duration::days(1)));
    map.insert(
      1,
      ProgressRecord {
        next_review_at: Some("garbage".into()),
        ..Default::default()
      },
    );

    let queue = build_initial_queue(2, &map, now());
    assert_eq!(queue, vec![1, 0]);
  }

  #[test]
  fn test_is_permutation_and_deterministic() {
    let mut map = HashMap::new();
    for i in 0..20usize {
      let offset = (i as i64 * 7) % 11 - 5;
      map.insert(i, scheduled(now() + Duration::hours(offset)));
    }

    let first = build_initial_queue(25, &map, now());
    let second = build_initial_queue(25, &map, now());
    assert_eq!(first, second);

    let mut sorted = first.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..25).collect::<Vec<_>>());
  }

  #[test]
  fn test_progress_outside_range_ignored() {
    let mut map = HashMap::new();
    map.insert(10, scheduled(now()));
    assert_eq!(build_initial_queue(2, &map, now()), vec![0, 1]);
  }
}
