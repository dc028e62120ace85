//! Queue adjustment after an answer within a live session.

/// How far ahead a missed card is reinserted
pub const REQUEUE_OFFSET: usize = 2;

/// Return the queue after answering `card_index`, which is expected at `current_index`.
///
/// A correct answer drops the card for the rest of the session. A miss puts it
/// back `REQUEUE_OFFSET` slots later, or at the end if the queue is shorter.
///
/// Only the entry at `current_index` is removed, and only if it holds
/// `card_index`. If it doesn't, nothing is removed and a miss still inserts the
/// card, leaving it in the queue twice.
pub fn requeue_card(
  queue: &[usize],
  current_index: usize,
  card_index: usize,
  is_correct: bool,
) -> Vec<usize> {
  let mut next: Vec<usize> = queue
    .iter()
    .enumerate()
    .filter(|&(pos, &idx)| !(pos == current_index && idx == card_index))
    .map(|(_, &idx)| idx)
    .collect();

  if !is_correct {
    let insert_at = current_index.saturating_add(REQUEUE_OFFSET).min(next.len());
    next.insert(insert_at, card_index);
  }

  next
}
