//! Per-user review state and review logging

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::collections::HashMap;

use crate::domain::{format_timestamp, ProgressRecord, ReviewState};
use crate::srs::is_due;

fn row_to_record(row: &Row, offset: usize) -> Result<ProgressRecord> {
    Ok(ProgressRecord {
        repetitions: row.get(offset)?,
        interval_days: row.get(offset + 1)?,
        ease_factor: row.get(offset + 2)?,
        correct_count: row.get(offset + 3)?,
        incorrect_count: row.get(offset + 4)?,
        last_reviewed_at: row.get(offset + 5)?,
        next_review_at: row.get(offset + 6)?,
    })
}

pub fn get_progress(conn: &Connection, user_id: &str, card_id: i64) -> Result<Option<ProgressRecord>> {
    conn.query_row(
        r#"
    SELECT repetitions, interval_days, ease_factor, correct_count, incorrect_count,
           last_reviewed_at, next_review_at
    FROM card_progress
    WHERE user_id = ?1 AND card_id = ?2
    "#,
        params![user_id, card_id],
        |row| row_to_record(row, 0),
    )
    .optional()
}

/// Review state for each reviewed card of a deck, keyed by card position.
/// Cards the user has never reviewed are absent from the map.
pub fn get_progress_map(
    conn: &Connection,
    user_id: &str,
    deck_id: i64,
) -> Result<HashMap<usize, ProgressRecord>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT c.position, p.repetitions, p.interval_days, p.ease_factor, p.correct_count,
           p.incorrect_count, p.last_reviewed_at, p.next_review_at
    FROM cards c
    JOIN card_progress p ON p.card_id = c.id AND p.user_id = ?1
    WHERE c.deck_id = ?2
    "#,
    )?;

    let entries = stmt
        .query_map(params![user_id, deck_id], |row| {
            let position: i64 = row.get(0)?;
            Ok((position as usize, row_to_record(row, 1)?))
        })?
        .collect::<Result<HashMap<_, _>>>()?;

    Ok(entries)
}

pub fn upsert_progress(conn: &Connection, user_id: &str, card_id: i64, state: &ReviewState) -> Result<()> {
    conn.execute(
        r#"
    INSERT INTO card_progress (user_id, card_id, repetitions, interval_days, ease_factor,
                               correct_count, incorrect_count, last_reviewed_at, next_review_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(user_id, card_id) DO UPDATE SET
      repetitions = excluded.repetitions,
      interval_days = excluded.interval_days,
      ease_factor = excluded.ease_factor,
      correct_count = excluded.correct_count,
      incorrect_count = excluded.incorrect_count,
      last_reviewed_at = excluded.last_reviewed_at,
      next_review_at = excluded.next_review_at
    "#,
        params![
            user_id,
            card_id,
            state.repetitions,
            state.interval_days,
            state.ease_factor,
            state.correct_count,
            state.incorrect_count,
            state.last_reviewed_at,
            state.next_review_at,
        ],
    )?;
    Ok(())
}

pub fn insert_review_log(
    conn: &Connection,
    user_id: &str,
    card_id: i64,
    quality: u8,
    is_correct: bool,
    reviewed_at: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO review_logs (user_id, card_id, quality, is_correct, reviewed_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
        params![
            user_id,
            card_id,
            quality,
            if is_correct { 1 } else { 0 },
            format_timestamp(reviewed_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Number of cards in the deck that are due for this user at `now`
pub fn count_due(conn: &Connection, user_id: &str, deck_id: i64, now: DateTime<Utc>) -> Result<i64> {
    let total = super::count_deck_cards(conn, deck_id)?.max(0) as usize;
    let progress = get_progress_map(conn, user_id, deck_id)?;
    let due = (0..total)
        .filter(|idx| is_due(progress.get(idx), now))
        .count();
    Ok(due as i64)
}
