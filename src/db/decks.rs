//! Deck and card storage

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::domain::{Card, Deck, NewCard};

/// Insert a deck and its cards; card positions follow the slice order
pub fn create_deck(conn: &Connection, name: &str, cards: &[NewCard]) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO decks (name, created_at) VALUES (?1, ?2)",
        params![name, Utc::now().to_rfc3339()],
    )?;
    let deck_id = tx.last_insert_rowid();

    {
        let mut stmt = tx.prepare(
            "INSERT INTO cards (deck_id, position, front, back) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (position, card) in cards.iter().enumerate() {
            stmt.execute(params![deck_id, position as i64, card.front, card.back])?;
        }
    }

    tx.commit()?;
    tracing::debug!("Created deck {} with {} cards", deck_id, cards.len());
    Ok(deck_id)
}

pub fn get_deck(conn: &Connection, deck_id: i64) -> Result<Option<Deck>> {
    conn.query_row(
        "SELECT id, name, created_at FROM decks WHERE id = ?1",
        params![deck_id],
        |row| {
            let created_at: String = row.get(2)?;
            Ok(Deck {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: DateTime::parse_from_rfc3339(&created_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        },
    )
    .optional()
}

/// Cards of a deck ordered by position
pub fn get_deck_cards(conn: &Connection, deck_id: i64) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, deck_id, position, front, back
    FROM cards
    WHERE deck_id = ?1
    ORDER BY position ASC
    "#,
    )?;

    let cards = stmt
        .query_map(params![deck_id], row_to_card)?
        .collect::<Result<Vec<_>>>()?;

    Ok(cards)
}

pub fn get_card(conn: &Connection, card_id: i64) -> Result<Option<Card>> {
    conn.query_row(
        "SELECT id, deck_id, position, front, back FROM cards WHERE id = ?1",
        params![card_id],
        row_to_card,
    )
    .optional()
}

pub fn count_deck_cards(conn: &Connection, deck_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM cards WHERE deck_id = ?1",
        params![deck_id],
        |row| row.get(0),
    )
}

fn row_to_card(row: &Row) -> Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        position: row.get(2)?,
        front: row.get(3)?,
        back: row.get(4)?,
    })
}
