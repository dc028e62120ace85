use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS decks (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cards (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      deck_id INTEGER NOT NULL,
      position INTEGER NOT NULL,
      front TEXT NOT NULL,
      back TEXT NOT NULL,
      FOREIGN KEY (deck_id) REFERENCES decks(id),
      UNIQUE (deck_id, position)
    );

    -- One row per (user, card); never deleted
    CREATE TABLE IF NOT EXISTS card_progress (
      user_id TEXT NOT NULL,
      card_id INTEGER NOT NULL,
      repetitions INTEGER NOT NULL DEFAULT 0,
      interval_days INTEGER NOT NULL DEFAULT 0,
      ease_factor REAL NOT NULL DEFAULT 2.5,
      correct_count INTEGER NOT NULL DEFAULT 0,
      incorrect_count INTEGER NOT NULL DEFAULT 0,
      last_reviewed_at TEXT,
      next_review_at TEXT,
      PRIMARY KEY (user_id, card_id),
      FOREIGN KEY (card_id) REFERENCES cards(id)
    );

    CREATE TABLE IF NOT EXISTS review_logs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id TEXT NOT NULL,
      card_id INTEGER NOT NULL,
      quality INTEGER NOT NULL,
      is_correct INTEGER NOT NULL,
      reviewed_at TEXT NOT NULL,
      FOREIGN KEY (card_id) REFERENCES cards(id)
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id, position);
    CREATE INDEX IF NOT EXISTS idx_progress_next_review ON card_progress(user_id, next_review_at);
    CREATE INDEX IF NOT EXISTS idx_review_logs_card ON review_logs(user_id, card_id);
    "#,
  )?;

  Ok(())
}
