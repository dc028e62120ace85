use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Deck {
  pub id: i64,
  pub name: String,
  pub created_at: DateTime<Utc>,
}

/// A card within a deck. `position` is the card's index in study sessions.
#[derive(Debug, Clone, Serialize)]
pub struct Card {
  pub id: i64,
  pub deck_id: i64,
  pub position: i64,
  pub front: String,
  pub back: String,
}

/// Card content supplied when creating a deck
#[derive(Debug, Clone, Deserialize)]
pub struct NewCard {
  pub front: String,
  pub back: String,
}
