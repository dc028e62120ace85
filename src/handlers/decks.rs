//! Deck endpoints.

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::db::{self, try_lock};
use crate::domain::{normalize_progress_state, Card, NewCard, ReviewState};
use crate::srs::is_due;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDeckRequest {
  pub name: String,
  #[serde(default)]
  pub cards: Vec<NewCard>,
}

#[derive(Debug, Serialize)]
pub struct CreateDeckResponse {
  pub id: i64,
  pub name: String,
  pub card_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeckResponse {
  pub id: i64,
  pub name: String,
  pub created_at: String,
  pub cards: Vec<Card>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
  pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct CardProgress {
  pub index: usize,
  pub card_id: i64,
  pub front: String,
  pub due: bool,
  pub state: ReviewState,
}

#[derive(Debug, Serialize)]
pub struct DeckProgressResponse {
  pub deck_id: i64,
  pub user_id: String,
  pub total: usize,
  pub due: i64,
  pub cards: Vec<CardProgress>,
}

/// POST /api/decks
pub async fn create_deck(
  State(state): State<AppState>,
  Json(request): Json<CreateDeckRequest>,
) -> Result<(StatusCode, Json<CreateDeckResponse>), ApiError> {
  let name = request.name.trim();
  if name.is_empty() {
    return Err(ApiError::BadRequest("Deck name must not be empty".into()));
  }
  if request
    .cards
    .iter()
    .any(|c| c.front.trim().is_empty() || c.back.trim().is_empty())
  {
    return Err(ApiError::BadRequest("Cards need both a front and a back".into()));
  }

  let conn = try_lock(&state.db)?;
  let id = db::create_deck(&conn, name, &request.cards)?;
  tracing::info!("Created deck {} ({} cards)", id, request.cards.len());

  Ok((
    StatusCode::CREATED,
    Json(CreateDeckResponse {
      id,
      name: name.to_string(),
      card_count: request.cards.len(),
    }),
  ))
}

/// GET /api/decks/{deck_id}
pub async fn get_deck(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
) -> Result<Json<DeckResponse>, ApiError> {
  let conn = try_lock(&state.db)?;
  let deck = db::get_deck(&conn, deck_id)?
    .ok_or_else(|| ApiError::NotFound(format!("Deck {} not found", deck_id)))?;
  let cards = db::get_deck_cards(&conn, deck_id)?;

  Ok(Json(DeckResponse {
    id: deck.id,
    name: deck.name,
    created_at: deck.created_at.to_rfc3339(),
    cards,
  }))
}

/// GET /api/decks/{deck_id}/progress?user_id=
pub async fn deck_progress(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
  Query(query): Query<ProgressQuery>,
) -> Result<Json<DeckProgressResponse>, ApiError> {
  let conn = try_lock(&state.db)?;
  if db::get_deck(&conn, deck_id)?.is_none() {
    return Err(ApiError::NotFound(format!("Deck {} not found", deck_id)));
  }

  let now = Utc::now();
  let cards = db::get_deck_cards(&conn, deck_id)?;
  let progress = db::get_progress_map(&conn, &query.user_id, deck_id)?;

  let cards: Vec<CardProgress> = cards
    .into_iter()
    .enumerate()
    .map(|(index, card)| {
      let record = progress.get(&index);
      CardProgress {
        index,
        card_id: card.id,
        front: card.front,
        due: is_due(record, now),
        state: normalize_progress_state(record),
      }
    })
    .collect();
  let due = db::count_due(&conn, &query.user_id, deck_id, now)?;

  Ok(Json(DeckProgressResponse {
    deck_id,
    user_id: query.user_id,
    total: cards.len(),
    due,
    cards,
  }))
}

#[cfg(test)]
mod tests {
  use crate::testing::test_server;
  use axum::http::StatusCode;
  use serde_json::{json, Value};

  #[tokio::test]
  async fn test_create_and_fetch_deck() {
    let server = test_server();
    let response = server
      .post("/api/decks")
      .json(&json!({
        "name": "Capitals",
        "cards": [
          { "front": "France", "back": "Paris" },
          { "front": "Japan", "back": "Tokyo" }
        ]
      }))
      .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["card_count"], 2);

    let id = created["id"].as_i64().unwrap();
    let deck: Value = server.get(&format!("/api/decks/{}", id)).await.json();
    assert_eq!(deck["name"], "Capitals");
    assert_eq!(deck["cards"][1]["back"], "Tokyo");
    assert_eq!(deck["cards"][1]["position"], 1);
  }

  #[tokio::test]
  async fn test_create_deck_validation() {
    let server = test_server();
    server
      .post("/api/decks")
      .json(&json!({ "name": "   ", "cards": [] }))
      .await
      .assert_status(StatusCode::BAD_REQUEST);

    let response = server
      .post("/api/decks")
      .json(&json!({ "name": "x", "cards": [{ "front": "a", "back": "" }] }))
      .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("front and a back"));
  }

  #[tokio::test]
  async fn test_unknown_deck_is_404() {
    let server = test_server();
    server.get("/api/decks/999").await.assert_status_not_found();
    server
      .get("/api/decks/999/progress")
      .add_query_param("user_id", "ana")
      .await
      .assert_status_not_found();
  }

  #[tokio::test]
  async fn test_progress_for_new_user_all_due() {
    let server = test_server();
    let created: Value = server
      .post("/api/decks")
      .json(&json!({ "name": "d", "cards": [{ "front": "a", "back": "b" }, { "front": "c", "back": "d" }] }))
      .await
      .json();
    let id = created["id"].as_i64().unwrap();

    let progress: Value = server
      .get(&format!("/api/decks/{}/progress", id))
      .add_query_param("user_id", "ana")
      .await
      .json();
    assert_eq!(progress["total"], 2);
    assert_eq!(progress["due"], 2);
    assert_eq!(progress["cards"][0]["state"]["easeFactor"], 2.5);
  }
}
