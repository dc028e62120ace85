//! Study session endpoints.
//!
//! A session is started once per pass through a deck. Each answer is scheduled,
//! persisted, and then applied to the live queue.

use axum::{
  extract::{Path, State},
  Json,
};
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::db::{self, try_lock, LogOnError};
use crate::domain::format_timestamp;
use crate::session::StudySession;
use crate::srs::{compute_next_review, quality_for, ReviewOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
  pub user_id: String,
  pub deck_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
  pub session_id: String,
  pub card_index: usize,
  pub current_index: usize,
  pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct CardView {
  pub index: usize,
  pub card_id: i64,
  pub front: String,
  pub back: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
  pub session_id: String,
  pub deck_id: i64,
  pub total: usize,
  pub queue: Vec<usize>,
  pub current_index: usize,
  pub current_card: Option<CardView>,
  pub answered_correct: u32,
  pub answered_incorrect: u32,
  pub started_at: String,
  pub finished: bool,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
  pub progress: ReviewOutcome,
  pub session: SessionView,
}

fn session_view(conn: &Connection, session_id: &str, session: &StudySession) -> Result<SessionView, ApiError> {
  let current_card = match session.current_card() {
    Some(index) => {
      let card = session
        .card_id(index)
        .map(|id| db::get_card(conn, id))
        .transpose()?
        .flatten();
      card.map(|card| CardView {
        index,
        card_id: card.id,
        front: card.front,
        back: card.back,
      })
    }
    None => None,
  };

  Ok(SessionView {
    session_id: session_id.to_string(),
    deck_id: session.deck_id,
    total: session.total(),
    queue: session.queue.clone(),
    current_index: session.current_index,
    current_card,
    answered_correct: session.answered_correct,
    answered_incorrect: session.answered_incorrect,
    started_at: format_timestamp(session.started_at),
    finished: session.is_finished(),
  })
}

/// POST /api/study/start
pub async fn start_session(
  State(state): State<AppState>,
  Json(request): Json<StartSessionRequest>,
) -> Result<Json<SessionView>, ApiError> {
  if request.user_id.trim().is_empty() {
    return Err(ApiError::BadRequest("user_id must not be empty".into()));
  }

  let conn = try_lock(&state.db)?;
  if db::get_deck(&conn, request.deck_id)?.is_none() {
    return Err(ApiError::NotFound(format!("Deck {} not found", request.deck_id)));
  }

  let card_ids: Vec<i64> = db::get_deck_cards(&conn, request.deck_id)?
    .into_iter()
    .map(|c| c.id)
    .collect();
  if card_ids.is_empty() {
    return Err(ApiError::BadRequest("Deck has no cards".into()));
  }

  let progress = db::get_progress_map(&conn, &request.user_id, request.deck_id)?;
  let session = StudySession::new(request.user_id, request.deck_id, card_ids, &progress, Utc::now());
  let view_session = session.clone();
  let session_id = state.sessions.create(session);

  tracing::info!(
    "Started session {} for {} on deck {} ({} cards)",
    session_id,
    view_session.user_id,
    view_session.deck_id,
    view_session.total()
  );

  Ok(Json(session_view(&conn, &session_id, &view_session)?))
}

/// POST /api/study/answer
///
/// The database lock is taken before the session entry, the same order as
/// `start_session`, and both stay held until the answer is applied.
pub async fn submit_answer(
  State(state): State<AppState>,
  Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
  let conn = try_lock(&state.db)?;
  let now = Utc::now();

  let (outcome, session) = state
    .sessions
    .with_session_mut(&request.session_id, |session| {
      session.validate_answer(request.current_index, request.card_index)?;
      let card_id = session
        .card_id(request.card_index)
        .ok_or_else(|| ApiError::BadRequest("Unknown card".into()))?;

      let prior = db::get_progress(&conn, &session.user_id, card_id)?;
      let outcome = compute_next_review(prior.as_ref(), request.is_correct, now);
      db::upsert_progress(&conn, &session.user_id, card_id, &outcome.state)?;
      db::insert_review_log(
        &conn,
        &session.user_id,
        card_id,
        quality_for(request.is_correct),
        request.is_correct,
        now,
      )
      .log_warn("Failed to write review log");

      session.answer(request.current_index, request.card_index, request.is_correct)?;

      tracing::debug!(
        "Session {}: card {} answered {}, next review in {} days, {} left",
        request.session_id,
        card_id,
        if request.is_correct { "correctly" } else { "incorrectly" },
        outcome.state.interval_days,
        session.queue.len()
      );
      Ok::<_, ApiError>((outcome, session.clone()))
    })
    .ok_or_else(|| ApiError::NotFound("Session not found or expired".into()))??;

  if session.is_finished() {
    tracing::info!(
      "Session {} finished: {} correct, {} incorrect",
      request.session_id,
      session.answered_correct,
      session.answered_incorrect
    );
  }

  let view = session_view(&conn, &request.session_id, &session)?;
  Ok(Json(AnswerResponse {
    progress: outcome,
    session: view,
  }))
}

/// GET /api/study/{session_id}
pub async fn get_session(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
  let session = state
    .sessions
    .get(&session_id)
    .ok_or_else(|| ApiError::NotFound("Session not found or expired".into()))?;
  let conn = try_lock(&state.db)?;
  Ok(Json(session_view(&conn, &session_id, &session)?))
}
