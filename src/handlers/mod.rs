//! HTTP surface: JSON endpoints for decks and study sessions.

pub mod decks;
pub mod study;

use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::{get, post},
  Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::db::{self, try_lock, DbLockError};
use crate::session::SessionError;
use crate::state::AppState;

pub use decks::{create_deck, deck_progress, get_deck};
pub use study::{get_session, start_session, submit_answer};

/// Errors surfaced to API clients as `{"error": ...}` bodies
#[derive(Debug)]
pub enum ApiError {
  NotFound(String),
  BadRequest(String),
  Unavailable,
  Database(rusqlite::Error),
}

impl std::fmt::Display for ApiError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::NotFound(msg) | Self::BadRequest(msg) => write!(f, "{}", msg),
      Self::Unavailable => write!(f, "Database unavailable"),
      Self::Database(e) => write!(f, "Database error: {}", e),
    }
  }
}

impl std::error::Error for ApiError {}

impl From<rusqlite::Error> for ApiError {
  fn from(e: rusqlite::Error) -> Self {
    Self::Database(e)
  }
}

impl From<DbLockError> for ApiError {
  fn from(_: DbLockError) -> Self {
    Self::Unavailable
  }
}

impl From<SessionError> for ApiError {
  fn from(e: SessionError) -> Self {
    Self::BadRequest(e.to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
      Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
      Self::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
      Self::Database(e) => {
        tracing::error!("Database error: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
  let db_ok = try_lock(&state.db)
    .ok()
    .map(|conn| db::ping(&conn).is_ok())
    .unwrap_or(false);

  if db_ok {
    (StatusCode::OK, Json(json!({ "status": "ok", "database": "ok" })))
  } else {
    tracing::warn!("Health check failed: database unavailable");
    (
      StatusCode::SERVICE_UNAVAILABLE,
      Json(json!({ "status": "degraded", "database": "unavailable" })),
    )
  }
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/api/decks", post(create_deck))
    .route("/api/decks/{deck_id}", get(get_deck))
    .route("/api/decks/{deck_id}/progress", get(deck_progress))
    .route("/api/study/start", post(start_session))
    .route("/api/study/answer", post(submit_answer))
    .route("/api/study/{session_id}", get(get_session))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::test_server;

  #[tokio::test]
  async fn test_health_ok() {
    let server = test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
  }

  #[test]
  fn test_api_error_status_codes() {
    let cases = [
      (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
      (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
      (ApiError::Unavailable, StatusCode::SERVICE_UNAVAILABLE),
      (
        ApiError::Database(rusqlite::Error::QueryReturnedNoRows),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, status) in cases {
      assert_eq!(err.into_response().status(), status);
    }
  }
}
