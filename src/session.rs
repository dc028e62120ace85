//! Live study sessions.
//!
//! A session owns the presentation queue for one user working through one deck.
//! Sessions live in a [`SessionStore`] held by the application state and expire
//! after a configurable period of inactivity.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config;
use crate::domain::ProgressRecord;
use crate::srs::{build_initial_queue, requeue_card};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
  /// Card index outside the deck
  CardOutOfRange { card_index: usize, total: usize },
  /// Cursor outside the remaining queue
  CursorOutOfRange { current_index: usize, len: usize },
}

impl std::fmt::Display for SessionError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::CardOutOfRange { card_index, total } => {
        write!(f, "card index {} out of range for deck of {} cards", card_index, total)
      }
      Self::CursorOutOfRange { current_index, len } => {
        write!(f, "current index {} out of range for queue of {} cards", current_index, len)
      }
    }
  }
}

impl std::error::Error for SessionError {}

/// One user's pass through a deck
#[derive(Debug, Clone)]
pub struct StudySession {
  pub user_id: String,
  pub deck_id: i64,
  /// Card ids by deck position; queue entries index into this
  pub card_ids: Vec<i64>,
  pub queue: Vec<usize>,
  pub current_index: usize,
  pub answered_correct: u32,
  pub answered_incorrect: u32,
  pub started_at: DateTime<Utc>,
}

impl StudySession {
  pub fn new(
    user_id: String,
    deck_id: i64,
    card_ids: Vec<i64>,
    progress: &HashMap<usize, ProgressRecord>,
    now: DateTime<Utc>,
  ) -> Self {
    let queue = build_initial_queue(card_ids.len(), progress, now);
    Self {
      user_id,
      deck_id,
      card_ids,
      queue,
      current_index: 0,
      answered_correct: 0,
      answered_incorrect: 0,
      started_at: now,
    }
  }

  pub fn total(&self) -> usize {
    self.card_ids.len()
  }

  /// Card index under the cursor
  pub fn current_card(&self) -> Option<usize> {
    self.queue.get(self.current_index).copied()
  }

  pub fn card_id(&self, card_index: usize) -> Option<i64> {
    self.card_ids.get(card_index).copied()
  }

  pub fn is_finished(&self) -> bool {
    self.queue.is_empty()
  }

  /// Check an answer's indices before anything is persisted
  pub fn validate_answer(&self, current_index: usize, card_index: usize) -> Result<(), SessionError> {
    if card_index >= self.total() {
      return Err(SessionError::CardOutOfRange {
        card_index,
        total: self.total(),
      });
    }
    if current_index >= self.queue.len() {
      return Err(SessionError::CursorOutOfRange {
        current_index,
        len: self.queue.len(),
      });
    }
    Ok(())
  }

  /// Apply an answer to the queue and move the cursor.
  ///
  /// The cursor stays at `current_index`, which now holds the next card, and
  /// wraps to the front once it runs past the end.
  pub fn answer(
    &mut self,
    current_index: usize,
    card_index: usize,
    is_correct: bool,
  ) -> Result<(), SessionError> {
    self.validate_answer(current_index, card_index)?;

    if self.queue[current_index] != card_index {
      tracing::warn!(
        "Card {} answered at position {} which holds {}; it may be duplicated",
        card_index,
        current_index,
        self.queue[current_index]
      );
    }

    self.queue = requeue_card(&self.queue, current_index, card_index, is_correct);
    if is_correct {
      self.answered_correct += 1;
    } else {
      self.answered_incorrect += 1;
    }

    self.current_index = if current_index < self.queue.len() {
      current_index
    } else {
      0
    };
    Ok(())
  }
}

/// Session entry with last access time for expiration
struct SessionEntry {
  session: StudySession,
  last_access: DateTime<Utc>,
}

/// In-memory session storage keyed by session id
#[derive(Clone)]
pub struct SessionStore {
  sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
  expiry: Duration,
}

impl SessionStore {
  pub fn new(expiry_minutes: i64) -> Self {
    let minutes = expiry_minutes.clamp(1, config::MAX_SESSION_EXPIRY_MINUTES);
    Self {
      sessions: Arc::new(Mutex::new(HashMap::new())),
      expiry: Duration::minutes(minutes),
    }
  }

  // Entries are plain data, so a poisoned lock is still usable
  fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
    self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Store a new session and return its id
  pub fn create(&self, session: StudySession) -> String {
    let id = generate_session_id();
    let mut sessions = self.lock();
    sessions.insert(
      id.clone(),
      SessionEntry {
        session,
        last_access: Utc::now(),
      },
    );
    id
  }

  /// Fetch a session, refreshing its last access time
  pub fn get(&self, session_id: &str) -> Option<StudySession> {
    let mut sessions = self.lock();

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      Self::evict(&mut sessions, Utc::now() - self.expiry);
    }

    let entry = sessions.get_mut(session_id)?;
    entry.last_access = Utc::now();
    Some(entry.session.clone())
  }

  /// Run `f` on a session while holding the store lock, so concurrent answers
  /// to the same session apply one after another. A session whose queue is
  /// empty afterwards is removed. Returns None for unknown or expired ids.
  pub fn with_session_mut<R>(
    &self,
    session_id: &str,
    f: impl FnOnce(&mut StudySession) -> R,
  ) -> Option<R> {
    let mut sessions = self.lock();
    let entry = sessions.get_mut(session_id)?;
    entry.last_access = Utc::now();
    let result = f(&mut entry.session);
    if entry.session.is_finished() {
      sessions.remove(session_id);
    }
    Some(result)
  }

  pub fn remove(&self, session_id: &str) -> Option<StudySession> {
    self.lock().remove(session_id).map(|entry| entry.session)
  }

  /// Drop sessions idle since before `now - expiry`; returns how many were removed
  pub fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
    let mut sessions = self.lock();
    Self::evict(&mut sessions, now - self.expiry)
  }

  fn evict(sessions: &mut HashMap<String, SessionEntry>, cutoff: DateTime<Utc>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| entry.last_access > cutoff);
    let removed = before - sessions.len();
    if removed > 0 {
      tracing::debug!("Evicted {} expired study sessions", removed);
    }
    removed
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36u8);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
