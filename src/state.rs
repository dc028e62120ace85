//! Application state shared by all handlers.

use crate::db::DbPool;
use crate::session::SessionStore;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,

    /// Live study sessions, keyed by session id
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(db: DbPool, sessions: SessionStore) -> Self {
        Self { db, sessions }
    }
}
