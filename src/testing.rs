//! Test utilities for database setup.
//!
//! Reuses the authoritative schema so tests never duplicate DDL.

use axum_test::TestServer;
use rusqlite::Connection;
use tempfile::TempDir;

use crate::db::{self, DbPool};
use crate::handlers::router;
use crate::session::SessionStore;
use crate::state::AppState;

/// Test environment with a migrated database file in a temporary directory.
///
/// The directory is removed when the environment is dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    pub conn: Connection,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let conn = Connection::open(temp.path().join("flashdeck.db"))?;
        db::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }
}

/// Shared pool over a fresh in-memory database, for handler tests
pub fn test_pool() -> DbPool {
    db::init_memory_db().expect("in-memory database")
}

/// HTTP test server over the full router and an empty in-memory database
pub fn test_server() -> TestServer {
    let state = AppState::new(test_pool(), SessionStore::new(60));
    TestServer::new(router(state)).expect("test server")
}
