//! Application configuration.
//!
//! Values resolve with priority: config.toml > environment (.env) > default.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ==================== Defaults ====================

pub const DEFAULT_DATABASE_PATH: &str = "data/flashdeck.db";

/// Server address to bind to
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0";

pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Minutes of inactivity before a live study session is evicted
pub const DEFAULT_SESSION_EXPIRY_MINUTES: i64 = 60;

/// Upper bound for session expiry, one year
pub const MAX_SESSION_EXPIRY_MINUTES: i64 = 525_600;

/// Probability threshold for session cleanup (0-255, lower = less frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

pub const CONFIG_FILE: &str = "config.toml";

// ==================== File structure ====================

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database: Option<DatabaseSection>,
    server: Option<ServerSection>,
    session: Option<SessionSection>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    addr: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct SessionSection {
    expiry_minutes: Option<i64>,
}

// ==================== Resolved config ====================

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub server_addr: String,
    pub server_port: u16,
    pub session_expiry_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            session_expiry_minutes: DEFAULT_SESSION_EXPIRY_MINUTES,
        }
    }
}

impl AppConfig {
    /// Load configuration from `config.toml` in the working directory and the environment
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a file path and an environment lookup
    pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let file = match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                    FileConfig::default()
                }
            },
            Err(_) => FileConfig::default(),
        };
        Self::resolve(file, env)
    }

    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let database_path = file
            .database
            .and_then(|db| db.path)
            .or_else(|| env("DATABASE_PATH"))
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let (file_addr, file_port) = match file.server {
            Some(server) => (server.addr, server.port),
            None => (None, None),
        };

        let server_addr = file_addr
            .or_else(|| env("SERVER_ADDR"))
            .unwrap_or(defaults.server_addr);

        let server_port = file_port
            .or_else(|| env("SERVER_PORT").and_then(|p| p.parse().ok()))
            .unwrap_or(defaults.server_port);

        let session_expiry_minutes = file
            .session
            .and_then(|s| s.expiry_minutes)
            .or_else(|| env("SESSION_EXPIRY_MINUTES").and_then(|m| m.parse().ok()))
            .filter(|m| *m > 0)
            .map(|m| m.min(MAX_SESSION_EXPIRY_MINUTES))
            .unwrap_or(defaults.session_expiry_minutes);

        tracing::info!("Using database path: {}", database_path.display());

        Self {
            database_path,
            server_addr,
            server_port,
            session_expiry_minutes,
        }
    }

    /// Get the full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_addr, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_from(&temp.path().join("missing.toml"), env_from(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_env_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_from(
            &temp.path().join("missing.toml"),
            env_from(&[
                ("DATABASE_PATH", "/tmp/x.db"),
                ("SERVER_PORT", "8080"),
                ("SESSION_EXPIRY_MINUTES", "15"),
            ]),
        );
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.session_expiry_minutes, 15);
    }

    #[test]
    fn test_file_takes_priority_over_env() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[database]
path = "from_file.db"

[server]
addr = "127.0.0.1"
port = 4000
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(
            &path,
            env_from(&[("DATABASE_PATH", "from_env.db"), ("SERVER_PORT", "9999")]),
        );
        assert_eq!(config.database_path, PathBuf::from("from_file.db"));
        assert_eq!(config.bind_addr(), "127.0.0.1:4000");
        assert_eq!(config.session_expiry_minutes, DEFAULT_SESSION_EXPIRY_MINUTES);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let config = AppConfig::load_from(
            &path,
            env_from(&[("SERVER_PORT", "not-a-port"), ("SESSION_EXPIRY_MINUTES", "-5")]),
        );
        assert_eq!(config.server_port, DEFAULT_SERVER_PORT);
        assert_eq!(config.session_expiry_minutes, DEFAULT_SESSION_EXPIRY_MINUTES);
    }

    #[test]
    fn test_huge_session_expiry_is_clamped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[session]\nexpiry_minutes = 9223372036854775807\n").unwrap();

        let from_file = AppConfig::load_from(&path, env_from(&[]));
        assert_eq!(from_file.session_expiry_minutes, MAX_SESSION_EXPIRY_MINUTES);

        let from_env = AppConfig::load_from(
            &temp.path().join("missing.toml"),
            env_from(&[("SESSION_EXPIRY_MINUTES", "999999999999999")]),
        );
        assert_eq!(from_env.session_expiry_minutes, MAX_SESSION_EXPIRY_MINUTES);
    }
}
