use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flashdeck::config::AppConfig;
use flashdeck::session::SessionStore;
use flashdeck::state::AppState;
use flashdeck::{db, handlers};

/// Seconds between expired-session sweeps
const SWEEP_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flashdeck=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = AppConfig::load();

  let pool = db::init_db(&config.database_path).expect("Failed to initialize database");
  let sessions = SessionStore::new(config.session_expiry_minutes);

  // Periodic sweep so idle sessions go away even without traffic
  let sweeper = sessions.clone();
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
    loop {
      interval.tick().await;
      sweeper.cleanup_expired(chrono::Utc::now());
    }
  });

  let app = handlers::router(AppState::new(pool, sessions));

  let bind_addr = config.bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://{}", bind_addr);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
