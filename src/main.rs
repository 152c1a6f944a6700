mod config;
mod db;
mod error;
mod guard;
mod rotate;
mod routes;
mod services;
mod state;

use models::AdminLevel;
use tracing_subscriber::EnvFilter;

/// Create the first administrator from `ADMIN_BOOTSTRAP_EMAIL` /
/// `ADMIN_BOOTSTRAP_PASSWORD` when both are set. Never overwrites.
async fn bootstrap_admin(pool: &sqlx::PgPool) {
    let (Ok(email), Ok(password)) = (std::env::var("ADMIN_BOOTSTRAP_EMAIL"), std::env::var("ADMIN_BOOTSTRAP_PASSWORD"))
    else {
        return;
    };
    let name = std::env::var("ADMIN_BOOTSTRAP_NAME").unwrap_or_else(|_| "Administrator".into());
    let email = email.trim().to_ascii_lowercase();

    let hash = match services::password::hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e, "admin bootstrap hashing failed");
            return;
        }
    };
    match services::accounts::ensure_admin(pool, &email, &name, &hash, AdminLevel::Super).await {
        Ok(true) => tracing::info!(%email, "bootstrap administrator created"),
        Ok(false) => tracing::debug!(%email, "bootstrap administrator already exists"),
        Err(e) => tracing::error!(error = %e, "admin bootstrap failed"),
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::ServerConfig::from_env().expect("invalid server configuration");
    let pool = db::init_pool(&config)
        .await
        .expect("database init failed");

    bootstrap_admin(&pool).await;

    let github = services::github::GitHubConfig::from_env();
    if github.is_none() {
        tracing::warn!("GitHub OAuth not configured; social login disabled");
    }

    let port = config.port;
    let environment = config.environment;
    let state = state::AppState::new(pool, config, github);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, ?environment, "realty api listening");
    axum::serve(listener, app).await.expect("server failed");
}
