//! Server binary: loads settings, prepares the store, mounts common and API routes.

use client_registry::{
    app, apply_migrations, ensure_database_exists, AppState, MemorySessionStore, MemoryStore,
    PgSessionStore, PgStore, Settings, StoreKind,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("client_registry=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let state = match settings.store {
        StoreKind::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.db_max_connections)
                .connect(&settings.database_url)
                .await?;
            if let Err(e) = apply_migrations(&pool).await {
                tracing::error!(error = %e, "migration failed; continuing with existing schema");
            }
            AppState::new(
                Arc::new(PgStore::new(pool.clone())),
                Arc::new(PgSessionStore::new(pool)),
                &settings.session_cookie,
            )
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            let sessions = MemorySessionStore::with_tokens(&settings.session_tokens);
            if settings.session_tokens.is_empty() {
                let token = sessions.issue("dev", None).await;
                tracing::info!(%token, "no SESSION_TOKENS configured; issued development token");
            }
            AppState::new(
                Arc::new(MemoryStore::new()),
                Arc::new(sessions),
                &settings.session_cookie,
            )
        }
    };

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state, settings.body_limit_bytes)).await?;
    Ok(())
}
