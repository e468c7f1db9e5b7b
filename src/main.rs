//! Puzzle Rally Back binary entrypoint wiring REST, SSE, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use puzzle_rally_back::{
    config::AppConfig,
    routes,
    services::scoreboard_push,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    bootstrap_storage(&app_state).await;
    // Consistency backstop: re-push scoreboards to live subscribers.
    tokio::spawn(scoreboard_push::run(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Wire the PostgreSQL supervisor, or fall back to the in-memory store when
/// no database is configured.
async fn bootstrap_storage(state: &SharedState) {
    #[cfg(feature = "pg-store")]
    {
        use puzzle_rally_back::dao::progress_store::ProgressStore;
        use puzzle_rally_back::dao::progress_store::postgres::{PgConfig, PgProgressStore};
        use puzzle_rally_back::services::storage_supervisor;

        match PgConfig::from_env() {
            Ok(pg_config) => {
                tokio::spawn(storage_supervisor::run(state.clone(), move || {
                    let pg_config = pg_config.clone();
                    async move {
                        let store = PgProgressStore::connect(pg_config).await?;
                        Ok(Arc::new(store) as Arc<dyn ProgressStore>)
                    }
                }));
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, "PostgreSQL not configured; using the in-memory store");
            }
        }
    }

    install_memory_store(state).await;
}

/// Install the volatile fallback store.
async fn install_memory_store(state: &SharedState) {
    use puzzle_rally_back::dao::progress_store::memory::MemoryProgressStore;

    state
        .install_progress_store(Arc::new(MemoryProgressStore::new()))
        .await;
    info!("in-memory store installed; progress will not survive restarts");
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
