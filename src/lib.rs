pub mod api;
pub mod config;
pub mod db;
pub mod flow;
pub mod models;
pub mod rag;
pub mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Full startup sequence: logging, config, state build, serve. Startup
/// errors abort the process.
pub async fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env();
    tracing::info!(
        bind = %config.bind,
        corpus = %config.corpus_path.display(),
        db = %config.db_path.display(),
        model = %config.ollama_model,
        slot_mode = config.slot_mode.as_str(),
        "configuration loaded"
    );

    let state = tokio::task::spawn_blocking(move || state::AppState::init(config))
        .await
        .expect("startup task panicked")
        .expect("Medvice startup failed");

    api::serve(Arc::new(state))
        .await
        .expect("error while running Medvice");
}
