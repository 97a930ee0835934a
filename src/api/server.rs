//! HTTP server lifecycle: bind the configured address and serve the router
//! until a shutdown signal arrives.

use std::future::Future;
use std::sync::Arc;

use crate::api::router::app_router;
use crate::api::types::ApiContext;
use crate::state::AppState;

/// Bind `config.bind` and serve until ctrl-c.
pub async fn serve(state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(state.config.bind).await?;
    run_on(listener, state, shutdown_signal()).await
}

/// Serve on an already-bound listener. Split out of [`serve`] so tests can
/// bind an ephemeral port and drive shutdown themselves.
pub async fn run_on(
    listener: tokio::net::TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(
        %addr,
        data_count = state.engine.data_count(),
        model = state.engine.model_name(),
        "API server listening"
    );

    let app = app_router(ApiContext::new(state));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
