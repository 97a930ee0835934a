//! Shared context for the API layer.

use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::state::AppState;

/// Shared state handed to every route handler. Cloning is cheap; the heavy
/// pieces (engine, sessions) live behind the `Arc`.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<AppState>,
}

impl ApiContext {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Per-request connection to the scheduling store.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        Ok(self.state.open_db()?)
    }
}
