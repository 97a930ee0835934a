//! HTTP surface: the assistant routes (ask/search/health/cache), the
//! scheduling API, the simulated logins and the personal-health lookups.
//!
//! The router is composable — `app_router()` returns a `Router` that can be
//! mounted on any axum server instance; `server::serve` binds it with
//! graceful shutdown.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::app_router;
pub use server::serve;
pub use types::ApiContext;
