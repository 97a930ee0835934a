//! HTTP route table.
//!
//! Assistant routes sit at the root (`/ask`, `/search/:query`, `/health`,
//! `/cache`), the sign-in simulations next to them, and the booking plus
//! personal-health routes under `/api/`. CORS is wide open; the service
//! fronts a local demo UI, not the public internet.
//!
//! Path params use `:param` syntax (matchit 0.7 / axum 0.7).

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

pub fn app_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::health))
        .route("/ask", post(endpoints::chat::ask))
        .route("/search/:query", get(endpoints::chat::search))
        .route("/cache", delete(endpoints::chat::clear_cache))
        .route("/login", post(endpoints::auth::login))
        .route("/edevlet-login", post(endpoints::auth::edevlet_login))
        .route("/enabiz-login", post(endpoints::auth::enabiz_login))
        .route("/api/departments", get(endpoints::appointments::departments))
        .route(
            "/api/hospitals/:department_id",
            get(endpoints::appointments::hospitals),
        )
        .route(
            "/api/doctors/:department_id/:hospital_id",
            get(endpoints::appointments::doctors),
        )
        .route(
            "/api/available-dates/:doctor_id",
            get(endpoints::appointments::available_dates),
        )
        .route(
            "/api/available-times/:doctor_id/:date",
            get(endpoints::appointments::available_times),
        )
        .route("/api/appointments", post(endpoints::appointments::create))
        .route(
            "/api/appointments/:patient",
            get(endpoints::appointments::for_patient),
        )
        .route("/api/lab-results/:user_id", get(endpoints::labs::lab_results))
        .route("/api/medicines/:user_id", get(endpoints::medicines::medicines))
        .with_state(ctx)
        .layer(CorsLayer::permissive())
}
