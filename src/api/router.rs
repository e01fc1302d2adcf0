use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes — no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes — require Bearer token when api_token is set
    let protected = Router::new()
        // Alerts
        .route("/api/alerts", get(handlers::alerts::list))
        .route("/api/alerts/stats", get(handlers::alerts::stats))
        // Wallets
        .route(
            "/api/wallets/tracked",
            get(handlers::wallets::list_tracked).post(handlers::wallets::track),
        )
        .route("/api/wallets/tracked/:wallet", delete(handlers::wallets::untrack))
        .route("/api/wallets/top", get(handlers::wallets::top))
        // Markets
        .route("/api/markets", get(handlers::markets::list))
        .route("/api/markets/:id/summary", get(handlers::markets::summary))
        // Config
        .route(
            "/api/config",
            get(handlers::config::get_config).put(handlers::config::update_config),
        )
        // Control
        .route("/api/control/pause", post(handlers::control::pause))
        .route("/api/control/resume", post(handlers::control::resume))
        .route("/api/control/status", get(handlers::control::status))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
