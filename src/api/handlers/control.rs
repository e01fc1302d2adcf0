use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::config;
use crate::db::tracked_repo;
use crate::AppState;

/// POST /api/control/pause — stop processing at the next loop iteration.
pub async fn pause(State(state): State<AppState>) -> impl IntoResponse {
    state.pause_flag.store(true, Ordering::Relaxed);
    tracing::warn!("Monitoring PAUSED via control API");
    (StatusCode::OK, Json(json!({ "status": "paused" })))
}

/// POST /api/control/resume — resume processing.
pub async fn resume(State(state): State<AppState>) -> impl IntoResponse {
    state.pause_flag.store(false, Ordering::Relaxed);
    tracing::info!("Monitoring RESUMED via control API");
    (StatusCode::OK, Json(json!({ "status": "running" })))
}

/// GET /api/control/status — current state and effective settings.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let paused = state.pause_flag.load(Ordering::Relaxed);
    let settings = config::snapshot(&state.settings);

    let tracked_count = tracked_repo::list(&state.db)
        .await
        .map(|w| w.len())
        .unwrap_or(0);

    Json(json!({
        "paused": paused,
        "whale_threshold": settings.whale_threshold,
        "min_coordinated_wallets": settings.min_coordinated_wallets,
        "poll_interval_secs": settings.poll_interval_secs,
        "tracked_wallets": tracked_count,
        "notifications_enabled": state.notifier.is_some(),
    }))
}
