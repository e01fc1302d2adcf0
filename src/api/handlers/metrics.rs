use axum::extract::State;
use axum::response::IntoResponse;

use crate::AppState;

/// GET /metrics — Prometheus scrape endpoint.
pub async fn render(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics_handle.render()
}
