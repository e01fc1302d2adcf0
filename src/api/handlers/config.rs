use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::{self, DetectorSettings};
use crate::db::settings_repo;
use crate::errors::AppError;
use crate::AppState;

/// GET /api/config — the current runtime-adjustable parameters.
pub async fn get_config(State(state): State<AppState>) -> Json<DetectorSettings> {
    Json(config::snapshot(&state.settings))
}

/// Partial update: absent fields keep their current values.
#[derive(Deserialize)]
pub struct UpdateSettingsRequest {
    pub whale_threshold: Option<Decimal>,
    pub min_entry_score: Option<i32>,
    pub min_coordinated_wallets: Option<u32>,
    pub coordination_min_total: Option<Decimal>,
    pub coordination_window_secs: Option<i64>,
    pub poll_interval_secs: Option<u64>,
}

/// PUT /api/config — validate, persist, and apply a settings update.
///
/// The merged value is validated as a whole: an out-of-range field
/// rejects the entire request and nothing is applied. Accepted updates
/// take effect on the monitor's next iteration.
pub async fn update_config(
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<DetectorSettings>, AppError> {
    let mut updated = config::snapshot(&state.settings);

    if let Some(v) = body.whale_threshold {
        updated.whale_threshold = v;
    }
    if let Some(v) = body.min_entry_score {
        updated.min_entry_score = v;
    }
    if let Some(v) = body.min_coordinated_wallets {
        updated.min_coordinated_wallets = v;
    }
    if let Some(v) = body.coordination_min_total {
        updated.coordination_min_total = v;
    }
    if let Some(v) = body.coordination_window_secs {
        updated.coordination_window_secs = v;
    }
    if let Some(v) = body.poll_interval_secs {
        updated.poll_interval_secs = v;
    }

    let validated = updated.validated().map_err(AppError::BadRequest)?;

    settings_repo::save_settings(&state.db, &validated).await?;

    *state
        .settings
        .write()
        .expect("settings lock poisoned") = validated.clone();

    tracing::info!(
        whale_threshold = %validated.whale_threshold,
        min_coordinated = validated.min_coordinated_wallets,
        poll_interval = validated.poll_interval_secs,
        "Runtime settings updated"
    );

    Ok(Json(validated))
}
