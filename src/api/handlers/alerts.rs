use axum::extract::{Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::alert_repo;
use crate::errors::AppError;
use crate::models::{Alert, AlertKind};
use crate::AppState;

#[derive(Deserialize)]
pub struct AlertQuery {
    pub hours: Option<i64>,
    pub kind: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/alerts — recent alerts, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> Result<Json<Vec<Alert>>, AppError> {
    let hours = query.hours.unwrap_or(24).clamp(1, 24 * 30);
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let kind = match &query.kind {
        Some(raw) => Some(
            AlertKind::from_str(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown alert kind: {raw}")))?,
        ),
        None => None,
    };

    let alerts = alert_repo::recent(&state.db, hours, kind.map(|k| k.as_str()), limit).await?;
    Ok(Json(alerts))
}

#[derive(Serialize, Default)]
pub struct AlertStats {
    pub hours: i64,
    pub whale_count: i64,
    pub coordinated_count: i64,
    pub tracked_wallet_count: i64,
    pub volume_spike_count: i64,
    pub total_alerts: i64,
    pub total_volume_tracked: Decimal,
}

/// GET /api/alerts/stats — per-kind counts over the trailing window.
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> Result<Json<AlertStats>, AppError> {
    let hours = query.hours.unwrap_or(24).clamp(1, 24 * 30);

    let rows = alert_repo::stats(&state.db, hours).await?;

    let mut out = AlertStats {
        hours,
        ..Default::default()
    };
    for (kind, count, volume) in rows {
        out.total_alerts += count;
        match AlertKind::from_str(&kind) {
            Some(AlertKind::Whale) => {
                out.whale_count = count;
                out.total_volume_tracked += volume;
            }
            Some(AlertKind::Coordinated) => {
                out.coordinated_count = count;
                out.total_volume_tracked += volume;
            }
            Some(AlertKind::TrackedWallet) => out.tracked_wallet_count = count,
            Some(AlertKind::VolumeSpike) => out.volume_spike_count = count,
            None => {}
        }
    }

    Ok(Json(out))
}
