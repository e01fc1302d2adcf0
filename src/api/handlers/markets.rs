use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config;
use crate::db::trade_repo;
use crate::errors::AppError;
use crate::AppState;

/// GET /api/markets — most active markets over the trailing 24h.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<trade_repo::ActiveMarket>>, AppError> {
    let markets = trade_repo::active_markets(&state.db, 10).await?;
    Ok(Json(markets))
}

#[derive(Serialize)]
pub struct MarketSummary {
    pub market_id: String,
    pub total_volume: Decimal,
    pub total_trades: i64,
    pub sides: Vec<trade_repo::SideActivity>,
}

/// GET /api/markets/:id/summary — 24h per-side breakdown with whale
/// activity at the current threshold.
pub async fn summary(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
) -> Result<Json<MarketSummary>, AppError> {
    let settings = config::snapshot(&state.settings);
    let since = Utc::now() - Duration::hours(24);

    let sides = trade_repo::market_summary(
        &state.db,
        &market_id,
        since,
        settings.whale_threshold,
    )
    .await?;

    if sides.is_empty() {
        return Err(AppError::NotFound(format!(
            "no trading activity for market {market_id} in the last 24 hours"
        )));
    }

    let total_volume = sides.iter().map(|s| s.volume).sum();
    let total_trades = sides.iter().map(|s| s.trades).sum();

    Ok(Json(MarketSummary {
        market_id,
        total_volume,
        total_trades,
        sides,
    }))
}
