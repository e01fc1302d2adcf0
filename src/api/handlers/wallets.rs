use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::db::{tracked_repo, trade_repo};
use crate::errors::AppError;
use crate::models::TrackedWallet;
use crate::AppState;

/// GET /api/wallets/tracked
pub async fn list_tracked(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrackedWallet>>, AppError> {
    let wallets = tracked_repo::list(&state.db).await?;
    Ok(Json(wallets))
}

#[derive(Deserialize)]
pub struct TrackRequest {
    pub wallet: String,
    pub nickname: Option<String>,
}

/// POST /api/wallets/tracked — register a wallet to follow.
pub async fn track(
    State(state): State<AppState>,
    Json(body): Json<TrackRequest>,
) -> Result<Json<TrackedWallet>, AppError> {
    let wallet = body.wallet.trim();
    if !wallet.starts_with("0x") || wallet.len() < 10 {
        return Err(AppError::BadRequest("invalid wallet address format".into()));
    }

    let row = tracked_repo::track(&state.db, wallet, body.nickname.as_deref()).await?;
    tracing::info!(wallet = %row.wallet, "Wallet tracked");
    Ok(Json(row))
}

/// DELETE /api/wallets/tracked/:wallet
pub async fn untrack(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = tracked_repo::untrack(&state.db, &wallet).await?;
    if !removed {
        return Err(AppError::NotFound("wallet not being tracked".into()));
    }

    tracing::info!(wallet = %wallet, "Wallet untracked");
    Ok(Json(json!({ "success": true })))
}

/// GET /api/wallets/top — highest-volume wallets in the trade ledger.
pub async fn top(
    State(state): State<AppState>,
) -> Result<Json<Vec<trade_repo::WalletLeader>>, AppError> {
    let leaders = trade_repo::top_wallets(&state.db, 10).await?;
    Ok(Json(leaders))
}
