use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Derived per-wallet aggregate. A view over the trade ledger (and the
/// settlement ledger when populated), recomputed on demand; never a
/// source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletStats {
    pub wallet: String,
    pub total_bets: i64,
    pub total_volume: Decimal,
    pub wins: i64,
    pub losses: i64,
    /// Percentage in [0, 100]. Settlement-derived when wins+losses > 0,
    /// otherwise the volume-tier heuristic.
    pub estimated_win_rate: Decimal,
}

impl WalletStats {
    pub fn empty(wallet: &str) -> Self {
        Self {
            wallet: wallet.to_string(),
            total_bets: 0,
            total_volume: Decimal::ZERO,
            wins: 0,
            losses: 0,
            estimated_win_rate: Decimal::ZERO,
        }
    }
}

/// User-registered watch entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrackedWallet {
    pub wallet: String,
    pub nickname: Option<String>,
    pub added_at: DateTime<Utc>,
}
