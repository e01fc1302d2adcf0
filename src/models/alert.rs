use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AlertKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Whale,
    Coordinated,
    TrackedWallet,
    VolumeSpike,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Whale => "whale",
            AlertKind::Coordinated => "coordinated",
            AlertKind::TrackedWallet => "tracked_wallet",
            AlertKind::VolumeSpike => "volume_spike",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "whale" => Some(AlertKind::Whale),
            "coordinated" => Some(AlertKind::Coordinated),
            "tracked_wallet" => Some(AlertKind::TrackedWallet),
            "volume_spike" => Some(AlertKind::VolumeSpike),
            _ => None,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Kind-specific payloads
// ---------------------------------------------------------------------------

use crate::intelligence::entry_quality::EntryScore;
use crate::models::Side;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhalePayload {
    pub wallet: String,
    pub side: Side,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub wallet_win_rate: Decimal,
    pub wallet_total_bets: i64,
    pub market_volume_24h: Decimal,
    pub entry: EntryScore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatedPayload {
    pub side: Side,
    pub wallet_count: u32,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedWalletPayload {
    pub wallet: String,
    pub nickname: Option<String>,
    pub side: Side,
    pub amount: Decimal,
    pub trade_identity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSpikePayload {
    pub current_volume: Decimal,
    pub baseline_volume: Decimal,
    pub spike_ratio: Decimal,
    pub dominant_side: Side,
    pub side_percentage: Decimal,
    pub trade_count: u32,
}

// ---------------------------------------------------------------------------
// Alert — persisted row + insert shape
// ---------------------------------------------------------------------------

/// Database row for the alerts table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alert {
    pub id: Uuid,
    pub kind: String,
    pub market_id: String,
    pub wallet: Option<String>,
    pub amount: Option<Decimal>,
    pub payload: serde_json::Value,
    pub dedup_key: String,
    pub created_at: DateTime<Utc>,
    pub notified_at: Option<DateTime<Utc>>,
}

/// An alert candidate produced by a detector, not yet persisted.
///
/// `dedup_key` encodes the (kind, market, wallet-if-applicable, amount,
/// time-bucket) tuple; the alerts table holds a unique index on it, so a
/// candidate whose key already exists is silently dropped at insert.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub kind: AlertKind,
    pub market_id: String,
    pub wallet: Option<String>,
    pub amount: Option<Decimal>,
    pub payload: serde_json::Value,
    pub dedup_key: String,
}

impl NewAlert {
    pub fn whale(market_id: &str, payload: &WhalePayload, bucket: i64) -> Self {
        Self {
            kind: AlertKind::Whale,
            market_id: market_id.to_string(),
            wallet: Some(payload.wallet.clone()),
            amount: Some(payload.amount),
            payload: serde_json::to_value(payload).unwrap_or_default(),
            dedup_key: format!(
                "whale:{}:{}:{}:{}",
                market_id, payload.wallet, payload.amount, bucket
            ),
        }
    }

    pub fn coordinated(market_id: &str, payload: &CoordinatedPayload, bucket: i64) -> Self {
        Self {
            kind: AlertKind::Coordinated,
            market_id: market_id.to_string(),
            wallet: None,
            amount: Some(payload.total_amount),
            payload: serde_json::to_value(payload).unwrap_or_default(),
            dedup_key: format!("coordinated:{}:{}:{}", market_id, payload.side, bucket),
        }
    }

    pub fn tracked_wallet(market_id: &str, payload: &TrackedWalletPayload) -> Self {
        Self {
            kind: AlertKind::TrackedWallet,
            market_id: market_id.to_string(),
            wallet: Some(payload.wallet.clone()),
            amount: Some(payload.amount),
            payload: serde_json::to_value(payload).unwrap_or_default(),
            // One trade → at most one tracked-wallet alert, keyed by identity.
            dedup_key: format!("tracked:{}", payload.trade_identity),
        }
    }

    pub fn volume_spike(market_id: &str, payload: &VolumeSpikePayload, bucket: i64) -> Self {
        Self {
            kind: AlertKind::VolumeSpike,
            market_id: market_id.to_string(),
            wallet: None,
            amount: Some(payload.current_volume),
            payload: serde_json::to_value(payload).unwrap_or_default(),
            dedup_key: format!("volume_spike:{}:{}", market_id, bucket),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            AlertKind::Whale,
            AlertKind::Coordinated,
            AlertKind::TrackedWallet,
            AlertKind::VolumeSpike,
        ] {
            assert_eq!(AlertKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(AlertKind::from_str("price_change"), None);
    }

    #[test]
    fn test_whale_dedup_key_pins_wallet_amount_and_bucket() {
        let payload = WhalePayload {
            wallet: "0xabc".into(),
            side: Side::Yes,
            amount: Decimal::from(150),
            price: None,
            wallet_win_rate: Decimal::ZERO,
            wallet_total_bets: 0,
            market_volume_24h: Decimal::ZERO,
            entry: EntryScore::default(),
        };

        let a = NewAlert::whale("m1", &payload, 100);
        let b = NewAlert::whale("m1", &payload, 100);
        let c = NewAlert::whale("m1", &payload, 101);

        assert_eq!(a.dedup_key, b.dedup_key);
        assert_ne!(a.dedup_key, c.dedup_key);
    }
}
