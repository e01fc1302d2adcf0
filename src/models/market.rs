use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Optional per-market metadata from the venue. Absence of any field (or
/// of the whole record) degrades the consumers to their permissive or
/// unknown branches; it never blocks detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketMeta {
    pub market_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
    /// Current implied probability of the Yes outcome, in [0, 1].
    pub yes_price: Option<Decimal>,
}

/// Per-market context assembled for the detectors. Derived from the trade
/// ledger and snapshot table each cycle; never stored.
#[derive(Debug, Clone)]
pub struct MarketContext {
    pub market_id: String,
    pub volume_24h: Decimal,
    pub trade_count_24h: i64,
    /// Mean of stored hourly snapshots over the trailing window.
    /// Zero means "no baseline", not "zero volume".
    pub baseline_volume: Decimal,
    pub meta: Option<MarketMeta>,
}

impl MarketContext {
    pub fn empty(market_id: &str) -> Self {
        Self {
            market_id: market_id.to_string(),
            volume_24h: Decimal::ZERO,
            trade_count_24h: 0,
            baseline_volume: Decimal::ZERO,
            meta: None,
        }
    }
}
