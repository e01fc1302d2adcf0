use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Side, Trade, VolumeSpikePayload};

/// Alert when a market's batch volume reaches this multiple of its
/// trailing hourly average (inclusive).
const SPIKE_MULTIPLE: i64 = 3;

/// Per-market aggregate of the current batch.
#[derive(Debug, Clone, Default)]
pub struct MarketBatchVolume {
    pub volume: Decimal,
    pub trade_count: u32,
    pub yes_volume: Decimal,
    pub no_volume: Decimal,
}

/// Sum the batch per market. Side::Unknown contributes to the total but
/// to neither side split.
pub fn aggregate(batch: &[Trade]) -> BTreeMap<String, MarketBatchVolume> {
    let mut per_market: BTreeMap<String, MarketBatchVolume> = BTreeMap::new();
    for trade in batch {
        let entry = per_market.entry(trade.market_id.clone()).or_default();
        entry.volume += trade.amount;
        entry.trade_count += 1;
        match trade.side {
            Side::Yes => entry.yes_volume += trade.amount,
            Side::No => entry.no_volume += trade.amount,
            Side::Unknown => {}
        }
    }
    per_market
}

/// Compare batch volume against the stored hourly baseline. A market with
/// no baseline (average 0) has not accumulated history yet and never
/// spikes by definition.
pub fn detect(
    aggregates: &BTreeMap<String, MarketBatchVolume>,
    baselines: &HashMap<String, Decimal>,
) -> Vec<(String, VolumeSpikePayload)> {
    let threshold = Decimal::from(SPIKE_MULTIPLE);

    let mut alerts = Vec::new();
    for (market_id, current) in aggregates {
        let baseline = baselines
            .get(market_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        if baseline <= Decimal::ZERO {
            continue;
        }

        let ratio = current.volume / baseline;
        if ratio < threshold {
            continue;
        }

        let side_total = current.yes_volume + current.no_volume;
        // Exact Yes/No tie defaults to Yes, by convention.
        let (dominant_side, dominant_volume) = if current.no_volume > current.yes_volume {
            (Side::No, current.no_volume)
        } else {
            (Side::Yes, current.yes_volume)
        };
        let side_percentage = if side_total.is_zero() {
            Decimal::from(50)
        } else {
            dominant_volume * Decimal::ONE_HUNDRED / side_total
        };

        alerts.push((
            market_id.clone(),
            VolumeSpikePayload {
                current_volume: current.volume,
                baseline_volume: baseline,
                spike_ratio: ratio,
                dominant_side,
                side_percentage,
                trade_count: current.trade_count,
            },
        ));
    }

    alerts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
