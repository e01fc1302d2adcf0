use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::DetectorSettings;
use crate::intelligence::resolution::ResolutionSpeed;
use crate::models::{CoordinatedPayload, Side, Trade};

/// Detect coordinated betting in the current batch: multiple distinct
/// wallets on the same side of the same market within the trailing window.
///
/// Three independent gates (distinct-wallet count, combined amount, and
/// the fast-resolution judgment) must all pass; failing any one
/// suppresses the group entirely. Markets missing from `resolution` are
/// treated as `Unknown`, which allows the alert through.
pub fn detect(
    batch: &[Trade],
    now: DateTime<Utc>,
    settings: &DetectorSettings,
    resolution: &HashMap<String, ResolutionSpeed>,
) -> Vec<(String, CoordinatedPayload)> {
    let window = Duration::seconds(settings.coordination_window_secs);

    // Trades with no recovered side cannot support a "same side" claim.
    let mut groups: BTreeMap<(String, Side), (HashSet<&str>, Decimal)> = BTreeMap::new();
    for trade in batch {
        if trade.side == Side::Unknown {
            continue;
        }
        // Age is measured from now, not between trades.
        if now - trade.executed_at > window {
            continue;
        }

        let entry = groups
            .entry((trade.market_id.clone(), trade.side))
            .or_insert_with(|| (HashSet::new(), Decimal::ZERO));
        entry.0.insert(trade.wallet.as_str());
        entry.1 += trade.amount;
    }

    let mut alerts = Vec::new();
    for ((market_id, side), (wallets, total)) in groups {
        let wallet_count = wallets.len() as u32;

        if wallet_count < settings.min_coordinated_wallets {
            continue;
        }
        if total < settings.coordination_min_total {
            continue;
        }

        let speed = resolution
            .get(&market_id)
            .copied()
            .unwrap_or(ResolutionSpeed::Unknown);
        if !speed.allows_coordination() {
            tracing::debug!(
                market = %market_id,
                side = %side,
                "Coordination group suppressed: slow-resolving market"
            );
            continue;
        }

        alerts.push((
            market_id,
            CoordinatedPayload {
                side,
                wallet_count,
                total_amount: total,
            },
        ));
    }

    alerts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(wallet: &str, market: &str, side: Side, amount: i64, age_secs: i64, now: DateTime<Utc>) -> Trade {
        Trade {
            identity: format!("tx-{wallet}-{market}-{amount}"),
            market_id: market.into(),
            wallet: wallet.into(),
            side,
            amount: Decimal::from(amount),
            price: None,
            executed_at: now - Duration::seconds(age_secs),
        }
    }

    fn batch_of(n: usize, amount_each: i64, now: DateTime<Utc>) -> Vec<Trade> {
        (0..n)
            .map(|i| trade(&format!("0xw{i}"), "m1", Side::Yes, amount_each, 60, now))
            .collect()
    }

    #[test]
    fn test_four_wallets_never_alert_even_with_enough_money() {
        let now = Utc::now();
        let batch = batch_of(4, 150, now); // $600 total
        let alerts = detect(&batch, now, &DetectorSettings::default(), &HashMap::new());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_five_wallets_under_floor_never_alert() {
        let now = Utc::now();
        let mut batch = batch_of(5, 99, now); // $495
        batch[0].amount = Decimal::from(103); // $499 total
        let alerts = detect(&batch, now, &DetectorSettings::default(), &HashMap::new());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_five_wallets_at_floor_on_fast_market_alert_once() {
        let now = Utc::now();
        let batch = batch_of(5, 100, now); // $500 exactly
        let resolution = HashMap::from([("m1".to_string(), ResolutionSpeed::Fast)]);

        let alerts = detect(&batch, now, &DetectorSettings::default(), &resolution);
        assert_eq!(alerts.len(), 1);

        let (market, payload) = &alerts[0];
        assert_eq!(market, "m1");
        assert_eq!(payload.wallet_count, 5);
        assert_eq!(payload.total_amount, Decimal::from(500));
        assert_eq!(payload.side, Side::Yes);
    }

    #[test]
    fn test_slow_market_suppresses_entirely() {
        let now = Utc::now();
        let batch = batch_of(6, 200, now);
        let resolution = HashMap::from([("m1".to_string(), ResolutionSpeed::Slow)]);
        let alerts = detect(&batch, now, &DetectorSettings::default(), &resolution);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_unknown_resolution_is_permissive() {
        let now = Utc::now();
        let batch = batch_of(5, 120, now); // $600, no resolution entry at all
        let alerts = detect(&batch, now, &DetectorSettings::default(), &HashMap::new());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].1.total_amount, Decimal::from(600));
    }

    #[test]
    fn test_stale_trades_fall_outside_window() {
        let now = Utc::now();
        let mut batch = batch_of(5, 200, now);
        // Push two trades beyond the 300s window: only 3 wallets remain.
        batch[3].executed_at = now - Duration::seconds(400);
        batch[4].executed_at = now - Duration::seconds(1_000);

        let alerts = detect(&batch, now, &DetectorSettings::default(), &HashMap::new());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_same_wallet_repeated_counts_once() {
        let now = Utc::now();
        let mut batch = batch_of(4, 200, now);
        batch.push(trade("0xw0", "m1", Side::Yes, 200, 30, now)); // repeat wallet

        let alerts = detect(&batch, now, &DetectorSettings::default(), &HashMap::new());
        assert!(alerts.is_empty(), "4 distinct wallets must not alert");
    }

    #[test]
    fn test_sides_group_independently() {
        let now = Utc::now();
        let mut batch = batch_of(5, 150, now);
        batch.extend((0..5).map(|i| trade(&format!("0xn{i}"), "m1", Side::No, 150, 60, now)));

        let alerts = detect(&batch, now, &DetectorSettings::default(), &HashMap::new());
        assert_eq!(alerts.len(), 2);
        let sides: Vec<Side> = alerts.iter().map(|(_, p)| p.side).collect();
        assert!(sides.contains(&Side::Yes) && sides.contains(&Side::No));
    }

    #[test]
    fn test_unknown_side_excluded_from_grouping() {
        let now = Utc::now();
        let batch: Vec<Trade> = (0..6)
            .map(|i| trade(&format!("0xw{i}"), "m1", Side::Unknown, 500, 60, now))
            .collect();
        let alerts = detect(&batch, now, &DetectorSettings::default(), &HashMap::new());
        assert!(alerts.is_empty());
    }
}
