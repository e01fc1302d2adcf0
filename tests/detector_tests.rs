//! End-to-end scenarios over the normalize → dedup → detect layer, with
//! an in-memory identity ledger standing in for the durable store.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

use predictwatch::config::DetectorSettings;
use predictwatch::detectors::{coordination, volume_spike, whale};
use predictwatch::feed::normalize;
use predictwatch::intelligence::resolution::ResolutionSpeed;
use predictwatch::models::{MarketContext, MarketMeta, NewAlert, Side, Trade, WalletStats};

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Normalize a raw batch and admit each identity once, the way the
/// monitor front-end does against the trade ledger.
fn admit_batch(raw: &[Value], ledger: &mut HashSet<String>, at: DateTime<Utc>) -> Vec<Trade> {
    raw.iter()
        .filter_map(|record| normalize(record, at).ok())
        .filter(|trade| ledger.insert(trade.identity.clone()))
        .collect()
}

fn whale_fill(tx: &str, wallet: &str, market: &str, amount: i64) -> Value {
    json!({
        "hash": tx,
        "market": { "id": market },
        "taker": { "signer": wallet, "outcome": { "name": "Yes" } },
        "amount": amount.to_string(),
        "price": 0.45,
        "executedAt": 1_700_000_000 - 30,
    })
}

fn settings_with_threshold(threshold: i64) -> DetectorSettings {
    DetectorSettings {
        whale_threshold: Decimal::from(threshold),
        ..DetectorSettings::default()
    }
}

fn sharp_wallet(wallet: &str) -> WalletStats {
    WalletStats {
        wallet: wallet.into(),
        total_bets: 25,
        total_volume: Decimal::from(6_000),
        wins: 0,
        losses: 0,
        estimated_win_rate: Decimal::from(75),
    }
}

fn fast_liquid_market(market: &str, at: DateTime<Utc>) -> MarketContext {
    MarketContext {
        market_id: market.into(),
        volume_24h: Decimal::from(22_000),
        trade_count_24h: 400,
        baseline_volume: Decimal::from(1_000),
        meta: Some(MarketMeta {
            market_id: market.into(),
            title: Some("Match result tonight".into()),
            description: None,
            end_date: Some(at + Duration::days(1)),
            yes_price: Some(Decimal::new(35, 2)),
        }),
    }
}

#[test]
fn whale_alert_emitted_once_and_replay_is_silent() {
    let at = now();
    let settings = settings_with_threshold(100);
    let mut ledger = HashSet::new();

    let raw = vec![whale_fill("0xT1", "0xW", "M", 150)];

    // First delivery: exactly one whale alert referencing the trade.
    let batch = admit_batch(&raw, &mut ledger, at);
    assert_eq!(batch.len(), 1);

    let stats = sharp_wallet("0xW");
    let market = fast_liquid_market("M", at);
    let verdict = whale::evaluate(&batch[0], &stats, &market, &settings, at);
    let payload = match verdict {
        whale::WhaleVerdict::Qualified(p) => p,
        other => panic!("expected whale alert, got {other:?}"),
    };
    assert_eq!(payload.amount, Decimal::from(150));
    assert_eq!(batch[0].identity, "0xT1");

    // Replaying the identical record produces zero additional trades,
    // hence zero additional alerts.
    let replay = admit_batch(&raw, &mut ledger, at);
    assert!(replay.is_empty());
}

#[test]
fn whale_dedup_key_collapses_same_bucket_duplicates() {
    let at = now();
    let settings = settings_with_threshold(100);
    let stats = sharp_wallet("0xW");
    let market = fast_liquid_market("M", at);
    let bucket = at.timestamp() / 3600;

    // Two deliveries of the same bet that slipped past identity dedup
    // (e.g. differing synthetic identities) still share one dedup key.
    let mut keys = HashSet::new();
    for tx in ["0xT1", "0xT2"] {
        let raw = whale_fill(tx, "0xW", "M", 150);
        let trade = normalize(&raw, at).unwrap();
        if let whale::WhaleVerdict::Qualified(p) =
            whale::evaluate(&trade, &stats, &market, &settings, at)
        {
            keys.insert(NewAlert::whale(&trade.market_id, &p, bucket).dedup_key);
        }
    }

    assert_eq!(keys.len(), 1, "same (market, wallet, amount, bucket) must share a key");
}

#[test]
fn coordination_scenario_five_wallets_same_side() {
    let at = now();
    let mut ledger = HashSet::new();

    // Five distinct wallets, $120 each on Yes of market M, within 60s.
    let raw: Vec<Value> = (0..5)
        .map(|i| {
            json!({
                "hash": format!("0xc{i}"),
                "market": { "id": "M" },
                "taker": { "signer": format!("0xw{i}"), "outcome": { "name": "Yes" } },
                "amount": "120",
                "executedAt": 1_700_000_000 - 60 + i,
            })
        })
        .collect();

    let batch = admit_batch(&raw, &mut ledger, at);
    assert_eq!(batch.len(), 5);

    let resolution = HashMap::from([("M".to_string(), ResolutionSpeed::Fast)]);
    let alerts = coordination::detect(&batch, at, &DetectorSettings::default(), &resolution);

    assert_eq!(alerts.len(), 1, "exactly one coordinated alert");
    let (market, payload) = &alerts[0];
    assert_eq!(market, "M");
    assert_eq!(payload.side, Side::Yes);
    assert_eq!(payload.wallet_count, 5);
    assert_eq!(payload.total_amount, Decimal::from(600));
}

#[test]
fn no_baseline_market_never_spikes() {
    let at = now();
    let mut ledger = HashSet::new();

    let raw = vec![json!({
        "hash": "0xbig",
        "market": { "id": "M" },
        "taker": { "signer": "0xw", "outcome": { "name": "Yes" } },
        "amount": "5000",
        "executedAt": 1_700_000_000 - 10,
    })];

    let batch = admit_batch(&raw, &mut ledger, at);
    let aggregates = volume_spike::aggregate(&batch);

    // average_volume = 0 ⇒ no baseline ⇒ no alert, regardless of size.
    let alerts = volume_spike::detect(&aggregates, &HashMap::new());
    assert!(alerts.is_empty());
}

#[test]
fn mixed_batch_with_malformed_records_still_processes() {
    let at = now();
    let mut ledger = HashSet::new();

    let raw = vec![
        whale_fill("0xok", "0xW", "M", 200),
        json!({ "garbage": true }),
        json!(null),
        json!({ "price": 0.5 }),
    ];

    let batch = admit_batch(&raw, &mut ledger, at);
    assert_eq!(batch.len(), 1, "malformed records skipped, good one kept");
    assert_eq!(batch[0].identity, "0xok");
}

#[test]
fn detectors_share_one_batch_without_interference() {
    let at = now();
    let settings = settings_with_threshold(100);
    let mut ledger = HashSet::new();

    // Five wallets coordinate; one of them is also a whale-sized bet.
    let mut raw: Vec<Value> = (0..4)
        .map(|i| {
            json!({
                "hash": format!("0xs{i}"),
                "market": { "id": "M" },
                "taker": { "signer": format!("0xw{i}"), "outcome": { "name": "Yes" } },
                "amount": "110",
                "executedAt": 1_700_000_000 - 20,
            })
        })
        .collect();
    raw.push(whale_fill("0xbig", "0xw4", "M", 400));

    let batch = admit_batch(&raw, &mut ledger, at);
    assert_eq!(batch.len(), 5);

    // Coordination sees all five wallets ($840 total).
    let alerts = coordination::detect(&batch, at, &settings, &HashMap::new());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].1.wallet_count, 5);
    assert_eq!(alerts[0].1.total_amount, Decimal::from(840));

    // The whale detector independently flags the large bet.
    let big = batch.iter().find(|t| t.identity == "0xbig").unwrap();
    let verdict = whale::evaluate(
        big,
        &sharp_wallet("0xw4"),
        &fast_liquid_market("M", at),
        &settings,
        at,
    );
    assert!(matches!(verdict, whale::WhaleVerdict::Qualified(_)));
}
