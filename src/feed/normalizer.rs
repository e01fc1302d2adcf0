use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::str::FromStr;

use crate::models::{Side, Trade};
use super::types::{FillFlat, FillNested, RawFill};

/// Divisor for base-unit amounts in the older flat payload shape.
const BASE_UNIT_SCALE: i64 = 1_000_000_000_000_000_000;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// Neither a market identity nor a wallet identity could be recovered;
    /// the record is unusable for every detector.
    #[error("record carries no market or wallet identity")]
    Unusable,
}

/// Convert one raw feed record into a canonical Trade.
///
/// Missing optional fields degrade to safe defaults (`Side::Unknown`,
/// zero amount, `now` timestamp); only a record with no market and no
/// wallet at all is rejected. A malformed record therefore never aborts
/// the batch; the caller skips it and moves on.
pub fn normalize(raw: &Value, now: DateTime<Utc>) -> Result<Trade, NormalizeError> {
    let fill: RawFill =
        serde_json::from_value(raw.clone()).unwrap_or_else(|_| RawFill::Opaque(raw.clone()));

    match fill {
        RawFill::Nested(f) => normalize_nested(&f, now),
        RawFill::Flat(f) => normalize_flat(&f, now),
        RawFill::Opaque(v) => normalize_best_effort(&v, now),
    }
}

fn normalize_nested(fill: &FillNested, now: DateTime<Utc>) -> Result<Trade, NormalizeError> {
    let market_id = value_to_string(&fill.market.id);
    let wallet = fill.taker.signer.clone();
    if market_id.is_none() && wallet.is_empty() {
        return Err(NormalizeError::Unusable);
    }

    let side = fill
        .taker
        .outcome
        .as_ref()
        .and_then(|o| o.name.as_deref())
        .map(Side::from_api_str)
        .unwrap_or(Side::Unknown);

    let amount = fill
        .amount
        .as_ref()
        .and_then(value_to_decimal)
        .unwrap_or(Decimal::ZERO);
    let price = fill.price.as_ref().and_then(value_to_decimal).filter(|p| !p.is_zero());
    let executed_at = parse_timestamp(fill.executed_at.as_ref()).unwrap_or(now);

    let market_id = market_id.unwrap_or_else(|| "unknown".into());
    let identity = derive_identity(fill.hash.as_deref(), &wallet, &market_id, amount, executed_at);

    Ok(Trade {
        identity,
        market_id,
        wallet,
        side,
        amount,
        price,
        executed_at,
    })
}

fn normalize_flat(fill: &FillFlat, now: DateTime<Utc>) -> Result<Trade, NormalizeError> {
    let market_id = value_to_string(&fill.token_id);
    let wallet = fill.taker.as_ref().and_then(value_to_wallet);
    if market_id.is_none() && wallet.is_none() {
        return Err(NormalizeError::Unusable);
    }

    let side = fill
        .side
        .as_ref()
        .map(|v| Side::from_api_str(&value_to_string(v).unwrap_or_default()))
        .unwrap_or(Side::Unknown);

    // Flat payloads carry 1e18 base units.
    let amount = value_to_decimal(&fill.taker_amount)
        .map(|a| a / Decimal::from(BASE_UNIT_SCALE))
        .unwrap_or(Decimal::ZERO);
    let price = fill
        .price
        .as_ref()
        .and_then(value_to_decimal)
        .map(|p| p / Decimal::from(BASE_UNIT_SCALE))
        .filter(|p| !p.is_zero());
    let executed_at = parse_timestamp(fill.executed_at.as_ref()).unwrap_or(now);

    let market_id = market_id.unwrap_or_else(|| "unknown".into());
    let wallet = wallet.unwrap_or_else(|| "unknown".into());
    let identity = derive_identity(
        fill.transaction_hash.as_deref(),
        &wallet,
        &market_id,
        amount,
        executed_at,
    );

    Ok(Trade {
        identity,
        market_id,
        wallet,
        side,
        amount,
        price,
        executed_at,
    })
}

/// Last-resort extraction for payloads matching no known shape: probe the
/// field names both historical schemas have used.
fn normalize_best_effort(v: &Value, now: DateTime<Utc>) -> Result<Trade, NormalizeError> {
    let market_id = lookup(v, &["market_id", "marketId", "tokenId", "market"])
        .and_then(|f| match f {
            Value::Object(o) => o.get("id").and_then(value_to_string),
            other => value_to_string(other),
        });

    let wallet = lookup(v, &["taker", "wallet", "signer", "maker"]).and_then(value_to_wallet);

    if market_id.is_none() && wallet.is_none() {
        return Err(NormalizeError::Unusable);
    }

    let side = lookup(v, &["side", "outcome"])
        .and_then(value_to_string)
        .map(|s| Side::from_api_str(&s))
        .unwrap_or(Side::Unknown);

    let amount = lookup(v, &["amount", "size", "notional"])
        .and_then(value_to_decimal)
        .or_else(|| {
            lookup(v, &["takerAmount"])
                .and_then(value_to_decimal)
                .map(|a| a / Decimal::from(BASE_UNIT_SCALE))
        })
        .unwrap_or(Decimal::ZERO);

    let price = lookup(v, &["price"]).and_then(value_to_decimal).filter(|p| !p.is_zero());
    let executed_at = parse_timestamp(lookup(v, &["executedAt", "executed_at", "timestamp"]))
        .unwrap_or(now);

    let tx_hash = lookup(v, &["transactionHash", "hash", "txHash", "tx_hash"])
        .and_then(value_to_string);

    let market_id = market_id.unwrap_or_else(|| "unknown".into());
    let wallet = wallet.unwrap_or_else(|| "unknown".into());
    let identity = derive_identity(tx_hash.as_deref(), &wallet, &market_id, amount, executed_at);

    Ok(Trade {
        identity,
        market_id,
        wallet,
        side,
        amount,
        price,
        executed_at,
    })
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Prefer the venue transaction hash. Without one, synthesize an identity
/// from (wallet, market, amount, executed_at). Two genuinely distinct
/// trades with identical fields in the same second collide under the
/// synthetic form; that precision loss is a documented trade-off of the
/// upstream feed, not something to paper over here.
pub fn derive_identity(
    tx_hash: Option<&str>,
    wallet: &str,
    market_id: &str,
    amount: Decimal,
    executed_at: DateTime<Utc>,
) -> String {
    if let Some(hash) = tx_hash {
        let trimmed = hash.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(wallet.as_bytes());
    hasher.update(b"|");
    hasher.update(market_id.as_bytes());
    hasher.update(b"|");
    hasher.update(amount.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(executed_at.timestamp().to_string().as_bytes());

    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("syn:{hex}")
}

// ---------------------------------------------------------------------------
// Scalar decoding helpers
// ---------------------------------------------------------------------------

fn lookup<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| v.get(k)).filter(|v| !v.is_null())
}

fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Wallet fields have appeared as bare strings and as `{ "id": … }` /
/// `{ "signer": … }` objects across feed versions.
fn value_to_wallet(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(o) => o
            .get("id")
            .or_else(|| o.get("signer"))
            .and_then(value_to_string),
        _ => None,
    }
}

fn value_to_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Timestamps arrive as unix seconds, unix millis, numeric strings, or
/// RFC3339 strings depending on the feed version.
pub fn parse_timestamp(v: Option<&Value>) -> Option<DateTime<Utc>> {
    v.and_then(|t| match t {
        Value::Number(n) => {
            let secs = n.as_i64()?;
            from_unix(secs)
        }
        Value::String(s) => {
            if let Ok(secs) = s.parse::<i64>() {
                return from_unix(secs);
            }
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }
        _ => None,
    })
}

fn from_unix(raw: i64) -> Option<DateTime<Utc>> {
    // >1e12 means milliseconds
    if raw > 1_000_000_000_000 {
        DateTime::from_timestamp(raw / 1000, ((raw % 1000) * 1_000_000) as u32)
    } else {
        DateTime::from_timestamp(raw, 0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_normalize_nested_shape() {
        let raw = json!({
            "hash": "0xdeadbeef",
            "market": { "id": 42 },
            "taker": { "signer": "0xwallet1", "outcome": { "name": "Yes" } },
            "amount": "150.5",
            "price": 0.62,
            "executedAt": 1_700_000_100,
        });

        let trade = normalize(&raw, now()).unwrap();
        assert_eq!(trade.identity, "0xdeadbeef");
        assert_eq!(trade.market_id, "42");
        assert_eq!(trade.wallet, "0xwallet1");
        assert_eq!(trade.side, Side::Yes);
        assert_eq!(trade.amount, Decimal::new(1505, 1));
        assert_eq!(trade.price, Some(Decimal::new(62, 2)));
        assert_eq!(trade.executed_at.timestamp(), 1_700_000_100);
    }

    #[test]
    fn test_normalize_flat_shape_scales_base_units() {
        let raw = json!({
            "transactionHash": "0xabc123",
            "tokenId": 7,
            "taker": { "id": "0xwallet2" },
            "side": 1,
            "takerAmount": "150000000000000000000",
            "price": "620000000000000000",
            "executedAt": "1700000100",
        });

        let trade = normalize(&raw, now()).unwrap();
        assert_eq!(trade.identity, "0xabc123");
        assert_eq!(trade.market_id, "7");
        assert_eq!(trade.wallet, "0xwallet2");
        assert_eq!(trade.side, Side::No);
        assert_eq!(trade.amount, Decimal::from(150));
        assert_eq!(trade.price, Some(Decimal::new(62, 2)));
    }

    #[test]
    fn test_missing_optionals_degrade_not_fail() {
        let raw = json!({
            "tokenId": "9",
            "takerAmount": "0",
        });

        let trade = normalize(&raw, now()).unwrap();
        assert_eq!(trade.side, Side::Unknown);
        assert_eq!(trade.amount, Decimal::ZERO);
        assert_eq!(trade.wallet, "unknown");
        assert_eq!(trade.executed_at, now());
        assert!(trade.has_synthetic_identity());
    }

    #[test]
    fn test_unusable_record_rejected() {
        let raw = json!({ "foo": "bar", "price": 0.5 });
        assert!(normalize(&raw, now()).is_err());
    }

    #[test]
    fn test_best_effort_extraction() {
        let raw = json!({
            "wallet": "0xwallet3",
            "market_id": "55",
            "size": 75,
            "outcome": "NO",
            "timestamp": 1_700_000_000_123i64,
        });

        let trade = normalize(&raw, now()).unwrap();
        assert_eq!(trade.wallet, "0xwallet3");
        assert_eq!(trade.market_id, "55");
        assert_eq!(trade.amount, Decimal::from(75));
        assert_eq!(trade.side, Side::No);
        assert_eq!(trade.executed_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_synthetic_identity_is_stable_and_distinct() {
        let a = derive_identity(None, "w1", "m1", Decimal::from(100), now());
        let b = derive_identity(None, "w1", "m1", Decimal::from(100), now());
        let c = derive_identity(None, "w1", "m1", Decimal::from(101), now());

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("syn:"));
    }

    #[test]
    fn test_blank_tx_hash_falls_back_to_synthetic() {
        let id = derive_identity(Some("  "), "w1", "m1", Decimal::from(100), now());
        assert!(id.starts_with("syn:"));
    }

    #[test]
    fn test_timestamp_variants() {
        let secs = parse_timestamp(Some(&json!(1_700_000_000))).unwrap();
        let millis = parse_timestamp(Some(&json!(1_700_000_000_500i64))).unwrap();
        let string = parse_timestamp(Some(&json!("1700000000"))).unwrap();
        let rfc = parse_timestamp(Some(&json!("2023-11-14T22:13:20Z"))).unwrap();

        assert_eq!(secs.timestamp(), 1_700_000_000);
        assert_eq!(millis.timestamp(), 1_700_000_000);
        assert_eq!(string, secs);
        assert_eq!(rfc, secs);
        assert_eq!(parse_timestamp(Some(&json!(true))), None);
    }
}
