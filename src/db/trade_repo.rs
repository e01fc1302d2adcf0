use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::intelligence::win_rate::{estimate_win_rate, SettlementRecord};
use crate::models::{Trade, WalletStats};

/// Admit a trade into the durable ledger. Returns true iff the identity
/// was newly seen; the primary-key conflict IS the dedup check, so a
/// re-delivered record is rejected here across restarts.
pub async fn admit(pool: &PgPool, trade: &Trade) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO trades (identity, market_id, wallet, side, amount, price, executed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (identity) DO NOTHING
        "#,
    )
    .bind(&trade.identity)
    .bind(&trade.market_id)
    .bind(&trade.wallet)
    .bind(trade.side.as_str())
    .bind(trade.amount)
    .bind(trade.price)
    .bind(trade.executed_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Recompute a wallet's rolling aggregate from the trade ledger, with the
/// settlement ledger folded in when it has data.
pub async fn wallet_stats(pool: &PgPool, wallet: &str) -> anyhow::Result<WalletStats> {
    let row: (i64, Option<Decimal>) = sqlx::query_as(
        "SELECT COUNT(*), SUM(amount) FROM trades WHERE wallet = $1",
    )
    .bind(wallet)
    .fetch_one(pool)
    .await?;

    let settlement: Option<(i64, i64)> = sqlx::query_as(
        "SELECT wins, losses FROM wallet_settlements WHERE wallet = $1",
    )
    .bind(wallet)
    .fetch_optional(pool)
    .await?;

    let total_volume = row.1.unwrap_or(Decimal::ZERO);
    let record = settlement.map(|(wins, losses)| SettlementRecord { wins, losses });

    Ok(WalletStats {
        wallet: wallet.to_string(),
        total_bets: row.0,
        total_volume,
        wins: record.map(|r| r.wins).unwrap_or(0),
        losses: record.map(|r| r.losses).unwrap_or(0),
        estimated_win_rate: estimate_win_rate(total_volume, record.as_ref()),
    })
}

/// Trailing 24h volume and trade count for one market.
pub async fn market_activity_24h(
    pool: &PgPool,
    market_id: &str,
) -> anyhow::Result<(Decimal, i64)> {
    let since = Utc::now() - Duration::hours(24);
    let row: (Option<Decimal>, i64) = sqlx::query_as(
        "SELECT SUM(amount), COUNT(*) FROM trades WHERE market_id = $1 AND executed_at > $2",
    )
    .bind(market_id)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok((row.0.unwrap_or(Decimal::ZERO), row.1))
}

/// Per-side activity breakdown for the market summary view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SideActivity {
    pub side: String,
    pub trades: i64,
    pub volume: Decimal,
    pub unique_wallets: i64,
    pub whale_trades: i64,
    pub whale_volume: Decimal,
}

pub async fn market_summary(
    pool: &PgPool,
    market_id: &str,
    since: DateTime<Utc>,
    whale_threshold: Decimal,
) -> anyhow::Result<Vec<SideActivity>> {
    let rows: Vec<(String, i64, Option<Decimal>, i64, i64, Option<Decimal>)> = sqlx::query_as(
        r#"
        SELECT side,
               COUNT(*),
               SUM(amount),
               COUNT(DISTINCT wallet),
               COUNT(*) FILTER (WHERE amount >= $3),
               SUM(amount) FILTER (WHERE amount >= $3)
        FROM trades
        WHERE market_id = $1 AND executed_at > $2
        GROUP BY side
        ORDER BY side
        "#,
    )
    .bind(market_id)
    .bind(since)
    .bind(whale_threshold)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(side, trades, volume, wallets, whale_trades, whale_volume)| SideActivity {
            side,
            trades,
            volume: volume.unwrap_or(Decimal::ZERO),
            unique_wallets: wallets,
            whale_trades,
            whale_volume: whale_volume.unwrap_or(Decimal::ZERO),
        })
        .collect())
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WalletLeader {
    pub wallet: String,
    pub bet_count: i64,
    pub total_volume: Decimal,
    pub last_bet_at: DateTime<Utc>,
    pub estimated_win_rate: Decimal,
}

/// Top wallets by total volume, for the control surface.
pub async fn top_wallets(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<WalletLeader>> {
    let rows: Vec<(String, i64, Decimal, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT wallet, COUNT(*), SUM(amount), MAX(executed_at)
        FROM trades
        GROUP BY wallet
        HAVING SUM(amount) > 100
        ORDER BY SUM(amount) DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(wallet, bet_count, total_volume, last_bet_at)| WalletLeader {
            wallet,
            bet_count,
            total_volume,
            last_bet_at,
            estimated_win_rate: estimate_win_rate(total_volume, None),
        })
        .collect())
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ActiveMarket {
    pub market_id: String,
    pub trades: i64,
    pub volume: Decimal,
    pub last_activity: DateTime<Utc>,
}

/// Markets with the most activity in the trailing 24h.
pub async fn active_markets(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<ActiveMarket>> {
    let since = Utc::now() - Duration::hours(24);
    let rows: Vec<(String, i64, Decimal, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT market_id, COUNT(*), SUM(amount), MAX(executed_at)
        FROM trades
        WHERE executed_at > $1
        GROUP BY market_id
        ORDER BY SUM(amount) DESC
        LIMIT $2
        "#,
    )
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(market_id, trades, volume, last_activity)| ActiveMarket {
            market_id,
            trades,
            volume,
            last_activity,
        })
        .collect())
}
