use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Alert, NewAlert};

/// Persist an alert candidate. Returns None when the dedup key already
/// exists: the store-level guarantee that a given (kind, market, wallet,
/// amount, bucket) tuple alerts at most once.
pub async fn insert(pool: &PgPool, alert: &NewAlert) -> anyhow::Result<Option<Alert>> {
    let inserted = sqlx::query_as::<_, Alert>(
        r#"
        INSERT INTO alerts (kind, market_id, wallet, amount, payload, dedup_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (dedup_key) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(alert.kind.as_str())
    .bind(&alert.market_id)
    .bind(&alert.wallet)
    .bind(alert.amount)
    .bind(&alert.payload)
    .bind(&alert.dedup_key)
    .fetch_optional(pool)
    .await?;

    Ok(inserted)
}

/// Recent alerts, newest first, optionally filtered by kind.
pub async fn recent(
    pool: &PgPool,
    hours: i64,
    kind: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Alert>> {
    let since = Utc::now() - Duration::hours(hours);

    let alerts = match kind {
        Some(kind) => {
            sqlx::query_as::<_, Alert>(
                r#"
                SELECT * FROM alerts
                WHERE created_at > $1 AND kind = $2
                ORDER BY created_at DESC
                LIMIT $3
                "#,
            )
            .bind(since)
            .bind(kind)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Alert>(
                "SELECT * FROM alerts WHERE created_at > $1 ORDER BY created_at DESC LIMIT $2",
            )
            .bind(since)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(alerts)
}

/// Per-kind counts and tracked volume over the trailing window.
pub async fn stats(pool: &PgPool, hours: i64) -> anyhow::Result<Vec<(String, i64, Decimal)>> {
    let since = Utc::now() - Duration::hours(hours);
    let rows: Vec<(String, i64, Option<Decimal>)> = sqlx::query_as(
        r#"
        SELECT kind, COUNT(*), SUM(amount)
        FROM alerts
        WHERE created_at > $1
        GROUP BY kind
        ORDER BY kind
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(kind, count, volume)| (kind, count, volume.unwrap_or(Decimal::ZERO)))
        .collect())
}

/// Secondary whale defense: has this (market, wallet, amount) triple
/// already alerted within the trailing window? Catches re-deliveries
/// whose synthetic identity differs from the original's.
pub async fn whale_duplicate_exists(
    pool: &PgPool,
    market_id: &str,
    wallet: &str,
    amount: Decimal,
    window: Duration,
) -> anyhow::Result<bool> {
    let since = Utc::now() - window;
    let row: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM alerts
            WHERE kind = 'whale'
              AND market_id = $1
              AND wallet = $2
              AND amount = $3
              AND created_at > $4
        )
        "#,
    )
    .bind(market_id)
    .bind(wallet)
    .bind(amount)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Alerts not yet handed to the notification channel, oldest first.
pub async fn unnotified(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<Alert>> {
    let alerts = sqlx::query_as::<_, Alert>(
        "SELECT * FROM alerts WHERE notified_at IS NULL ORDER BY created_at ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(alerts)
}

/// Durably record that an alert was handed to the notification channel.
pub async fn mark_notified(pool: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE alerts SET notified_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Drop alerts past the retention window. Returns the number pruned.
pub async fn prune_older_than(pool: &PgPool, days: i64) -> anyhow::Result<u64> {
    let cutoff = Utc::now() - Duration::days(days);
    let result = sqlx::query("DELETE FROM alerts WHERE created_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
