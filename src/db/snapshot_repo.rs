use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Truncate an instant to its hour bucket.
pub fn hour_bucket(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp() / 3600 * 3600, 0).unwrap_or(at)
}

/// Write one snapshot per market per hour. Same-bucket writes overwrite,
/// so repeated calls within the hour never inflate the average.
pub async fn record_snapshot(
    pool: &PgPool,
    market_id: &str,
    bucket: DateTime<Utc>,
    volume: Decimal,
    trade_count: i32,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO market_volume_snapshots (market_id, hour_bucket, volume, trade_count)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (market_id, hour_bucket) DO UPDATE
        SET volume = EXCLUDED.volume,
            trade_count = EXCLUDED.trade_count
        "#,
    )
    .bind(market_id)
    .bind(bucket)
    .bind(volume)
    .bind(trade_count)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mean of stored hourly snapshots over the trailing window. Zero means
/// "no baseline yet"; callers must not read it as literal zero volume.
pub async fn average_volume(
    pool: &PgPool,
    market_id: &str,
    hours: i64,
) -> anyhow::Result<Decimal> {
    let since = Utc::now() - Duration::hours(hours);
    let row: (Option<Decimal>,) = sqlx::query_as(
        "SELECT AVG(volume) FROM market_volume_snapshots WHERE market_id = $1 AND hour_bucket > $2",
    )
    .bind(market_id)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(row.0.unwrap_or(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_bucket_truncates() {
        let at = DateTime::from_timestamp(1_700_003_725, 0).unwrap();
        let bucket = hour_bucket(at);
        assert_eq!(bucket.timestamp() % 3600, 0);
        assert!(bucket <= at);
        assert!(at.timestamp() - bucket.timestamp() < 3600);
    }

    #[test]
    fn test_same_hour_maps_to_same_bucket() {
        let base = 1_700_000_400;
        let a = DateTime::from_timestamp(base, 0).unwrap();
        let b = DateTime::from_timestamp(base + 600, 0).unwrap();
        assert_eq!(hour_bucket(a), hour_bucket(b));
    }
}
