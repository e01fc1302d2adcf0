use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use std::str::FromStr;

use crate::config::DetectorSettings;

#[derive(Debug, Clone, sqlx::FromRow)]
struct ConfigRow {
    key: String,
    value: String,
}

/// Load persisted runtime settings, merged over the given defaults.
/// Unknown keys and unparsable values are ignored; a bad row in the
/// table never prevents startup.
pub async fn load_settings(
    pool: &PgPool,
    defaults: DetectorSettings,
) -> anyhow::Result<DetectorSettings> {
    let rows = sqlx::query_as::<_, ConfigRow>("SELECT key, value FROM runtime_config")
        .fetch_all(pool)
        .await?;

    let map: HashMap<String, String> = rows.into_iter().map(|r| (r.key, r.value)).collect();

    let mut settings = defaults;
    if let Some(v) = map.get("whale_threshold").and_then(|v| Decimal::from_str(v).ok()) {
        settings.whale_threshold = v;
    }
    if let Some(v) = map.get("min_entry_score").and_then(|v| v.parse().ok()) {
        settings.min_entry_score = v;
    }
    if let Some(v) = map.get("min_coordinated_wallets").and_then(|v| v.parse().ok()) {
        settings.min_coordinated_wallets = v;
    }
    if let Some(v) = map
        .get("coordination_min_total")
        .and_then(|v| Decimal::from_str(v).ok())
    {
        settings.coordination_min_total = v;
    }
    if let Some(v) = map.get("coordination_window_secs").and_then(|v| v.parse().ok()) {
        settings.coordination_window_secs = v;
    }
    if let Some(v) = map.get("poll_interval_secs").and_then(|v| v.parse().ok()) {
        settings.poll_interval_secs = v;
    }

    Ok(settings)
}

/// Persist the full settings value so it survives restarts.
pub async fn save_settings(pool: &PgPool, settings: &DetectorSettings) -> anyhow::Result<()> {
    let entries = [
        ("whale_threshold", settings.whale_threshold.to_string()),
        ("min_entry_score", settings.min_entry_score.to_string()),
        (
            "min_coordinated_wallets",
            settings.min_coordinated_wallets.to_string(),
        ),
        (
            "coordination_min_total",
            settings.coordination_min_total.to_string(),
        ),
        (
            "coordination_window_secs",
            settings.coordination_window_secs.to_string(),
        ),
        ("poll_interval_secs", settings.poll_interval_secs.to_string()),
    ];

    for (key, value) in entries {
        sqlx::query(
            r#"
            INSERT INTO runtime_config (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
    }

    Ok(())
}
