use sqlx::PgPool;

use crate::models::TrackedWallet;

/// Register a wallet to follow, or update its nickname.
pub async fn track(
    pool: &PgPool,
    wallet: &str,
    nickname: Option<&str>,
) -> anyhow::Result<TrackedWallet> {
    let row = sqlx::query_as::<_, TrackedWallet>(
        r#"
        INSERT INTO tracked_wallets (wallet, nickname)
        VALUES ($1, $2)
        ON CONFLICT (wallet) DO UPDATE SET nickname = EXCLUDED.nickname
        RETURNING *
        "#,
    )
    .bind(wallet)
    .bind(nickname)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Stop tracking. Returns false if the wallet wasn't tracked.
pub async fn untrack(pool: &PgPool, wallet: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM tracked_wallets WHERE wallet = $1")
        .bind(wallet)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn list(pool: &PgPool) -> anyhow::Result<Vec<TrackedWallet>> {
    let rows = sqlx::query_as::<_, TrackedWallet>(
        "SELECT * FROM tracked_wallets ORDER BY added_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
