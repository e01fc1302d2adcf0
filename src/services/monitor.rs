use chrono::Utc;
use metrics::{counter, histogram};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;
use uuid::Uuid;

use crate::config::{self, DetectorSettings, SharedSettings};
use crate::db::{alert_repo, snapshot_repo, tracked_repo, trade_repo};
use crate::detectors::{coordination, tracked, volume_spike, whale};
use crate::feed::{normalize, FeedClient};
use crate::intelligence::resolution::{self, ResolutionSpeed};
use crate::models::{MarketContext, NewAlert, Trade};
use crate::services::notifier::{format_alert, Notifier};

/// Window for the secondary whale defense against imperfect identities.
const WHALE_SECONDARY_WINDOW_SECS: u64 = 3_600;

/// Trailing window (hours) for the spike baseline.
const SPIKE_BASELINE_HOURS: i64 = 24;

/// Cap on the in-memory identity fast path. Overflow clears the cache;
/// correctness falls through to the durable ledger.
const IDENTITY_CACHE_MAX: usize = 50_000;

/// Max alerts handed to the notification channel per cycle.
const DISPATCH_BATCH: i64 = 50;

/// Retention prune cadence, in cycles.
const PRUNE_EVERY_CYCLES: u64 = 120;

/// The single logical worker: poll → normalize → dedup → aggregate →
/// detect → score → store → notify, fully ordered within a batch. All
/// in-memory state here is a best-effort accelerator over the durable
/// stores and survives being dropped at any restart.
pub struct Monitor {
    pool: PgPool,
    feed: FeedClient,
    settings: SharedSettings,
    pause_flag: Arc<AtomicBool>,
    notifier: Option<Arc<Notifier>>,
    retention_days: i64,
    pacing: Duration,

    recent_identities: HashSet<String>,
    whale_recent: HashMap<String, Instant>,
    sent_cache: HashSet<Uuid>,
    cycles: u64,
}

impl Monitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        feed: FeedClient,
        settings: SharedSettings,
        pause_flag: Arc<AtomicBool>,
        notifier: Option<Arc<Notifier>>,
        retention_days: i64,
        pacing: Duration,
    ) -> Self {
        Self {
            pool,
            feed,
            settings,
            pause_flag,
            notifier,
            retention_days,
            pacing,
            recent_identities: HashSet::new(),
            whale_recent: HashMap::new(),
            sent_cache: HashSet::new(),
            cycles: 0,
        }
    }

    /// Run until the shutdown signal fires. The signal is only observed
    /// at the sleep point, never mid-batch.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Monitor loop started");

        loop {
            let interval_secs = config::snapshot(&self.settings).poll_interval_secs;

            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("Monitor loop shutting down");
                    break;
                }
                _ = sleep(Duration::from_secs(interval_secs)) => {}
            }

            // Pause takes effect at the top of an iteration, not mid-batch.
            if self.pause_flag.load(Ordering::Relaxed) {
                continue;
            }

            // Fresh snapshot each iteration: a settings update during the
            // sleep applies to this batch, never mid-batch.
            let settings = config::snapshot(&self.settings);

            self.cycles += 1;
            let started = Instant::now();
            self.cycle(&settings).await;
            histogram!("cycle_latency_seconds").record(started.elapsed().as_secs_f64());

            if self.cycles % PRUNE_EVERY_CYCLES == 0 {
                match alert_repo::prune_older_than(&self.pool, self.retention_days).await {
                    Ok(0) => {}
                    Ok(pruned) => tracing::info!(pruned, "Pruned expired alerts"),
                    Err(e) => tracing::warn!(error = %e, "Alert retention prune failed"),
                }
            }
        }
    }

    async fn cycle(&mut self, settings: &DetectorSettings) {
        let batch = self.ingest().await;

        if !batch.is_empty() {
            tracing::info!(
                new_trades = batch.len(),
                threshold = %settings.whale_threshold,
                "Processing batch"
            );
            self.process_batch(&batch, settings).await;
        }

        // Dispatch runs every cycle so failed mark-as-sent writes and
        // backlogged alerts are retried even on empty batches.
        self.dispatch_pending().await;
    }

    // -----------------------------------------------------------------
    // Ingestion: poll, normalize, durable admit
    // -----------------------------------------------------------------

    async fn ingest(&mut self) -> Vec<Trade> {
        let now = Utc::now();

        let raw = match self.feed.recent_fills().await {
            Ok(items) => items,
            Err(e) => {
                // Transport errors mean "zero new trades this cycle".
                tracing::warn!(error = %e, "Feed poll failed; retrying next cycle");
                counter!("feed_poll_errors_total").increment(1);
                return Vec::new();
            }
        };

        let mut batch = Vec::new();
        let mut malformed = 0u32;
        let mut duplicates = 0u32;
        let mut synthetic = 0u32;

        for record in &raw {
            let trade = match normalize(record, now) {
                Ok(t) => t,
                Err(e) => {
                    // One bad record never aborts the batch.
                    tracing::debug!(error = %e, "Skipping malformed feed record");
                    malformed += 1;
                    continue;
                }
            };

            if trade.has_synthetic_identity() {
                synthetic += 1;
            }

            // Fast path; the durable ledger remains the source of truth.
            if self.recent_identities.contains(&trade.identity) {
                duplicates += 1;
                continue;
            }

            match trade_repo::admit(&self.pool, &trade).await {
                Ok(true) => {
                    self.cache_identity(trade.identity.clone());
                    batch.push(trade);
                }
                Ok(false) => {
                    self.cache_identity(trade.identity.clone());
                    duplicates += 1;
                }
                Err(e) => {
                    // Persistence failure is non-fatal for this record;
                    // uncached, so the next delivery retries the insert.
                    tracing::error!(error = %e, identity = %trade.identity, "Trade admit failed");
                }
            }
        }

        counter!("trades_ingested_total").increment(batch.len() as u64);
        counter!("trades_duplicate_total").increment(duplicates as u64);
        counter!("records_malformed_total").increment(malformed as u64);

        if malformed > 0 || synthetic > 0 {
            tracing::debug!(
                malformed,
                synthetic,
                "Batch normalization degradations"
            );
        }

        batch
    }

    fn cache_identity(&mut self, identity: String) {
        if self.recent_identities.len() >= IDENTITY_CACHE_MAX {
            self.recent_identities.clear();
        }
        self.recent_identities.insert(identity);
    }

    // -----------------------------------------------------------------
    // Detection
    // -----------------------------------------------------------------

    async fn process_batch(&mut self, batch: &[Trade], settings: &DetectorSettings) {
        let now = Utc::now();
        let contexts = self.market_contexts(batch).await;
        let bucket = now.timestamp() / 3600;

        let mut candidates: Vec<NewAlert> = Vec::new();

        // Each detector is isolated: an error inside one is logged and
        // must never suppress the others.
        match self.detect_whales(batch, &contexts, settings, now, bucket).await {
            Ok(mut alerts) => candidates.append(&mut alerts),
            Err(e) => tracing::error!(error = %e, "Whale detector failed"),
        }

        match self.detect_coordination(batch, &contexts, settings, now, bucket) {
            Ok(mut alerts) => candidates.append(&mut alerts),
            Err(e) => tracing::error!(error = %e, "Coordination detector failed"),
        }

        match self.detect_tracked(batch).await {
            Ok(mut alerts) => candidates.append(&mut alerts),
            Err(e) => tracing::error!(error = %e, "Tracked-wallet detector failed"),
        }

        match self.detect_volume_spikes(batch, &contexts, now, bucket).await {
            Ok(mut alerts) => candidates.append(&mut alerts),
            Err(e) => tracing::error!(error = %e, "Volume-spike detector failed"),
        }

        let mut stored = 0u32;
        for candidate in &candidates {
            match alert_repo::insert(&self.pool, candidate).await {
                Ok(Some(alert)) => {
                    stored += 1;
                    counter!("alerts_emitted_total", "kind" => alert.kind.clone()).increment(1);
                    tracing::info!(
                        kind = %alert.kind,
                        market = %alert.market_id,
                        "Alert stored"
                    );
                }
                Ok(None) => {
                    tracing::debug!(
                        dedup_key = %candidate.dedup_key,
                        "Alert suppressed by dedup key"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        dedup_key = %candidate.dedup_key,
                        "Alert persist failed"
                    );
                }
            }
        }

        if stored > 0 {
            tracing::info!(alerts = stored, "Batch produced alerts");
        }
    }

    /// Assemble per-market context once per batch: 24h ledger activity,
    /// snapshot baseline, and best-effort venue metadata.
    async fn market_contexts(&self, batch: &[Trade]) -> HashMap<String, MarketContext> {
        let markets: HashSet<&str> = batch.iter().map(|t| t.market_id.as_str()).collect();

        let mut contexts = HashMap::new();
        for market_id in markets {
            let mut ctx = MarketContext::empty(market_id);

            match trade_repo::market_activity_24h(&self.pool, market_id).await {
                Ok((volume, count)) => {
                    ctx.volume_24h = volume;
                    ctx.trade_count_24h = count;
                }
                Err(e) => {
                    tracing::warn!(error = %e, market = %market_id, "Market activity query failed");
                }
            }

            match snapshot_repo::average_volume(&self.pool, market_id, SPIKE_BASELINE_HOURS).await {
                Ok(avg) => ctx.baseline_volume = avg,
                Err(e) => {
                    tracing::warn!(error = %e, market = %market_id, "Baseline query failed");
                }
            }

            ctx.meta = self.feed.market_detail(market_id).await;

            contexts.insert(market_id.to_string(), ctx);
        }

        contexts
    }

    async fn detect_whales(
        &mut self,
        batch: &[Trade],
        contexts: &HashMap<String, MarketContext>,
        settings: &DetectorSettings,
        now: chrono::DateTime<Utc>,
        bucket: i64,
    ) -> anyhow::Result<Vec<NewAlert>> {
        self.prune_whale_recent();

        let mut alerts = Vec::new();
        for trade in batch {
            if trade.amount < settings.whale_threshold {
                continue;
            }

            // Secondary defense for imperfect identities: the same
            // (market, wallet, amount) triple alerts at most once per hour
            // even when the primary identity differs.
            let key = format!("{}|{}|{}", trade.market_id, trade.wallet, trade.amount);
            if self.whale_recent.contains_key(&key) {
                continue;
            }
            let duplicate = alert_repo::whale_duplicate_exists(
                &self.pool,
                &trade.market_id,
                &trade.wallet,
                trade.amount,
                chrono::Duration::seconds(WHALE_SECONDARY_WINDOW_SECS as i64),
            )
            .await
            .unwrap_or(false);
            if duplicate {
                self.whale_recent.insert(key, Instant::now());
                continue;
            }

            let stats = match trade_repo::wallet_stats(&self.pool, &trade.wallet).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, wallet = %trade.wallet, "Wallet stats failed");
                    continue;
                }
            };

            let fallback;
            let ctx = match contexts.get(&trade.market_id) {
                Some(c) => c,
                None => {
                    fallback = MarketContext::empty(&trade.market_id);
                    &fallback
                }
            };

            match whale::evaluate(trade, &stats, ctx, settings, now) {
                whale::WhaleVerdict::Qualified(payload) => {
                    tracing::info!(
                        wallet = %trade.wallet,
                        market = %trade.market_id,
                        amount = %trade.amount,
                        score = payload.entry.score,
                        "Whale bet detected"
                    );
                    self.whale_recent.insert(key, Instant::now());
                    alerts.push(NewAlert::whale(&trade.market_id, &payload, bucket));
                }
                whale::WhaleVerdict::LowQuality(entry) => {
                    tracing::debug!(
                        wallet = %trade.wallet,
                        market = %trade.market_id,
                        score = entry.score,
                        "Whale candidate below quality floor"
                    );
                }
                whale::WhaleVerdict::BelowThreshold => {}
            }
        }

        Ok(alerts)
    }

    fn prune_whale_recent(&mut self) {
        let window = Duration::from_secs(WHALE_SECONDARY_WINDOW_SECS);
        self.whale_recent.retain(|_, seen| seen.elapsed() < window);
    }

    fn detect_coordination(
        &self,
        batch: &[Trade],
        contexts: &HashMap<String, MarketContext>,
        settings: &DetectorSettings,
        now: chrono::DateTime<Utc>,
        bucket: i64,
    ) -> anyhow::Result<Vec<NewAlert>> {
        let speeds: HashMap<String, ResolutionSpeed> = contexts
            .iter()
            .map(|(id, ctx)| (id.clone(), resolution::judge(ctx.meta.as_ref(), now)))
            .collect();

        let alerts = coordination::detect(batch, now, settings, &speeds)
            .into_iter()
            .map(|(market_id, payload)| {
                tracing::info!(
                    market = %market_id,
                    side = %payload.side,
                    wallets = payload.wallet_count,
                    total = %payload.total_amount,
                    "Coordinated betting detected"
                );
                NewAlert::coordinated(&market_id, &payload, bucket)
            })
            .collect();

        Ok(alerts)
    }

    async fn detect_tracked(&self, batch: &[Trade]) -> anyhow::Result<Vec<NewAlert>> {
        let registered = tracked_repo::list(&self.pool).await?;
        if registered.is_empty() {
            return Ok(Vec::new());
        }

        let tracked_set: HashMap<String, Option<String>> = registered
            .into_iter()
            .map(|w| (w.wallet, w.nickname))
            .collect();

        let alerts = tracked::detect(batch, &tracked_set)
            .into_iter()
            .map(|(market_id, payload)| {
                tracing::info!(
                    wallet = %payload.wallet,
                    market = %market_id,
                    "Tracked wallet activity"
                );
                NewAlert::tracked_wallet(&market_id, &payload)
            })
            .collect();

        Ok(alerts)
    }

    async fn detect_volume_spikes(
        &self,
        batch: &[Trade],
        contexts: &HashMap<String, MarketContext>,
        now: chrono::DateTime<Utc>,
        bucket: i64,
    ) -> anyhow::Result<Vec<NewAlert>> {
        let aggregates = volume_spike::aggregate(batch);
        let baselines: HashMap<String, rust_decimal::Decimal> = contexts
            .iter()
            .map(|(id, ctx)| (id.clone(), ctx.baseline_volume))
            .collect();

        // Baselines were read before this cycle's snapshots land, so a
        // market never spikes against its own current batch.
        let alerts: Vec<NewAlert> = volume_spike::detect(&aggregates, &baselines)
            .into_iter()
            .map(|(market_id, payload)| {
                tracing::info!(
                    market = %market_id,
                    ratio = %payload.spike_ratio,
                    "Volume spike detected"
                );
                NewAlert::volume_spike(&market_id, &payload, bucket)
            })
            .collect();

        let hour = snapshot_repo::hour_bucket(now);
        for (market_id, agg) in &aggregates {
            if let Err(e) = snapshot_repo::record_snapshot(
                &self.pool,
                market_id,
                hour,
                agg.volume,
                agg.trade_count as i32,
            )
            .await
            {
                tracing::warn!(error = %e, market = %market_id, "Snapshot write failed");
            }
        }

        Ok(alerts)
    }

    // -----------------------------------------------------------------
    // Notification gate
    // -----------------------------------------------------------------

    /// Hand stored-but-unnotified alerts to the notification channel,
    /// oldest first, with a pacing delay between sends. The durable
    /// `notified_at` mark is the at-most-once guarantee; the in-memory
    /// sent set only papers over the window between send and mark, and is
    /// rolled back when the mark fails so the alert is retried, not lost.
    async fn dispatch_pending(&mut self) {
        let pending = match alert_repo::unnotified(&self.pool, DISPATCH_BATCH).await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::warn!(error = %e, "Unnotified alert query failed");
                return;
            }
        };

        for alert in pending {
            if self.sent_cache.contains(&alert.id) {
                continue;
            }

            if let Some(notifier) = &self.notifier {
                notifier.send(&format_alert(&alert)).await;
                sleep(self.pacing).await;
            }

            self.sent_cache.insert(alert.id);
            match alert_repo::mark_notified(&self.pool, alert.id).await {
                Ok(()) => {
                    counter!("alerts_notified_total").increment(1);
                }
                Err(e) => {
                    // Roll back the in-memory entry so the next cycle
                    // retries instead of silently losing the alert.
                    self.sent_cache.remove(&alert.id);
                    tracing::error!(error = %e, alert_id = %alert.id, "Mark-notified failed");
                }
            }
        }

        if self.sent_cache.len() > IDENTITY_CACHE_MAX {
            self.sent_cache.clear();
        }
    }
}
