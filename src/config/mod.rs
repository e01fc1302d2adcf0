use rust_decimal::Decimal;
use std::env;
use std::sync::{Arc, RwLock};

const DEFAULT_FEED_URL: &str = "https://api.predict.fun/v1";

/// Process-static configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub api_token: Option<String>,

    // Upstream feed
    pub feed_base_url: String,
    pub feed_api_key: Option<String>,

    // Telegram notification channel (optional)
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    // Alert retention / notification pacing
    pub alert_retention_days: i64,
    pub notify_pacing_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            api_token: env::var("API_TOKEN").ok(),

            feed_base_url: env::var("FEED_BASE_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.into()),
            feed_api_key: env::var("FEED_API_KEY").ok(),

            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok(),

            alert_retention_days: env::var("ALERT_RETENTION_DAYS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
            notify_pacing_ms: env::var("NOTIFY_PACING_MS")
                .unwrap_or_else(|_| "250".into())
                .parse()
                .unwrap_or(250),
        })
    }

    /// Returns true if both Telegram credentials are configured.
    pub fn has_telegram(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Runtime-adjustable detector settings
// ---------------------------------------------------------------------------

/// Detector parameters that can change at any time, not just at startup.
/// The monitor loop reads a fresh copy at the top of each iteration, so an
/// update takes effect on the next cycle, never mid-batch.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DetectorSettings {
    /// Alert on single bets at or above this amount.
    pub whale_threshold: Decimal,
    /// Reject whale candidates scoring below this entry-quality floor.
    pub min_entry_score: i32,
    /// Minimum distinct wallets for a coordination alert.
    pub min_coordinated_wallets: u32,
    /// Minimum combined amount for a coordination alert.
    pub coordination_min_total: Decimal,
    /// Trailing window for coordination grouping, measured from now.
    pub coordination_window_secs: i64,
    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            whale_threshold: Decimal::from(100),
            min_entry_score: 35,
            min_coordinated_wallets: 5,
            coordination_min_total: Decimal::from(500),
            coordination_window_secs: 300,
            poll_interval_secs: 30,
        }
    }
}

impl DetectorSettings {
    /// Validate a settings update at the boundary. Either every field is
    /// acceptable and the whole value is returned, or the update is
    /// rejected with a plain message, never applied partially.
    pub fn validated(self) -> Result<Self, String> {
        if self.whale_threshold < Decimal::ONE || self.whale_threshold > Decimal::from(100_000) {
            return Err("whale threshold must be between $1 and $100,000".into());
        }
        if !(2..=20).contains(&self.min_coordinated_wallets) {
            return Err("min coordinated wallets must be between 2 and 20".into());
        }
        if self.coordination_min_total < Decimal::ZERO {
            return Err("coordination total floor must not be negative".into());
        }
        if !(30..=3_600).contains(&self.coordination_window_secs) {
            return Err("coordination window must be between 30 and 3600 seconds".into());
        }
        if !(0..=100).contains(&self.min_entry_score) {
            return Err("min entry score must be between 0 and 100".into());
        }
        if !(5..=3_600).contains(&self.poll_interval_secs) {
            return Err("poll interval must be between 5 and 3600 seconds".into());
        }
        Ok(self)
    }
}

/// Shared handle for the runtime settings. Writers hold the lock only long
/// enough to swap the value; readers clone out a snapshot.
pub type SharedSettings = Arc<RwLock<DetectorSettings>>;

pub fn shared_settings(initial: DetectorSettings) -> SharedSettings {
    Arc::new(RwLock::new(initial))
}

/// Snapshot the current settings without holding the lock across awaits.
pub fn snapshot(settings: &SharedSettings) -> DetectorSettings {
    settings.read().expect("settings lock poisoned").clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DetectorSettings::default().validated().is_ok());
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let mut s = DetectorSettings::default();
        s.whale_threshold = Decimal::ZERO;
        assert!(s.clone().validated().is_err());

        s.whale_threshold = Decimal::from(200_000);
        assert!(s.validated().is_err());
    }

    #[test]
    fn test_coordination_bounds() {
        let mut s = DetectorSettings::default();
        s.min_coordinated_wallets = 1;
        assert!(s.clone().validated().is_err());

        s.min_coordinated_wallets = 21;
        assert!(s.clone().validated().is_err());

        s.min_coordinated_wallets = 2;
        assert!(s.validated().is_ok());
    }
}
