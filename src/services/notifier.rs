use rust_decimal::Decimal;
use serde_json::json;

use crate::models::{
    Alert, AlertKind, CoordinatedPayload, TrackedWalletPayload, VolumeSpikePayload, WhalePayload,
};

/// Telegram notification channel. Send failures are logged and never
/// block the pipeline; retry is this channel's own concern.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(http: reqwest::Client, bot_token: String, chat_id: String) -> Self {
        Self {
            http,
            bot_token,
            chat_id,
        }
    }

    /// Send one message. Failures are logged as warnings.
    pub async fn send(&self, message: &str) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);

        let body = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    tracing::warn!(
                        status = %resp.status(),
                        "Telegram sendMessage returned non-2xx"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send Telegram notification");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Alert formatting
// ---------------------------------------------------------------------------

fn short_wallet(wallet: &str) -> String {
    if wallet.len() > 10 {
        format!("{}...{}", &wallet[..6], &wallet[wallet.len() - 4..])
    } else {
        wallet.to_string()
    }
}

/// Render a stored alert for the notification channel.
pub fn format_alert(alert: &Alert) -> String {
    match AlertKind::from_str(&alert.kind) {
        Some(AlertKind::Whale) => {
            match serde_json::from_value::<WhalePayload>(alert.payload.clone()) {
                Ok(p) => format_whale(&alert.market_id, &p),
                Err(_) => fallback_format(alert),
            }
        }
        Some(AlertKind::Coordinated) => {
            match serde_json::from_value::<CoordinatedPayload>(alert.payload.clone()) {
                Ok(p) => format_coordinated(&alert.market_id, &p),
                Err(_) => fallback_format(alert),
            }
        }
        Some(AlertKind::TrackedWallet) => {
            match serde_json::from_value::<TrackedWalletPayload>(alert.payload.clone()) {
                Ok(p) => format_tracked(&alert.market_id, &p),
                Err(_) => fallback_format(alert),
            }
        }
        Some(AlertKind::VolumeSpike) => {
            match serde_json::from_value::<VolumeSpikePayload>(alert.payload.clone()) {
                Ok(p) => format_volume_spike(&alert.market_id, &p),
                Err(_) => fallback_format(alert),
            }
        }
        None => fallback_format(alert),
    }
}

fn fallback_format(alert: &Alert) -> String {
    format!("*Alert* ({})\nMarket: `{}`", alert.kind, alert.market_id)
}

pub fn format_whale(market_id: &str, p: &WhalePayload) -> String {
    let mut msg = format!(
        "*Whale Bet*\nMarket: `{}`\nWallet: `{}`\nSide: {}\nAmount: ${}",
        market_id,
        short_wallet(&p.wallet),
        p.side,
        p.amount.round_dp(2),
    );

    if p.wallet_total_bets > 0 && p.wallet_win_rate > Decimal::ZERO {
        msg.push_str(&format!(
            "\nWin Rate: ~{}% ({} bets)",
            p.wallet_win_rate.round_dp(0),
            p.wallet_total_bets,
        ));
    }

    msg.push_str(&format!(
        "\nEntry Score: {}/100 (size {}% of bankroll)",
        p.entry.score, p.entry.suggested_position_pct,
    ));

    if p.market_volume_24h > Decimal::ZERO {
        msg.push_str(&format!(
            "\n24h Volume: ${}",
            p.market_volume_24h.round_dp(0)
        ));
        // A bet this large relative to daily volume is itself a signal.
        if p.amount / p.market_volume_24h > Decimal::new(1, 1) {
            msg.push_str("\nThis bet is 10%+ of daily volume");
        }
    }

    for warning in &p.entry.warnings {
        msg.push_str(&format!("\nNote: {warning}"));
    }

    msg
}

pub fn format_coordinated(market_id: &str, p: &CoordinatedPayload) -> String {
    format!(
        "*Coordinated Activity*\nMarket: `{}`\nWallets: {}\nSide: {}\nTotal: ${}",
        market_id,
        p.wallet_count,
        p.side,
        p.total_amount.round_dp(2),
    )
}

pub fn format_tracked(market_id: &str, p: &TrackedWalletPayload) -> String {
    let who = match &p.nickname {
        Some(nick) => format!("{} (`{}`)", nick, short_wallet(&p.wallet)),
        None => format!("`{}`", short_wallet(&p.wallet)),
    };

    format!(
        "*Tracked Wallet*\n{}\nMarket: `{}`\nSide: {}\nAmount: ${}",
        who,
        market_id,
        p.side,
        p.amount.round_dp(2),
    )
}

pub fn format_volume_spike(market_id: &str, p: &VolumeSpikePayload) -> String {
    format!(
        "*Volume Spike*\nMarket: `{}`\nCurrent: ${} vs normal ${}\nSpike: {}x\n{}: {}% of volume ({} trades)",
        market_id,
        p.current_volume.round_dp(0),
        p.baseline_volume.round_dp(0),
        p.spike_ratio.round_dp(1),
        p.dominant_side,
        p.side_percentage.round_dp(0),
        p.trade_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::entry_quality::EntryScore;
    use crate::models::Side;

    #[test]
    fn test_short_wallet() {
        assert_eq!(short_wallet("0x1234567890abcdef"), "0x1234...cdef");
        assert_eq!(short_wallet("0xshort"), "0xshort");
    }

    #[test]
    fn test_format_whale_includes_score_and_warnings() {
        let payload = WhalePayload {
            wallet: "0x1234567890abcdef".into(),
            side: Side::Yes,
            amount: Decimal::from(150),
            price: None,
            wallet_win_rate: Decimal::from(65),
            wallet_total_bets: 12,
            market_volume_24h: Decimal::from(900),
            entry: EntryScore {
                score: 55,
                suggested_position_pct: Decimal::from(10),
                reasons: vec![],
                warnings: vec!["current odds unavailable".into()],
            },
        };

        let msg = format_whale("m1", &payload);
        assert!(msg.contains("55/100"));
        assert!(msg.contains("current odds unavailable"));
        assert!(msg.contains("10%+ of daily volume"));
    }
}
