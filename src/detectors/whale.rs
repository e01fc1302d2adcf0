use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::DetectorSettings;
use crate::intelligence::entry_quality::{score_entry, EntryInputs, EntryScore};
use crate::models::{MarketContext, Side, Trade, WalletStats, WhalePayload};

/// Outcome of evaluating one trade against the whale gates. The identity
/// and secondary (market, wallet, amount) dedup checks live with the
/// alert store; this covers the pure gates.
#[derive(Debug, Clone)]
pub enum WhaleVerdict {
    BelowThreshold,
    LowQuality(EntryScore),
    Qualified(WhalePayload),
}

/// Threshold gate → entry-quality score → quality-floor gate.
pub fn evaluate(
    trade: &Trade,
    stats: &WalletStats,
    market: &MarketContext,
    settings: &DetectorSettings,
    now: DateTime<Utc>,
) -> WhaleVerdict {
    if trade.amount < settings.whale_threshold {
        return WhaleVerdict::BelowThreshold;
    }

    let entry = score_entry(&EntryInputs {
        amount: trade.amount,
        win_rate: stats.estimated_win_rate,
        entry_price: side_entry_price(trade.side, market),
        market_volume_24h: Some(market.volume_24h),
        days_to_resolution: market
            .meta
            .as_ref()
            .and_then(|m| m.end_date)
            .map(|end| (end - now).num_days()),
    });

    if entry.score < settings.min_entry_score {
        return WhaleVerdict::LowQuality(entry);
    }

    WhaleVerdict::Qualified(WhalePayload {
        wallet: trade.wallet.clone(),
        side: trade.side,
        amount: trade.amount,
        price: trade.price,
        wallet_win_rate: stats.estimated_win_rate,
        wallet_total_bets: stats.total_bets,
        market_volume_24h: market.volume_24h,
        entry,
    })
}

/// Implied probability of the side actually being bet: the Yes price for
/// a Yes bet, its complement for a No bet. Unknown sides carry no usable
/// entry price.
fn side_entry_price(side: Side, market: &MarketContext) -> Option<Decimal> {
    let yes_price = market.meta.as_ref().and_then(|m| m.yes_price)?;
    match side {
        Side::Yes => Some(yes_price),
        Side::No => Some(Decimal::ONE - yes_price),
        Side::Unknown => None,
    }
}
