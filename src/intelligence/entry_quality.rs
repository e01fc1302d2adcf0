use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inputs to the entry-quality score. `None` means the signal was
/// unavailable (e.g. no metadata for the market); the scorer records a
/// warning for it instead of silently scoring the factor neutral.
#[derive(Debug, Clone, Default)]
pub struct EntryInputs {
    /// Bet size in currency units.
    pub amount: Decimal,
    /// Wallet win rate as a percentage in [0, 100].
    pub win_rate: Decimal,
    /// Implied probability of the side being bet, in [0, 1].
    pub entry_price: Option<Decimal>,
    /// Market 24h volume in currency units.
    pub market_volume_24h: Option<Decimal>,
    /// Days until the market resolves.
    pub days_to_resolution: Option<i64>,
}

/// Deterministic 0–100 confidence score for a whale entry, with the
/// factor-by-factor reasons, the warnings for unavailable inputs, and a
/// discrete position-sizing recommendation (percent of bankroll).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryScore {
    pub score: i32,
    pub suggested_position_pct: Decimal,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
}

// Ordered tier tables: first row whose threshold the input meets wins.
// Tuned here, not in detector control flow.

/// (min amount, contribution)
const BET_SIZE_TIERS: &[(i64, i32)] = &[(1_000, 25), (500, 20), (200, 15), (100, 10)];
const BET_SIZE_FLOOR: i32 = 5;

/// (min win-rate pct, contribution)
const WIN_RATE_TIERS: &[(i64, i32)] = &[(80, 25), (70, 20), (60, 10)];

/// (max implied probability exclusive as pct, contribution); probabilities
/// at or above the last threshold take the overpriced penalty.
const ENTRY_PRICE_TIERS: &[(i64, i32)] = &[(40, 25), (55, 15), (65, 5), (75, 0)];
const ENTRY_PRICE_PENALTY: i32 = -20;

/// (min 24h volume, contribution)
const LIQUIDITY_TIERS: &[(i64, i32)] = &[(20_000, 15), (10_000, 10), (5_000, 5), (2_000, 0)];
const LIQUIDITY_PENALTY: i32 = -10;

/// (max days inclusive, contribution)
const RESOLUTION_TIERS: &[(i64, i32)] = &[(1, 10), (3, 5), (14, 0)];
const RESOLUTION_PENALTY: i32 = -5;

/// (min score, percent of bankroll)
const POSITION_SIZE_TIERS: &[(i32, i64)] = &[(80, 30), (65, 20), (50, 10), (35, 5)];

/// Score a whale entry. Pure and side-effect-free: identical inputs always
/// produce identical score, reasons, and warnings.
pub fn score_entry(inputs: &EntryInputs) -> EntryScore {
    let mut score: i32 = 0;
    let mut reasons = Vec::new();
    let mut warnings = Vec::new();

    // Factor 1: bet size
    let size_pts = BET_SIZE_TIERS
        .iter()
        .find(|(min, _)| inputs.amount >= Decimal::from(*min))
        .map(|(_, pts)| *pts)
        .unwrap_or(BET_SIZE_FLOOR);
    score += size_pts;
    reasons.push(format!("bet size ${}: {:+}", inputs.amount.round_dp(2), size_pts));

    // Factor 2: wallet win rate
    let wr_pts = WIN_RATE_TIERS
        .iter()
        .find(|(min, _)| inputs.win_rate >= Decimal::from(*min))
        .map(|(_, pts)| *pts)
        .unwrap_or(0);
    score += wr_pts;
    reasons.push(format!("win rate {}%: {:+}", inputs.win_rate.round_dp(0), wr_pts));

    // Factor 3: entry price relative to the side bet
    match inputs.entry_price {
        Some(price) => {
            let pct = price * Decimal::ONE_HUNDRED;
            let price_pts = ENTRY_PRICE_TIERS
                .iter()
                .find(|(max, _)| pct < Decimal::from(*max))
                .map(|(_, pts)| *pts)
                .unwrap_or(ENTRY_PRICE_PENALTY);
            score += price_pts;
            reasons.push(format!("entry at {}% implied: {:+}", pct.round_dp(0), price_pts));
        }
        None => warnings.push("current odds unavailable".to_string()),
    }

    // Factor 4: market liquidity
    match inputs.market_volume_24h {
        Some(volume) => {
            let liq_pts = LIQUIDITY_TIERS
                .iter()
                .find(|(min, _)| volume >= Decimal::from(*min))
                .map(|(_, pts)| *pts)
                .unwrap_or(LIQUIDITY_PENALTY);
            score += liq_pts;
            reasons.push(format!("24h volume ${}: {:+}", volume.round_dp(0), liq_pts));
        }
        None => warnings.push("market liquidity unavailable".to_string()),
    }

    // Factor 5: time to resolution
    match inputs.days_to_resolution {
        Some(days) => {
            let res_pts = RESOLUTION_TIERS
                .iter()
                .find(|(max, _)| days <= *max)
                .map(|(_, pts)| *pts)
                .unwrap_or(RESOLUTION_PENALTY);
            score += res_pts;
            reasons.push(format!("resolves in {days}d: {res_pts:+}"));
        }
        None => warnings.push("resolution date unavailable".to_string()),
    }

    let score = score.clamp(0, 100);

    let suggested_position_pct = POSITION_SIZE_TIERS
        .iter()
        .find(|(min, _)| score >= *min)
        .map(|(_, pct)| Decimal::from(*pct))
        .unwrap_or(Decimal::ZERO);

    EntryScore {
        score,
        suggested_position_pct,
        reasons,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn best_inputs() -> EntryInputs {
        EntryInputs {
            amount: Decimal::from(1_500),
            win_rate: Decimal::from(85),
            entry_price: Some(Decimal::new(30, 2)),
            market_volume_24h: Some(Decimal::from(25_000)),
            days_to_resolution: Some(1),
        }
    }

    fn worst_inputs() -> EntryInputs {
        EntryInputs {
            amount: Decimal::from(50),
            win_rate: Decimal::ZERO,
            entry_price: Some(Decimal::new(90, 2)),
            market_volume_24h: Some(Decimal::from(100)),
            days_to_resolution: Some(60),
        }
    }

    #[test]
    fn test_best_case_hits_exactly_100() {
        let result = score_entry(&best_inputs());
        assert_eq!(result.score, 100);
        assert_eq!(result.suggested_position_pct, Decimal::from(30));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_worst_case_clamps_to_zero() {
        // 5 + 0 - 20 - 10 - 5 = -30 → clamped
        let result = score_entry(&worst_inputs());
        assert_eq!(result.score, 0);
        assert_eq!(result.suggested_position_pct, Decimal::ZERO);
    }

    #[test]
    fn test_score_always_within_bounds() {
        let amounts = [0i64, 99, 100, 500, 10_000];
        let rates = [0i64, 59, 60, 79, 95];
        let prices = [None, Some(Decimal::new(10, 2)), Some(Decimal::new(99, 2))];
        let volumes = [None, Some(Decimal::ZERO), Some(Decimal::from(50_000))];
        let days = [None, Some(0), Some(7), Some(365)];

        for a in amounts {
            for r in rates {
                for p in &prices {
                    for v in &volumes {
                        for d in days {
                            let result = score_entry(&EntryInputs {
                                amount: Decimal::from(a),
                                win_rate: Decimal::from(r),
                                entry_price: *p,
                                market_volume_24h: *v,
                                days_to_resolution: d,
                            });
                            assert!(
                                (0..=100).contains(&result.score),
                                "score {} out of bounds",
                                result.score
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let inputs = EntryInputs {
            amount: Decimal::from(350),
            win_rate: Decimal::from(72),
            entry_price: Some(Decimal::new(45, 2)),
            market_volume_24h: Some(Decimal::from(8_000)),
            days_to_resolution: Some(5),
        };

        let first = score_entry(&inputs);
        for _ in 0..10 {
            let again = score_entry(&inputs);
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_missing_inputs_become_warnings_not_neutral_scores() {
        let result = score_entry(&EntryInputs {
            amount: Decimal::from(200),
            win_rate: Decimal::from(65),
            entry_price: None,
            market_volume_24h: None,
            days_to_resolution: None,
        });

        assert_eq!(result.warnings.len(), 3);
        // Only the two available factors contributed reasons.
        assert_eq!(result.reasons.len(), 2);
        assert_eq!(result.score, 15 + 10);
    }

    #[test]
    fn test_overpriced_entry_is_penalized() {
        let mut inputs = best_inputs();
        inputs.entry_price = Some(Decimal::new(80, 2));
        let result = score_entry(&inputs);
        // 25 + 25 - 20 + 15 + 10 = 55
        assert_eq!(result.score, 55);
        assert_eq!(result.suggested_position_pct, Decimal::from(10));
    }

    #[test]
    fn test_position_sizing_tiers() {
        let cases = [
            (100, Decimal::from(30)),
            (79, Decimal::from(20)),
            (64, Decimal::from(10)),
            (49, Decimal::from(5)),
            (34, Decimal::ZERO),
        ];
        for (score, expected) in cases {
            let pct = POSITION_SIZE_TIERS
                .iter()
                .find(|(min, _)| score >= *min)
                .map(|(_, p)| Decimal::from(*p))
                .unwrap_or(Decimal::ZERO);
            assert_eq!(pct, expected, "score {score}");
        }
    }
}
